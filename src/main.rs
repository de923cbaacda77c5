use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use env_logger::{Env, Target};
use log::{error, info, warn};
use quizdeck::{
    app::{Action, App},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    history::{export_csv, humanize_since, HistoryDb},
    library::{resolve_quiz, Library},
    quiz::{Quiz, DEFAULT_BUNDLED},
    runtime::{AppEvent, EventSource, Runner, TerminalEvents},
    subject::{Subject, SubjectStore},
    ui, TICK_RATE_MS,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

/// terminal quiz taker for study materials
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Take multiple-choice quizzes one question at a time in the terminal, build study subjects from your notes, and track your scores over time."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    #[clap(flatten)]
    take: TakeArgs,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct TakeArgs {
    /// quiz file (JSON) or bundled quiz name
    #[clap(short = 'q', long)]
    quiz: Option<String>,

    /// do not record the result in the history database
    #[clap(long)]
    no_history: bool,

    /// hide the progress bar
    #[clap(long)]
    hide_progress: bool,

    /// directory of quiz files, remembered with --save-config
    #[clap(long)]
    quiz_dir: Option<PathBuf>,

    /// persist the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// take a quiz (default)
    Take(TakeArgs),
    /// show available quizzes and subjects
    List {
        /// directory searched for quiz files
        #[clap(long)]
        dir: Option<PathBuf>,
    },
    /// create a subject from .txt/.md study files
    Subject {
        name: String,
        #[clap(required = true)]
        files: Vec<PathBuf>,
    },
    /// print past results
    History {
        /// print every result as CSV instead of the summary
        #[clap(long)]
        csv: bool,
    },
}

impl TakeArgs {
    /// Apply CLI overrides on top of the stored config.
    fn effective_config(&self, stored: &Config) -> Config {
        Config {
            quiz_dir: self.quiz_dir.clone().or_else(|| stored.quiz_dir.clone()),
            record_history: stored.record_history && !self.no_history,
            show_progress: stored.show_progress && !self.hide_progress,
        }
    }
}

fn init_logging() {
    let env = Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);

    let file = AppDirs::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match file {
        Some(f) => builder.target(Target::Pipe(Box::new(f))),
        // stdout belongs to the TUI
        None => builder.target(Target::Stderr).filter_level(log::LevelFilter::Off),
    };

    builder.init();
}

fn open_history() -> Option<HistoryDb> {
    let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("quizdeck_history.db"));
    match HistoryDb::open(&path) {
        Ok(db) => Some(db),
        Err(e) => {
            warn!("history disabled, cannot open {}: {}", path.display(), e);
            None
        }
    }
}

fn subject_store() -> SubjectStore {
    SubjectStore::new(AppDirs::subjects_dir().unwrap_or_else(|| PathBuf::from("subjects")))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let store = FileConfigStore::new();
    let stored = store.load();

    match cli.command.clone() {
        None => take(&cli.take, &store, &stored),
        Some(Command::Take(args)) => take(&args, &store, &stored),
        Some(Command::List { dir }) => {
            list(dir.or(stored.quiz_dir));
            Ok(())
        }
        Some(Command::Subject { name, files }) => {
            let subject = Subject::from_files(&name, &files)?;
            let path = subject_store().save(&subject)?;
            println!(
                "created subject \"{}\" with {} file(s) at {}",
                subject.name,
                subject.file_count(),
                path.display()
            );
            Ok(())
        }
        Some(Command::History { csv }) => print_history(csv),
    }
}

fn list(quiz_dir: Option<PathBuf>) {
    let lib = Library::discover(quiz_dir.as_deref(), &subject_store());

    println!("Quizzes");
    for entry in &lib.quizzes {
        println!(
            "  {:<20} {:<32} {} questions",
            entry.quiz.id,
            entry.quiz.display_title(),
            entry.quiz.len()
        );
    }

    println!("\nSubjects");
    if lib.subjects.is_empty() {
        println!("  (none yet, create one with `quizdeck subject NAME FILE...`)");
    }
    for subject in &lib.subjects {
        println!(
            "  {:<32} {} file(s)   created {}",
            subject.name,
            subject.file_count(),
            subject.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_history(csv: bool) -> Result<(), Box<dyn Error>> {
    let Some(db) = open_history() else {
        return Err("history database is unavailable".into());
    };

    if csv {
        export_csv(&db.all()?, io::stdout())?;
        return Ok(());
    }

    let now = chrono::Local::now();
    for s in db.summary()? {
        println!(
            "{:<20} {:>3} attempt(s)   best {:>3}%   avg {:>5.1}%   last {}",
            s.quiz_id,
            s.attempts,
            s.best_percent,
            s.avg_percent,
            humanize_since(s.last_completed, now)
        );
    }
    Ok(())
}

fn take(args: &TakeArgs, store: &FileConfigStore, stored: &Config) -> Result<(), Box<dyn Error>> {
    let config = args.effective_config(stored);
    if args.save_config {
        store.save(&config)?;
        info!("saved config to {}", store.path().display());
    }

    let quiz = match &args.quiz {
        Some(arg) => resolve_quiz(arg, config.quiz_dir.as_deref())?,
        None => Quiz::bundled(DEFAULT_BUNDLED)?,
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let history = if config.record_history {
        open_history()
    } else {
        None
    };
    let mut app = App::new(Arc::new(quiz), history, config.show_progress)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(TerminalEvents::new(), Duration::from_millis(TICK_RATE_MS));
    let result = run_app(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!("tui loop failed: {}", e);
    }
    result
}

fn run_app<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step() {
            AppEvent::Tick => {}
            AppEvent::Closed => {
                warn!("input closed, leaving the quiz");
                break;
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            AppEvent::Key(key) => {
                if app.on_key(key) == Action::Quit {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use quizdeck::{runtime::ChannelEvents, Status};
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;

    #[test]
    fn test_cli_defaults_to_take() {
        let cli = Cli::parse_from(["quizdeck"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.take.quiz, None);
        assert!(!cli.take.no_history);
        assert!(!cli.take.hide_progress);
    }

    #[test]
    fn test_cli_take_flags() {
        let cli = Cli::parse_from(["quizdeck", "-q", "algebra.json", "--no-history"]);
        assert_eq!(cli.take.quiz.as_deref(), Some("algebra.json"));
        assert!(cli.take.no_history);

        let cli = Cli::parse_from(["quizdeck", "take", "--quiz", "sample", "--hide-progress"]);
        match cli.command {
            Some(Command::Take(args)) => {
                assert_eq!(args.quiz.as_deref(), Some("sample"));
                assert!(args.hide_progress);
            }
            other => panic!("expected take, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_subject_requires_files() {
        assert!(Cli::try_parse_from(["quizdeck", "subject", "Biology"]).is_err());

        let cli = Cli::parse_from(["quizdeck", "subject", "Biology", "a.txt", "b.md"]);
        match cli.command {
            Some(Command::Subject { name, files }) => {
                assert_eq!(name, "Biology");
                assert_eq!(files.len(), 2);
            }
            other => panic!("expected subject, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_history_and_list() {
        let cli = Cli::parse_from(["quizdeck", "history", "--csv"]);
        assert!(matches!(cli.command, Some(Command::History { csv: true })));

        let cli = Cli::parse_from(["quizdeck", "list", "--dir", "/tmp/q"]);
        assert!(matches!(cli.command, Some(Command::List { dir: Some(_) })));
    }

    #[test]
    fn test_effective_config_overrides() {
        let stored = Config {
            quiz_dir: Some(PathBuf::from("/stored")),
            record_history: true,
            show_progress: true,
        };

        let args = TakeArgs {
            no_history: true,
            hide_progress: true,
            quiz_dir: Some(PathBuf::from("/cli")),
            ..TakeArgs::default()
        };
        let cfg = args.effective_config(&stored);
        assert_eq!(cfg.quiz_dir, Some(PathBuf::from("/cli")));
        assert!(!cfg.record_history);
        assert!(!cfg.show_progress);

        let cfg = TakeArgs::default().effective_config(&stored);
        assert_eq!(cfg, stored);
    }

    #[test]
    fn test_run_app_until_escape() {
        let (tx, rx) = mpsc::channel();
        for code in [
            KeyCode::Enter,
            KeyCode::Char('2'),
            KeyCode::Enter,
            KeyCode::Char('3'),
            KeyCode::Enter,
            KeyCode::Char('3'),
            KeyCode::Enter,
            KeyCode::Esc,
        ] {
            tx.send(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
                .unwrap();
        }

        let runner = Runner::new(ChannelEvents::new(rx), Duration::from_millis(5));
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = App::new(Arc::new(Quiz::bundled("sample").unwrap()), None, true).unwrap();

        run_app(&mut terminal, &mut app, &runner).unwrap();

        assert_eq!(app.session.status(), Status::Complete);
        assert_eq!(app.session.final_score().unwrap().percent, 100);
    }

    #[test]
    fn test_run_app_stops_when_input_closes() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)))
            .unwrap();
        drop(tx);

        let runner = Runner::new(ChannelEvents::new(rx), Duration::from_millis(5));
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = App::new(Arc::new(Quiz::bundled("sample").unwrap()), None, true).unwrap();

        run_app(&mut terminal, &mut app, &runner).unwrap();

        assert_eq!(app.session.status(), Status::InProgress);
    }
}
