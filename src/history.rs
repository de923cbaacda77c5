use chrono::{DateTime, Local, TimeZone};
use rusqlite::{params, Connection, Result};
use std::io::Write;
use std::path::Path;
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::session::{QuizSession, Score};

/// One completed quiz run.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub quiz_id: String,
    pub correct: usize,
    pub total: usize,
    pub percent: u8,
    pub completed_at: DateTime<Local>,
}

impl SessionRecord {
    pub fn new(quiz_id: &str, score: Score, completed_at: DateTime<Local>) -> Self {
        Self {
            quiz_id: quiz_id.to_string(),
            correct: score.correct,
            total: score.total,
            percent: score.percent,
            completed_at,
        }
    }

    /// Build a record from a session, if it has completed.
    pub fn from_session(session: &QuizSession) -> Option<Self> {
        session
            .final_score()
            .map(|score| Self::new(&session.quiz().id, score, Local::now()))
    }
}

/// Aggregated results for one quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSummary {
    pub quiz_id: String,
    pub attempts: i64,
    pub best_percent: u8,
    pub avg_percent: f64,
    pub last_completed: DateTime<Local>,
}

impl QuizSummary {
    /// "3 hours ago" style rendering of the last attempt.
    pub fn last_completed_ago(&self, now: DateTime<Local>) -> String {
        humanize_since(self.last_completed, now)
    }
}

pub fn humanize_since(then: DateTime<Local>, now: DateTime<Local>) -> String {
    let secs = (now - then).num_seconds().max(0);
    HumanTime::from_seconds(secs).to_text_en(Accuracy::Rough, Tense::Past)
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS quiz_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        quiz_id TEXT NOT NULL,
        correct INTEGER NOT NULL,
        total INTEGER NOT NULL,
        percent INTEGER NOT NULL,
        completed_at INTEGER NOT NULL -- unix millis, UTC
    );
    CREATE INDEX IF NOT EXISTS idx_quiz_results_quiz ON quiz_results(quiz_id);
    CREATE INDEX IF NOT EXISTS idx_quiz_results_completed ON quiz_results(completed_at);
"#;

/// SQLite store of completed sessions
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn record(&self, rec: &SessionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO quiz_results (quiz_id, correct, total, percent, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                rec.quiz_id,
                rec.correct as i64,
                rec.total as i64,
                rec.percent,
                rec.completed_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    /// Most recent records first.
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT quiz_id, correct, total, percent, completed_at
            FROM quiz_results
            ORDER BY completed_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            Ok(SessionRecord {
                quiz_id: row.get(0)?,
                correct: row.get::<_, i64>(1)? as usize,
                total: row.get::<_, i64>(2)? as usize,
                percent: row.get(3)?,
                completed_at: parse_timestamp(row.get(4)?, 4)?,
            })
        })?;

        rows.collect()
    }

    pub fn all(&self) -> Result<Vec<SessionRecord>> {
        let mut records = self.recent(i64::MAX as usize)?;
        records.reverse();
        Ok(records)
    }

    /// Per-quiz aggregates, most recently taken first
    pub fn summary(&self) -> Result<Vec<QuizSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                quiz_id,
                COUNT(*) AS attempts,
                MAX(percent) AS best,
                AVG(percent) AS avg,
                MAX(completed_at) AS last
            FROM quiz_results
            GROUP BY quiz_id
            ORDER BY last DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(QuizSummary {
                quiz_id: row.get(0)?,
                attempts: row.get(1)?,
                best_percent: row.get(2)?,
                avg_percent: row.get(3)?,
                last_completed: parse_timestamp(row.get(4)?, 4)?,
            })
        })?;

        rows.collect()
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM quiz_results", [])?;
        Ok(())
    }
}

fn parse_timestamp(millis: i64, col: usize) -> Result<DateTime<Local>> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(col, millis))
}

/// Write records as CSV with a header row.
pub fn export_csv<W: Write>(records: &[SessionRecord], writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["quiz_id", "correct", "total", "percent", "completed_at"])?;
    for rec in records {
        wtr.write_record([
            rec.quiz_id.clone(),
            rec.correct.to_string(),
            rec.total.to_string(),
            rec.percent.to_string(),
            rec.completed_at.to_rfc3339(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn rec(quiz_id: &str, correct: usize, total: usize, hour: u32) -> SessionRecord {
        SessionRecord::new(quiz_id, Score::new(correct, total), at(hour))
    }

    #[test]
    fn test_record_and_recent() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&rec("a", 1, 3, 9)).unwrap();
        db.record(&rec("b", 3, 3, 10)).unwrap();

        let recent = db.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].quiz_id, "b");
        assert_eq!(recent[0].percent, 100);
        assert_eq!(recent[1].percent, 33);
        assert_eq!(recent[1].completed_at, at(9));

        assert_eq!(db.recent(1).unwrap().len(), 1);
    }

    #[test]
    fn test_all_is_chronological() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&rec("a", 1, 3, 11)).unwrap();
        db.record(&rec("a", 2, 3, 8)).unwrap();

        let all = db.all().unwrap();
        assert_eq!(all[0].completed_at, at(8));
        assert_eq!(all[1].completed_at, at(11));
    }

    #[test]
    fn test_summary() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&rec("algebra", 1, 3, 8)).unwrap();
        db.record(&rec("algebra", 3, 3, 9)).unwrap();
        db.record(&rec("history", 1, 2, 12)).unwrap();

        let summary = db.summary().unwrap();
        assert_eq!(summary.len(), 2);

        assert_eq!(summary[0].quiz_id, "history");
        assert_eq!(summary[0].attempts, 1);

        let algebra = &summary[1];
        assert_eq!(algebra.attempts, 2);
        assert_eq!(algebra.best_percent, 100);
        assert!((algebra.avg_percent - 66.5).abs() < 1e-9);
        assert_eq!(algebra.last_completed, at(9));
    }

    #[test]
    fn test_clear() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&rec("a", 1, 1, 8)).unwrap();
        db.clear().unwrap();
        assert!(db.recent(10).unwrap().is_empty());
        assert!(db.summary().unwrap().is_empty());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");

        {
            let db = HistoryDb::open(&path).unwrap();
            db.record(&rec("a", 2, 2, 8)).unwrap();
        }

        let reopened = HistoryDb::open(&path).unwrap();
        assert_eq!(reopened.recent(5).unwrap().len(), 1);
    }

    #[test]
    fn test_export_csv() {
        let records = vec![rec("a", 2, 3, 8)];
        let mut out = Vec::new();
        export_csv(&records, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("quiz_id,correct,total,percent,completed_at")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("a,2,3,67,2024-05-01T08:00:00"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_order_follows_instants_across_offset_change() {
        // Europe/Berlin leaves summer time at 01:00Z on this day, so local
        // wall-clock text of the later run sorts before the earlier one
        let first = Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 10, 27, 1, 10, 0).unwrap();

        let db = HistoryDb::open_in_memory().unwrap();
        let score = Score::new(1, 2);
        db.record(&SessionRecord::new("a", score, first.with_timezone(&Local)))
            .unwrap();
        db.record(&SessionRecord::new("b", score, second.with_timezone(&Local)))
            .unwrap();

        assert_eq!(db.recent(1).unwrap()[0].quiz_id, "b");
        let all: Vec<String> = db.all().unwrap().into_iter().map(|r| r.quiz_id).collect();
        assert_eq!(all, vec!["a", "b"]);

        db.record(&SessionRecord::new("a", score, second.with_timezone(&Local)))
            .unwrap();
        let summary = db.summary().unwrap();
        let a = summary.iter().find(|s| s.quiz_id == "a").unwrap();
        assert_eq!(a.last_completed, second.with_timezone(&Local));
    }

    #[test]
    fn test_stores_unix_millis() {
        let db = HistoryDb::open_in_memory().unwrap();
        let when = Utc.with_ymd_and_hms(2024, 3, 31, 1, 15, 0).unwrap();
        db.record(&SessionRecord::new("a", Score::new(1, 1), when.with_timezone(&Local)))
            .unwrap();

        let stored: i64 = db
            .conn
            .query_row("SELECT completed_at FROM quiz_results", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, when.timestamp_millis());
    }

    #[test]
    fn test_humanize_since() {
        let now = at(12);
        assert_eq!(humanize_since(now - Duration::hours(2), now), "2 hours ago");
    }
}
