use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

/// Input delivered to the app loop
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// The input source is gone; no further events will arrive.
    Closed,
}

/// Anything that can hand the loop its next event.
pub trait EventSource: Send + 'static {
    /// Wait up to `timeout` for an event. `Disconnected` means the source is finished.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Terminal events read by a background crossterm thread
pub struct TerminalEvents {
    rx: Receiver<AppEvent>,
}

impl TerminalEvents {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                // key release events would double every press on some platforms
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Ok(Event::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(ev).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for TerminalEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for TerminalEvents {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Events fed from a channel, for headless tests
pub struct ChannelEvents {
    rx: Receiver<AppEvent>,
}

impl ChannelEvents {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEvents {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Steps the app one event at a time, yielding `Tick` when idle and `Closed`
/// once the source has hung up.
pub struct Runner<E: EventSource> {
    events: E,
    tick: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(events: E, tick: Duration) -> Self {
        Self { events, tick }
    }

    pub fn step(&self) -> AppEvent {
        match self.events.recv_timeout(self.tick) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => AppEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => AppEvent::Closed,
        }
    }
}
