#![forbid(unsafe_code)]

//! Input event sources.
//!
//! An [`InputEventSource`] is a lazy, non-restartable stream of [`Event`]s.
//! It is polled with a timeout so the consumer can interleave its own
//! shutdown checks; `Ok(None)` means "nothing arrived in time", never "the
//! stream ended". A source that can no longer produce input reports
//! [`Event::Quit`] instead.

use std::collections::VecDeque;
use std::io;
use std::sync::mpsc;
use std::time::Duration;

use crate::event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers};
use crate::terminal_session::TerminalSession;

/// A source of input events consumed by a single owner.
pub trait InputEventSource: Send {
    /// Wait up to `timeout` for the next event.
    ///
    /// # Errors
    ///
    /// I/O errors from the underlying device. Consumers treat them as fatal.
    fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<Event>>;
}

impl<S: InputEventSource + ?Sized> InputEventSource for Box<S> {
    fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<Event>> {
        (**self).poll_event(timeout)
    }
}

/// A key combination that should end the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuitKey {
    /// Key code to match.
    pub code: KeyCode,
    /// Modifiers that must be held exactly.
    pub modifiers: Modifiers,
}

impl QuitKey {
    /// A quit key without modifiers.
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    /// A quit key that requires Ctrl.
    #[must_use]
    pub const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: Modifiers::CTRL,
        }
    }

    fn matches(&self, key: &KeyEvent) -> bool {
        key.kind == KeyEventKind::Press && key.code == self.code && key.modifiers == self.modifiers
    }
}

/// Default quit bindings: `Ctrl+C`, `q`, and `Esc`.
///
/// Raw mode swallows the terminal's own SIGINT on `Ctrl+C`, so it must be
/// handled as a key.
pub const DEFAULT_QUIT_KEYS: [QuitKey; 3] = [
    QuitKey::ctrl('c'),
    QuitKey::plain(KeyCode::Char('q')),
    QuitKey::plain(KeyCode::Escape),
];

/// Event source backed by the real terminal.
///
/// Owns the [`TerminalSession`], so dropping the source restores the
/// terminal.
#[derive(Debug)]
pub struct TerminalEventSource {
    session: TerminalSession,
    quit_keys: Vec<QuitKey>,
    quit_sent: bool,
}

impl TerminalEventSource {
    /// Wrap a session using [`DEFAULT_QUIT_KEYS`].
    pub fn new(session: TerminalSession) -> Self {
        Self::with_quit_keys(session, DEFAULT_QUIT_KEYS.to_vec())
    }

    /// Wrap a session with custom quit bindings.
    pub fn with_quit_keys(session: TerminalSession, quit_keys: Vec<QuitKey>) -> Self {
        Self {
            session,
            quit_keys,
            quit_sent: false,
        }
    }

    /// Current terminal size (columns, rows).
    pub fn size(&self) -> io::Result<(u16, u16)> {
        self.session.size()
    }

    fn translate(&self, event: Event) -> Event {
        match event {
            Event::Key(key) if self.quit_keys.iter().any(|q| q.matches(&key)) => {
                tracing::debug!(code = ?key.code, "quit key pressed");
                Event::Quit
            }
            other => other,
        }
    }
}

impl InputEventSource for TerminalEventSource {
    fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<Event>> {
        if self.quit_sent {
            return Ok(Some(Event::Quit));
        }
        if self.session.quit_requested() {
            self.quit_sent = true;
            return Ok(Some(Event::Quit));
        }
        if !self.session.poll_event(timeout)? {
            return Ok(None);
        }
        let event = self.session.read_event()?.map(|e| self.translate(e));
        if event == Some(Event::Quit) {
            self.quit_sent = true;
        }
        Ok(event)
    }
}

/// Replays a fixed list of events, then stays idle.
///
/// Idle polls sleep for the requested timeout so consumers do not spin.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEventSource {
    pending: VecDeque<Event>,
}

impl ScriptedEventSource {
    /// Create a source that yields `events` in order.
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            pending: events.into_iter().collect(),
        }
    }

    /// Number of events not yet delivered.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl InputEventSource for ScriptedEventSource {
    fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<Event>> {
        match self.pending.pop_front() {
            Some(event) => Ok(Some(event)),
            None => {
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

/// Event source fed through a channel.
///
/// Once every sender is dropped the source reports [`Event::Quit`] forever.
#[derive(Debug)]
pub struct ChannelEventSource {
    receiver: mpsc::Receiver<Event>,
}

impl ChannelEventSource {
    /// Create a connected (sender, source) pair.
    pub fn channel() -> (mpsc::Sender<Event>, Self) {
        let (sender, receiver) = mpsc::channel();
        (sender, Self { receiver })
    }
}

impl InputEventSource for ChannelEventSource {
    fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<Event>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Ok(Some(Event::Quit)),
        }
    }
}
