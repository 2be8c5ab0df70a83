#![forbid(unsafe_code)]

//! Core: terminal lifecycle, input events, event sources, and logging.

pub mod event;
pub mod event_source;
pub mod logging;
pub mod terminal_session;

pub use event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use event_source::{
    ChannelEventSource, InputEventSource, QuitKey, ScriptedEventSource, TerminalEventSource,
};
