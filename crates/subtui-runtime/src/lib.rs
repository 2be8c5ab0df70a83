#![forbid(unsafe_code)]

//! Runtime: the cue-display scheduler, the event supervisor, and playback.
//!
//! Two actors share one [`CueScheduler`]: the playback timeline calling
//! [`CueScheduler::display`] and the [`Supervisor`] thread forwarding resize
//! and quit events. Both serialize on the scheduler's lock.

pub mod config;
pub mod cue;
pub mod error;
pub mod playback;
pub mod scheduler;
pub mod stop;
pub mod supervisor;

pub use config::{SchedulerConfig, SupervisorConfig};
pub use cue::{Cue, TimedCue};
pub use error::{ConfigurationError, DisplayError, InitializationError};
pub use playback::{Playback, PlaybackOutcome, PlaybackReport};
pub use scheduler::{CueScheduler, DisplayOutcome, DisplaySession, ResizeOutcome, SchedulerStats};
pub use stop::{StopSignal, StopTrigger};
pub use supervisor::{ExitReason, Supervisor, SupervisorHandle, SupervisorState};
