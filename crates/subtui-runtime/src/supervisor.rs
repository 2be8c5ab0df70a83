#![forbid(unsafe_code)]

//! Event-loop supervisor.
//!
//! The supervisor consumes an [`InputEventSource`] on a dedicated thread and
//! maps events onto the [`CueScheduler`]:
//!
//! | Event    | Action                          |
//! |----------|---------------------------------|
//! | `Resize` | [`CueScheduler::on_resize`]     |
//! | `Key`    | logged                          |
//! | `Quit`   | close the scheduler, terminate  |
//!
//! Between polls the loop also checks [`CueScheduler::fault`], so a surface
//! that failed during playback or an auto-clear ends the loop as fatal.
//!
//! # States
//!
//! ```text
//! Running ──(Quit | fatal error | shutdown request)──▶ Terminating ──▶ Stopped
//! ```
//!
//! Terminating closes the scheduler and drops the event source, which
//! releases the terminal. Stopped fires the exit signal. Teardown runs from
//! a drop guard, so it also happens if the loop panics.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};

use subtui_core::event::Event;
use subtui_core::event_source::InputEventSource;
use subtui_render::RenderSurface;

use crate::config::SupervisorConfig;
use crate::scheduler::CueScheduler;
use crate::stop::{StopSignal, StopTrigger};

/// Lifecycle of the supervisor thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SupervisorState {
    /// Consuming events.
    Running = 0,
    /// Releasing resources.
    Terminating = 1,
    /// Done; the exit signal has fired.
    Stopped = 2,
}

impl SupervisorState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SupervisorState::Running,
            1 => SupervisorState::Terminating,
            _ => SupervisorState::Stopped,
        }
    }
}

/// Why the supervisor stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// A quit event arrived.
    Quit,
    /// The event source or the surface failed.
    Fatal(String),
    /// The owner requested shutdown.
    Shutdown,
}

/// Spawns supervisor threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Supervisor;

impl Supervisor {
    /// Start consuming `source` on a new thread.
    ///
    /// # Errors
    ///
    /// I/O error if the thread cannot be spawned.
    pub fn spawn<S, E>(
        scheduler: CueScheduler<S>,
        source: E,
        config: SupervisorConfig,
    ) -> std::io::Result<SupervisorHandle>
    where
        S: RenderSurface + 'static,
        E: InputEventSource + 'static,
    {
        let state = Arc::new(AtomicU8::new(SupervisorState::Running as u8));
        let (exit, exit_trigger) = StopSignal::new();
        let (shutdown, shutdown_trigger) = StopSignal::new();

        let thread_state = Arc::clone(&state);
        let thread = thread::Builder::new()
            .name("subtui-supervisor".into())
            .spawn(move || {
                let mut teardown = Teardown {
                    scheduler,
                    source: Some(source),
                    state: thread_state,
                    exit: exit_trigger,
                };
                let reason = match teardown.source.as_mut() {
                    Some(source) => event_loop(&teardown.scheduler, source, config, &shutdown),
                    None => ExitReason::Shutdown,
                };
                tracing::info!(?reason, "supervisor loop finished");
                reason
            })?;

        tracing::debug!("supervisor started");
        Ok(SupervisorHandle {
            state,
            exit,
            shutdown: shutdown_trigger,
            thread: Some(thread),
        })
    }
}

fn event_loop<S, E>(
    scheduler: &CueScheduler<S>,
    source: &mut E,
    config: SupervisorConfig,
    shutdown: &StopSignal,
) -> ExitReason
where
    S: RenderSurface + 'static,
    E: InputEventSource,
{
    loop {
        if let Some(fault) = scheduler.fault() {
            tracing::error!(%fault, "surface failed");
            return ExitReason::Fatal(fault);
        }
        if shutdown.is_stopped() {
            return ExitReason::Shutdown;
        }
        let event = match source.poll_event(config.poll_interval) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(error = %e, "event source failed");
                return ExitReason::Fatal(format!("event source failed: {e}"));
            }
        };
        tracing::trace!(kind = event.kind_name(), "event");
        match event {
            Event::Quit => {
                tracing::info!("quit requested");
                scheduler.close();
                return ExitReason::Quit;
            }
            Event::Resize { width, height } => match scheduler.on_resize(width, height) {
                Ok(outcome) => tracing::debug!(width, height, ?outcome, "resize handled"),
                Err(e) if e.is_fatal() => {
                    tracing::error!(error = %e, width, height, "surface failed during resize");
                    return ExitReason::Fatal(e.to_string());
                }
                Err(e) => tracing::warn!(error = %e, width, height, "resize rejected"),
            },
            Event::Key(key) => {
                tracing::debug!(code = ?key.code, modifiers = ?key.modifiers, kind = ?key.kind, "key");
            }
        }
    }
}

struct Teardown<S: RenderSurface + 'static, E> {
    scheduler: CueScheduler<S>,
    source: Option<E>,
    state: Arc<AtomicU8>,
    exit: StopTrigger,
}

impl<S: RenderSurface + 'static, E> Drop for Teardown<S, E> {
    fn drop(&mut self) {
        self.state
            .store(SupervisorState::Terminating as u8, Ordering::SeqCst);
        self.scheduler.close();
        drop(self.source.take());
        self.state
            .store(SupervisorState::Stopped as u8, Ordering::SeqCst);
        self.exit.stop();
        tracing::debug!("supervisor stopped");
    }
}

/// Owner's handle on a running supervisor.
///
/// Dropping the handle requests shutdown and joins the thread.
#[derive(Debug)]
pub struct SupervisorHandle {
    state: Arc<AtomicU8>,
    exit: StopSignal,
    shutdown: StopTrigger,
    thread: Option<JoinHandle<ExitReason>>,
}

impl SupervisorHandle {
    /// Current lifecycle state.
    pub fn state(&self) -> SupervisorState {
        SupervisorState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Signal that fires once the supervisor reaches
    /// [`SupervisorState::Stopped`].
    pub fn exit_signal(&self) -> StopSignal {
        self.exit.clone()
    }

    /// Ask the loop to stop at its next poll.
    pub fn request_shutdown(&self) {
        self.shutdown.stop();
    }

    /// Wait for the thread to finish.
    pub fn join(mut self) -> ExitReason {
        self.join_inner()
    }

    fn join_inner(&mut self) -> ExitReason {
        match self.thread.take().map(JoinHandle::join) {
            Some(Ok(reason)) => reason,
            Some(Err(_)) => ExitReason::Fatal("supervisor thread panicked".into()),
            None => ExitReason::Shutdown,
        }
    }
}

impl Drop for SupervisorHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.request_shutdown();
            let _ = self.join_inner();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;
    use subtui_core::event::{KeyCode, KeyEvent};
    use subtui_core::event_source::{ChannelEventSource, ScriptedEventSource};
    use subtui_render::HeadlessSurface;

    use crate::config::SchedulerConfig;

    fn scheduler() -> CueScheduler<HeadlessSurface> {
        CueScheduler::new(HeadlessSurface::new(10, 4), SchedulerConfig::default())
    }

    fn fast() -> SupervisorConfig {
        SupervisorConfig {
            poll_interval: Duration::from_millis(5),
        }
    }

    struct Failing;

    impl InputEventSource for Failing {
        fn poll_event(&mut self, _timeout: Duration) -> io::Result<Option<Event>> {
            Err(io::Error::other("device gone"))
        }
    }

    #[test]
    fn quit_stops_and_closes_scheduler() {
        let s = scheduler();
        let source = ScriptedEventSource::new([
            Event::Key(KeyEvent::new(KeyCode::Char('x'))),
            Event::Quit,
        ]);
        let handle = Supervisor::spawn(s.clone(), source, fast()).unwrap();
        let exit = handle.exit_signal();
        assert!(exit.wait_timeout(Duration::from_secs(5)));
        assert_eq!(handle.state(), SupervisorState::Stopped);
        assert_eq!(handle.join(), ExitReason::Quit);
        assert!(s.is_closed());
    }

    #[test]
    fn resize_events_reach_scheduler() {
        let s = scheduler();
        let (tx, source) = ChannelEventSource::channel();
        let handle = Supervisor::spawn(s.clone(), source, fast()).unwrap();
        tx.send(Event::Resize {
            width: 40,
            height: 12,
        })
        .unwrap();
        tx.send(Event::Quit).unwrap();
        assert_eq!(handle.join(), ExitReason::Quit);
        assert_eq!(s.with_surface(|h| h.ops().resizes), 1);
    }

    #[test]
    fn rejected_resize_keeps_running() {
        let s = scheduler();
        let (tx, source) = ChannelEventSource::channel();
        let handle = Supervisor::spawn(s.clone(), source, fast()).unwrap();
        tx.send(Event::Resize {
            width: 0,
            height: 12,
        })
        .unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(handle.state(), SupervisorState::Running);
        assert!(!s.is_closed());
        handle.request_shutdown();
        assert_eq!(handle.join(), ExitReason::Shutdown);
        assert!(s.is_closed());
    }

    #[test]
    fn source_error_is_fatal() {
        let s = scheduler();
        let handle = Supervisor::spawn(s.clone(), Failing, fast()).unwrap();
        match handle.join() {
            ExitReason::Fatal(msg) => assert!(msg.contains("device gone")),
            other => panic!("unexpected exit: {other:?}"),
        }
        assert!(s.is_closed());
    }

    fn failing_scheduler() -> CueScheduler<HeadlessSurface> {
        let mut surface = HeadlessSurface::new(10, 4);
        surface.set_fail_presents(true);
        CueScheduler::new(surface, SchedulerConfig::default())
    }

    #[test]
    fn surface_failure_on_resize_is_fatal() {
        let s = failing_scheduler();
        let (tx, source) = ChannelEventSource::channel();
        let handle = Supervisor::spawn(s.clone(), source, fast()).unwrap();
        tx.send(Event::Resize {
            width: 20,
            height: 5,
        })
        .unwrap();
        match handle.join() {
            ExitReason::Fatal(msg) => assert!(msg.contains("headless present failure")),
            other => panic!("unexpected exit: {other:?}"),
        }
        assert!(s.is_closed());
    }

    #[test]
    fn fault_recorded_elsewhere_stops_loop() {
        let s = failing_scheduler();
        let (_tx, source) = ChannelEventSource::channel();
        let handle = Supervisor::spawn(s.clone(), source, fast()).unwrap();
        assert!(s.clear().is_ok());
        assert_eq!(handle.state(), SupervisorState::Running);
        // Blank resize path presents and fails outside the supervisor.
        assert!(s.on_resize(12, 4).is_err());
        let exit = handle.exit_signal();
        assert!(exit.wait_timeout(Duration::from_secs(5)));
        assert!(matches!(handle.join(), ExitReason::Fatal(_)));
        assert!(s.is_closed());
    }

    #[test]
    fn fault_wins_over_shutdown_request() {
        let s = failing_scheduler();
        assert!(s.on_resize(12, 4).is_err());
        let (_tx, source) = ChannelEventSource::channel();
        let handle = Supervisor::spawn(s.clone(), source, fast()).unwrap();
        handle.request_shutdown();
        assert!(matches!(handle.join(), ExitReason::Fatal(_)));
    }

    #[test]
    fn quit_rejects_later_displays() {
        let s = scheduler();
        let (tx, source) = ChannelEventSource::channel();
        let handle = Supervisor::spawn(s.clone(), source, fast()).unwrap();
        tx.send(Event::Quit).unwrap();
        assert!(handle.exit_signal().wait_timeout(Duration::from_secs(5)));
        let cue = crate::cue::Cue::shared("late", Duration::from_secs(1));
        assert_eq!(
            s.display(cue).unwrap(),
            crate::scheduler::DisplayOutcome::Closed
        );
        assert_eq!(handle.join(), ExitReason::Quit);
    }

    #[test]
    fn dropping_handle_tears_down() {
        let s = scheduler();
        let (_tx, source) = ChannelEventSource::channel();
        let handle = Supervisor::spawn(s.clone(), source, fast()).unwrap();
        drop(handle);
        assert!(s.is_closed());
    }
}
