use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use tintype_core::raster::RasterBuffer;

use crate::source::FrameSource;

/// Session timing and shape. One value per booth, never mutated while a
/// session is running.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    pub target_count: usize,
    pub countdown_seconds: u32,
    /// Pause between a capture and the next countdown.
    pub interstitial: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_count: 4,
            countdown_seconds: 3,
            interstitial: Duration::from_millis(800),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    CountingDown { remaining: u32 },
    Capturing,
    Interstitial,
    Complete,
}

/// Observable session happenings, suitable for driving a UI (countdown
/// digits, beeps, the flash overlay).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// `photo` is 1-based; `remaining` is the digit to display.
    CountdownTick { photo: usize, remaining: u32 },
    Flash { photo: usize },
    Completed,
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a capture session is already in progress")]
    AlreadyInProgress,
    #[error("no frame source available")]
    DeviceUnavailable,
    #[error("frame capture failed mid-session")]
    CaptureFailed(#[source] anyhow::Error),
    #[error("session is not running")]
    NotRunning,
}

/// Cancels a running session from outside the tick loop. Takes effect at
/// the next tick boundary; no frame is ever appended afterwards.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// The timed countdown -> capture -> interstitial loop, as an explicitly
/// pumped state machine.
///
/// The machine itself never sleeps: `tick_delay` tells the driver how
/// long to wait before the next `tick`, which keeps wall-clock time out
/// of the logic and lets tests step through a whole session instantly.
pub struct CaptureSession {
    config: SessionConfig,
    state: SessionState,
    frames: Vec<RasterBuffer>,
    cancel: Arc<AtomicBool>,
}

impl CaptureSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            frames: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn frames_captured(&self) -> usize {
        self.frames.len()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancel),
        }
    }

    /// Begin a capture sequence. Rejected while a session is running;
    /// restarting after `Complete` discards the previous frames.
    pub fn start(&mut self) -> Result<SessionEvent, SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Complete => {}
            _ => return Err(SessionError::AlreadyInProgress),
        }
        self.frames.clear();
        self.cancel.store(false, Ordering::SeqCst);
        let remaining = self.config.countdown_seconds.max(1);
        self.state = SessionState::CountingDown { remaining };
        info!(
            target_count = self.config.target_count,
            countdown = remaining,
            "capture session started"
        );
        Ok(SessionEvent::CountdownTick {
            photo: 1,
            remaining,
        })
    }

    /// Cancel immediately: discard captured frames and return to Idle.
    /// A no-op when nothing is running.
    pub fn cancel(&mut self) {
        match self.state {
            SessionState::Idle | SessionState::Complete => {
                debug!("cancel ignored: no session in progress");
            }
            _ => {
                self.discard();
                info!("capture session cancelled");
            }
        }
    }

    /// How long the driver should wait before the next `tick`. `None`
    /// means the machine is parked (Idle or Complete).
    pub fn tick_delay(&self) -> Option<Duration> {
        match self.state {
            SessionState::Idle | SessionState::Complete => None,
            SessionState::CountingDown { .. } => Some(Duration::from_secs(1)),
            SessionState::Capturing => Some(Duration::ZERO),
            SessionState::Interstitial => Some(self.config.interstitial),
        }
    }

    /// Advance the machine by one step. Call after `tick_delay` elapsed.
    ///
    /// A pending cancel is consumed before anything else, so cancellation
    /// always wins over the next countdown step or capture.
    pub fn tick(&mut self, source: &mut dyn FrameSource) -> Result<SessionEvent, SessionError> {
        if self.cancel.swap(false, Ordering::SeqCst)
            && !matches!(self.state, SessionState::Idle | SessionState::Complete)
        {
            self.discard();
            info!("capture session cancelled");
            return Ok(SessionEvent::Cancelled);
        }

        match self.state {
            SessionState::Idle | SessionState::Complete => Err(SessionError::NotRunning),
            SessionState::CountingDown { remaining } if remaining > 1 => {
                let remaining = remaining - 1;
                self.state = SessionState::CountingDown { remaining };
                Ok(SessionEvent::CountdownTick {
                    photo: self.frames.len() + 1,
                    remaining,
                })
            }
            SessionState::CountingDown { .. } => self.capture(source),
            SessionState::Interstitial => {
                let remaining = self.config.countdown_seconds.max(1);
                self.state = SessionState::CountingDown { remaining };
                Ok(SessionEvent::CountdownTick {
                    photo: self.frames.len() + 1,
                    remaining,
                })
            }
            // Capture completes within a single tick; the machine is never
            // parked in Capturing between ticks.
            SessionState::Capturing => Err(SessionError::NotRunning),
        }
    }

    fn capture(&mut self, source: &mut dyn FrameSource) -> Result<SessionEvent, SessionError> {
        self.state = SessionState::Capturing;
        let frame = match source.capture_frame() {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%err, "frame capture failed, aborting session");
                self.discard();
                return Err(SessionError::CaptureFailed(err));
            }
        };
        self.frames.push(frame);
        let photo = self.frames.len();
        debug!(photo, "frame captured");

        self.state = if photo == self.config.target_count {
            SessionState::Complete
        } else {
            SessionState::Interstitial
        };
        Ok(SessionEvent::Flash { photo })
    }

    /// Hand the captured sequence out. Only a completed session has one;
    /// taking it resets the machine to Idle.
    pub fn take_frames(&mut self) -> Option<Vec<RasterBuffer>> {
        if self.state != SessionState::Complete {
            return None;
        }
        self.state = SessionState::Idle;
        Some(std::mem::take(&mut self.frames))
    }

    fn discard(&mut self) {
        self.frames.clear();
        self.cancel.store(false, Ordering::SeqCst);
        self.state = SessionState::Idle;
    }
}
