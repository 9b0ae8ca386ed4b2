//! Capture sequencing: the countdown/capture/interstitial state machine,
//! cancellation, and a tokio driver that pumps it against real time.

pub mod driver;
pub mod session;
pub mod source;

pub use driver::{SessionOutcome, run_session};
pub use session::{
    CancelHandle, CaptureSession, SessionConfig, SessionError, SessionEvent, SessionState,
};
pub use source::FrameSource;
