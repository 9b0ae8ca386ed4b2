use tokio::sync::mpsc::UnboundedSender;

use tintype_core::raster::RasterBuffer;

use crate::session::{CaptureSession, SessionError, SessionEvent};
use crate::source::FrameSource;

/// How a driven session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    Completed(Vec<RasterBuffer>),
    Cancelled,
}

/// Pump a capture session against real (tokio) time.
///
/// Events are forwarded to `events` as they happen; a closed receiver is
/// ignored since rendering does not depend on anyone watching. Returns
/// the captured frames on completion, or `Cancelled` if a cancel handle
/// fired first.
pub async fn run_session(
    session: &mut CaptureSession,
    source: &mut dyn FrameSource,
    events: &UnboundedSender<SessionEvent>,
) -> Result<SessionOutcome, SessionError> {
    let first = session.start()?;
    let _ = events.send(first);

    while let Some(delay) = session.tick_delay() {
        tokio::time::sleep(delay).await;
        let event = session.tick(source)?;
        let cancelled = event == SessionEvent::Cancelled;
        let _ = events.send(event);
        if cancelled {
            return Ok(SessionOutcome::Cancelled);
        }
    }

    let _ = events.send(SessionEvent::Completed);
    match session.take_frames() {
        Some(frames) => Ok(SessionOutcome::Completed(frames)),
        // tick_delay() only parks on Idle or Complete, and Idle mid-run
        // always came from a cancel event handled above.
        None => Ok(SessionOutcome::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;
    use crate::source::SolidFrameSource;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn source() -> SolidFrameSource {
        SolidFrameSource {
            width: 8,
            height: 8,
            rgb: [50, 60, 70],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completes_with_all_frames() {
        let mut session = CaptureSession::new(SessionConfig::default());
        let mut src = source();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = run_session(&mut session, &mut src, &tx).await.unwrap();
        let SessionOutcome::Completed(frames) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(frames.len(), 4);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.first(), Some(&SessionEvent::CountdownTick { photo: 1, remaining: 3 }));
        assert_eq!(events.last(), Some(&SessionEvent::Completed));
        let flashes = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Flash { .. }))
            .count();
        assert_eq!(flashes, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn virtual_time_matches_schedule() {
        // 4 photos x 3s countdown + 3 interstitials x 0.8s = 14.4s.
        let mut session = CaptureSession::new(SessionConfig::default());
        let mut src = source();
        let (tx, _rx) = mpsc::unbounded_channel();

        let before = tokio::time::Instant::now();
        run_session(&mut session, &mut src, &tx).await.unwrap();
        let elapsed = before.elapsed();
        assert_eq!(elapsed, Duration::from_millis(14_400));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_handle_stops_the_driver() {
        let mut session = CaptureSession::new(SessionConfig::default());
        let handle = session.cancel_handle();
        let mut src = source();
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Fire the cancel mid-countdown, between the "2" and "1" ticks of
        // photo 1. The next tick must observe it; no frame is captured.
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            handle.cancel();
        };
        let (outcome, ()) = tokio::join!(run_session(&mut session, &mut src, &tx), canceller);
        assert!(matches!(outcome.unwrap(), SessionOutcome::Cancelled));
        assert_eq!(session.frames_captured(), 0);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.last(), Some(&SessionEvent::Cancelled));
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::Flash { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn second_driver_start_fails_fast() {
        let mut session = CaptureSession::new(SessionConfig::default());
        session.start().unwrap();

        let mut src = source();
        let (tx, _rx) = mpsc::unbounded_channel();
        let err = run_session(&mut session, &mut src, &tx).await.unwrap_err();
        assert!(matches!(err, SessionError::AlreadyInProgress));
    }
}
