//! Touch gesture detection.

use std::time::Duration;

use tracing::{debug, error, info, trace};

use crate::config::GestureDefinition;
use crate::daemon::Launcher;
use crate::gesture::GestureMatcher;
use crate::input::{InputEvent, TouchTracker};

/// Pause in event processing after a gesture command was launched.
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Gesture detector state.
#[derive(Debug)]
pub struct Detector {
    pub tracker: TouchTracker,
    pub matcher: GestureMatcher,
    pub launcher: Launcher,
}

impl Detector {
    pub fn new(gestures: Vec<GestureDefinition>) -> Self {
        Self {
            matcher: GestureMatcher::new(gestures),
            tracker: Default::default(),
            launcher: Default::default(),
        }
    }

    /// Handle a single input event.
    ///
    /// If any gesture command was launched, this returns the time input
    /// processing should be paused to let the touch state settle.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<Duration> {
        let fingers = self.tracker.process(event)?;

        let mut settle_delay = None;
        for gesture in self.matcher.evaluate(fingers) {
            info!("Detected {}-finger {}, running {:?}", gesture.fingers, gesture.kind, gesture.command);
            debug!("Touches: {:?}", self.tracker.touches().collect::<Vec<_>>());

            if let Err(err) = self.launcher.spawn(&gesture.command) {
                error!("Unable to launch {:?}: {err}", gesture.command);
            }

            let delay = gesture.duration.unwrap_or(SETTLE_DELAY);
            settle_delay = settle_delay.max(Some(delay));
        }

        settle_delay
    }

    /// Collect exit status of finished commands.
    pub fn reap(&mut self) {
        self.launcher.reap();
        trace!("{} command(s) still running", self.launcher.pending());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GestureKind;
    use crate::input::tests::{lift, sync, touch_down};

    fn tap(fingers: usize, duration: Option<Duration>) -> GestureDefinition {
        GestureDefinition { kind: GestureKind::Tap, fingers, command: "true".into(), duration }
    }

    fn feed(detector: &mut Detector, events: &[InputEvent]) -> Option<Duration> {
        events.iter().filter_map(|event| detector.handle_event(*event)).max()
    }

    #[test]
    fn three_finger_tap() {
        let mut detector = Detector::new(vec![tap(3, None)]);

        assert_eq!(feed(&mut detector, &touch_down(0, 1)), None);
        assert_eq!(feed(&mut detector, &touch_down(1, 2)), None);
        assert_eq!(feed(&mut detector, &[sync()]), None);

        assert_eq!(feed(&mut detector, &touch_down(2, 3)), None);
        assert_eq!(feed(&mut detector, &[sync()]), Some(SETTLE_DELAY));
        assert_eq!(detector.launcher.pending(), 1);

        // Holding fingers down does not trigger again.
        for _ in 0..50 {
            assert_eq!(feed(&mut detector, &[sync()]), None);
        }

        // Lift everything and tap again.
        for slot in 0..3 {
            feed(&mut detector, &lift(slot));
        }
        assert_eq!(feed(&mut detector, &[sync()]), None);
        assert_eq!(detector.tracker.finger_count(), 0);

        for slot in 0..3 {
            feed(&mut detector, &touch_down(slot, slot + 10));
        }
        assert_eq!(feed(&mut detector, &[sync()]), Some(SETTLE_DELAY));
    }

    #[test]
    fn longest_settle_delay() {
        let long = Duration::from_secs(1);
        let mut detector = Detector::new(vec![tap(1, None), tap(1, Some(long)), tap(2, None)]);

        feed(&mut detector, &touch_down(0, 1));
        assert_eq!(feed(&mut detector, &[sync()]), Some(long));
        assert_eq!(detector.launcher.pending(), 2);
    }

    #[test]
    fn lift_resets_session() {
        let mut detector = Detector::new(vec![tap(1, Some(Duration::ZERO))]);

        feed(&mut detector, &touch_down(4, 1));
        assert_eq!(feed(&mut detector, &[sync()]), Some(Duration::ZERO));

        feed(&mut detector, &lift(4));
        assert_eq!(feed(&mut detector, &[sync()]), None);
        assert_eq!(detector.tracker.finger_count(), 0);

        // Session is reset, but the cooldown still applies.
        feed(&mut detector, &touch_down(4, 2));
        assert_eq!(feed(&mut detector, &[sync()]), None);
    }
}
