//! Gesture recognition.

use crate::config::{GestureDefinition, GestureKind};

/// Number of frames a gesture is suppressed after it was triggered.
pub const COOLDOWN_FRAMES: u32 = 30;

/// Configured gesture with its trigger state.
#[derive(Debug)]
struct Binding {
    definition: GestureDefinition,

    // Gesture was triggered since the last time all fingers were lifted.
    fired: bool,

    // Remaining frames until the gesture can trigger again.
    cooldown: u32,
}

/// Tap gesture matcher.
///
/// Every gesture fires at most once per touch session, which lasts until no
/// finger is left on the screen.
#[derive(Debug)]
pub struct GestureMatcher {
    bindings: Vec<Binding>,
}

impl GestureMatcher {
    pub fn new(gestures: Vec<GestureDefinition>) -> Self {
        let bindings = gestures
            .into_iter()
            .map(|definition| Binding { definition, fired: false, cooldown: 0 })
            .collect();
        Self { bindings }
    }

    /// Evaluate gestures at the end of a touch frame.
    ///
    /// Returns all gestures which were triggered by this frame, in
    /// configuration order.
    pub fn evaluate(&mut self, fingers: usize) -> Vec<&GestureDefinition> {
        for binding in &mut self.bindings {
            binding.cooldown = binding.cooldown.saturating_sub(1);
        }

        // Reset touch session once all fingers are lifted.
        if fingers == 0 {
            for binding in &mut self.bindings {
                binding.fired = false;
            }
            return Vec::new();
        }

        let mut triggered = Vec::new();
        for binding in &mut self.bindings {
            let definition = &binding.definition;
            if definition.kind != GestureKind::Tap
                || definition.fingers != fingers
                || binding.fired
                || binding.cooldown > 0
            {
                continue;
            }

            binding.fired = true;
            binding.cooldown = COOLDOWN_FRAMES;
            triggered.push(&binding.definition);
        }
        triggered
    }
}
