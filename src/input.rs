//! Multi-touch input tracking.

use std::collections::BTreeMap;
use std::mem;

/// Synchronization event type.
/// <https://github.com/torvalds/linux/blob/9f4211bf7f811b653aa6acfb9aea38222436a458/include/uapi/linux/input-event-codes.h#L39>
pub const EV_SYN: u16 = 0x00;

/// Absolute axis event type.
pub const EV_ABS: u16 = 0x03;

/// End of an event frame.
pub const SYN_REPORT: u16 = 0;

/// Kernel event buffer overrun; everything up to the next report is invalid.
pub const SYN_DROPPED: u16 = 3;

/// Multi-touch axis codes.
/// <https://github.com/torvalds/linux/blob/9f4211bf7f811b653aa6acfb9aea38222436a458/include/uapi/linux/input-event-codes.h#L848>
pub const ABS_MT_SLOT: u16 = 0x2f;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;

/// Tracking ID marking a lifted contact.
const LIFT_OFF: i32 = -1;

/// Decoded kernel input event.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct InputEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    pub fn new(kind: u16, code: u16, value: i32) -> Self {
        Self { kind, code, value }
    }
}

impl From<libc::input_event> for InputEvent {
    fn from(event: libc::input_event) -> Self {
        Self { kind: event.type_, code: event.code, value: event.value }
    }
}

/// Live contact on the touchscreen.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct TouchPoint {
    pub tracking_id: i32,
    pub slot: i32,
    pub x: i32,
    pub y: i32,
}

/// Uncommitted changes to a single slot.
#[derive(Default, Copy, Clone, Debug)]
struct PendingSlot {
    contact: Option<Contact>,
    x: Option<i32>,
    y: Option<i32>,
}

#[derive(Copy, Clone, Debug)]
enum Contact {
    Down(i32),
    Up,
}

/// Per-slot multi-touch state.
///
/// Changes are collected for the current frame and only applied to the
/// active touches once the frame is terminated by a `SYN_REPORT`.
#[derive(Default, Debug)]
pub struct TouchTracker {
    touches: BTreeMap<i32, TouchPoint>,
    pending: BTreeMap<i32, PendingSlot>,

    // Last reported coordinates of every slot, since unchanged axes are not repeated.
    positions: BTreeMap<i32, (i32, i32)>,

    current_slot: i32,
    dropped: bool,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a single input event.
    ///
    /// Returns the number of active touches whenever a frame was completed.
    pub fn process(&mut self, event: InputEvent) -> Option<usize> {
        match (event.kind, event.code) {
            (EV_SYN, SYN_REPORT) if self.dropped => {
                self.dropped = false;
                return Some(self.finger_count());
            },
            (EV_SYN, SYN_REPORT) => {
                self.commit();
                return Some(self.finger_count());
            },
            (EV_SYN, SYN_DROPPED) => {
                self.pending.clear();
                self.dropped = true;
            },
            // Slot changes are only reported once, so they must survive dropped frames.
            (EV_ABS, ABS_MT_SLOT) => self.current_slot = event.value,
            _ if self.dropped => (),
            (EV_ABS, ABS_MT_TRACKING_ID) if event.value == LIFT_OFF => {
                self.pending_slot().contact = Some(Contact::Up);
            },
            (EV_ABS, ABS_MT_TRACKING_ID) => {
                self.pending_slot().contact = Some(Contact::Down(event.value));
            },
            (EV_ABS, ABS_MT_POSITION_X) => self.pending_slot().x = Some(event.value),
            (EV_ABS, ABS_MT_POSITION_Y) => self.pending_slot().y = Some(event.value),
            _ => (),
        }

        None
    }

    /// Number of contacts currently on the screen.
    pub fn finger_count(&self) -> usize {
        self.touches.len()
    }

    /// Active contacts, ordered by slot.
    pub fn touches(&self) -> impl Iterator<Item = &TouchPoint> {
        self.touches.values()
    }

    fn pending_slot(&mut self) -> &mut PendingSlot {
        self.pending.entry(self.current_slot).or_default()
    }

    /// Apply all pending changes of the current frame.
    fn commit(&mut self) {
        for (slot, pending) in mem::take(&mut self.pending) {
            let position = self.positions.entry(slot).or_default();
            position.0 = pending.x.unwrap_or(position.0);
            position.1 = pending.y.unwrap_or(position.1);
            let (x, y) = *position;

            match pending.contact {
                Some(Contact::Up) => {
                    self.touches.remove(&slot);
                },
                Some(Contact::Down(tracking_id)) => {
                    self.touches.insert(slot, TouchPoint { tracking_id, slot, x, y });
                },
                // Movement is only relevant for existing contacts.
                None => {
                    if let Some(touch) = self.touches.get_mut(&slot) {
                        touch.x = x;
                        touch.y = y;
                    }
                },
            }
        }
    }
}
