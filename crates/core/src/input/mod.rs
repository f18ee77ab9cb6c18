use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::LANE_COUNT;

/// A key-down on `track`, stamped with the playback position it happened at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub timestamp: f64,
    pub track: usize,
}

impl InputEvent {
    pub fn new(timestamp: f64, track: usize) -> Self {
        Self { timestamp, track }
    }
}

/// FIFO buffer between the input collaborator and the session.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<InputEvent> {
        self.events.pop_front()
    }

    /// Pending events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Physical key state per lane. Rendering only; judgments never read it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressState {
    lanes: [bool; LANE_COUNT],
}

impl PressState {
    pub fn press(&mut self, lane: usize) {
        if let Some(slot) = self.lanes.get_mut(lane) {
            *slot = true;
        }
    }

    pub fn release(&mut self, lane: usize) {
        if let Some(slot) = self.lanes.get_mut(lane) {
            *slot = false;
        }
    }

    pub fn is_pressed(&self, lane: usize) -> bool {
        self.lanes.get(lane).copied().unwrap_or(false)
    }

    pub fn lanes(&self) -> [bool; LANE_COUNT] {
        self.lanes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_arrival_order() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::new(1.0, 2));
        queue.push(InputEvent::new(0.5, 1));
        queue.push(InputEvent::new(1.0, 0));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(InputEvent::new(1.0, 2)));
        assert_eq!(queue.pop(), Some(InputEvent::new(0.5, 1)));
        assert_eq!(queue.pop(), Some(InputEvent::new(1.0, 0)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn press_state_tracks_each_lane() {
        let mut press = PressState::default();
        press.press(1);
        press.press(3);
        press.release(3);
        press.press(9);

        assert_eq!(press.lanes(), [false, true, false, false]);
        assert!(!press.is_pressed(9));
    }
}
