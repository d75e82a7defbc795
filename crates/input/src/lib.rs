//! Ship command state fed by the host's input bindings.
//!
//! The host maps raw device events to three commands: a rotation axis,
//! a thrust hold, and a fire trigger. The sim consumes this state once
//! per tick; it never sees keys or buttons.

/// Per-tick ship commands.
#[derive(Debug, Default)]
pub struct ShipInput {
    /// Rotation axis in [-1, 1]. Held value, re-set by the host as the
    /// axis moves.
    rotation_axis: f32,
    /// Whether thrust is held.
    thrusting: bool,
    /// Fire requested since the last tick consumed it.
    fire_queued: bool,
}

impl ShipInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rotation axis, clamped to [-1, 1].
    pub fn set_rotation_axis(&mut self, value: f32) {
        self.rotation_axis = value.clamp(-1.0, 1.0);
    }

    /// Set whether thrust is held.
    pub fn set_thrusting(&mut self, thrusting: bool) {
        self.thrusting = thrusting;
    }

    /// Queue a single fire request. Repeated triggers before the next
    /// tick collapse into one shot.
    pub fn trigger_fire(&mut self) {
        self.fire_queued = true;
    }

    /// Current rotation axis value.
    pub fn rotation_axis(&self) -> f32 {
        self.rotation_axis
    }

    /// Whether thrust is currently held.
    pub fn is_thrusting(&self) -> bool {
        self.thrusting
    }

    /// Consume the queued fire request, if any.
    pub fn take_fire(&mut self) -> bool {
        std::mem::take(&mut self.fire_queued)
    }
}
