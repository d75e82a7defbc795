//! One-shot effect playback requests routed to an opaque sink.
//!
//! The sim never plays particles or sound itself; it raises a request
//! and forgets it. A host without anything configured for a given kind
//! simply drops the request.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Kinds of one-shot effects the sim can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Hull detonation: particle burst plus sound.
    Explosion,
    /// Brief flash where a shot leaves the muzzle.
    MuzzleFlash,
    /// Spark burst where a projectile lands.
    ProjectileImpact,
}

/// Sink for fire-and-forget effect playback. Infallible from the sim's
/// point of view.
pub trait EffectSink {
    fn play(&mut self, kind: EffectKind, position: Vec3, rotation: Quat);
}

/// Default sink for headless runs: logs the request and drops it.
pub struct LogEffects;

impl EffectSink for LogEffects {
    fn play(&mut self, kind: EffectKind, position: Vec3, _rotation: Quat) {
        log::debug!(
            "effect {:?} at ({:.1}, {:.1}, {:.1})",
            kind,
            position.x,
            position.y,
            position.z
        );
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    pub type EffectLog = Rc<RefCell<Vec<(EffectKind, Vec3)>>>;

    /// Records every playback request; keep a clone of the log handle
    /// to inspect what was played.
    pub struct RecordingEffects {
        log: EffectLog,
    }

    impl RecordingEffects {
        pub fn new() -> (Self, EffectLog) {
            let log: EffectLog = Rc::new(RefCell::new(Vec::new()));
            (Self { log: log.clone() }, log)
        }
    }

    impl EffectSink for RecordingEffects {
        fn play(&mut self, kind: EffectKind, position: Vec3, _rotation: Quat) {
            self.log.borrow_mut().push((kind, position));
        }
    }
}
