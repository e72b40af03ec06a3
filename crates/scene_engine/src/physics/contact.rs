//! Contact callbacks

use std::cell::Cell;
use std::rc::Rc;

use super::RigidBodyHandle;

/// Receives contact events from a physics world
pub trait ContactListener {
    /// Two bodies started touching
    fn contact_begin(&mut self, a: RigidBodyHandle, b: RigidBodyHandle);

    /// Two bodies stopped touching
    fn contact_end(&mut self, _a: RigidBodyHandle, _b: RigidBodyHandle) {}
}

/// Listener that counts contact begin events
///
/// Clones share the same tally, so keep one clone and hand the other to the
/// world.
#[derive(Debug, Clone, Default)]
pub struct ContactCounter {
    begun: Rc<Cell<usize>>,
    ended: Rc<Cell<usize>>,
}

impl ContactCounter {
    /// Create a counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Contacts started so far
    pub fn begun(&self) -> usize {
        self.begun.get()
    }

    /// Contacts ended so far
    pub fn ended(&self) -> usize {
        self.ended.get()
    }
}

impl ContactListener for ContactCounter {
    fn contact_begin(&mut self, a: RigidBodyHandle, b: RigidBodyHandle) {
        log::trace!("Contact begin {:?} <-> {:?}", a, b);
        self.begun.set(self.begun.get() + 1);
    }

    fn contact_end(&mut self, _a: RigidBodyHandle, _b: RigidBodyHandle) {
        self.ended.set(self.ended.get() + 1);
    }
}
