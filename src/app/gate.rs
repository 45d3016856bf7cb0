use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Allows at most one save in flight. Clones share the same flag, so a UI
/// can hold one to grey out its buttons.
#[derive(Debug, Clone, Default)]
pub struct SaveGate {
    busy: Arc<AtomicBool>,
}

impl SaveGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_saving(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// `None` while another permit is alive.
    pub fn try_acquire(&self) -> Option<SavePermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SavePermit {
                busy: Arc::clone(&self.busy),
            })
    }
}

/// Releases the gate when dropped, including when the owning future is
/// cancelled mid-save.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct SavePermit {
    busy: Arc<AtomicBool>,
}

impl Drop for SavePermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
