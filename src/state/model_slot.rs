use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Holds the current version of a read-only model
///
/// Readers clone the inner `Arc` and keep using that snapshot for as long as
/// they need it. A retrain builds a complete new model off to the side and
/// publishes it with [`ModelSlot::store`], so a reader sees either the old
/// model or the new one, never a half-updated one.
pub struct ModelSlot<M: ?Sized> {
    current: RwLock<Arc<M>>,
    generation: AtomicU64,
}

impl<M: ?Sized> ModelSlot<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self {
            current: RwLock::new(model),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns a snapshot of the current model
    pub fn load(&self) -> Arc<M> {
        Arc::clone(&self.current.read())
    }

    /// Publishes a new model
    pub fn store(&self, model: Arc<M>) {
        *self.current.write() = model;
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Number of times a model has been published since creation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl<M: ?Sized> std::fmt::Debug for ModelSlot<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSlot")
            .field("generation", &self.generation())
            .finish()
    }
}
