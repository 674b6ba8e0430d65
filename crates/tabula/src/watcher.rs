//! Change notification

use tabula_core::{CellReference, Value};

/// Receives the new value of every cell an edit changed
///
/// Called after the value is stored, once per changed cell, in
/// recalculation order. Any `FnMut(CellReference, &Value)` closure is a
/// watcher.
pub trait CellWatcher {
    fn on_cell_changed(&mut self, reference: CellReference, value: &Value);
}

impl<F> CellWatcher for F
where
    F: FnMut(CellReference, &Value),
{
    fn on_cell_changed(&mut self, reference: CellReference, value: &Value) {
        self(reference, value)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherId(pub(crate) u64);

/// A registered watcher
pub(crate) struct Subscription {
    pub id: WatcherId,
    pub watcher: Box<dyn CellWatcher + Send>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
