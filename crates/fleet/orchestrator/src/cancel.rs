//! In-flight cancel handles keyed by operation

use dashmap::DashMap;
use fleet_types::OperationId;
use tokio_util::sync::CancellationToken;

/// Cancel handles for operations currently executing on this process
#[derive(Debug, Default)]
pub struct CancelRegistry {
    handles: DashMap<OperationId, CancellationToken>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: OperationId, token: CancellationToken) {
        self.handles.insert(id, token);
    }

    pub fn remove(&self, id: &OperationId) -> Option<CancellationToken> {
        self.handles.remove(id).map(|(_, token)| token)
    }

    /// Fire the handle for `id`. Returns false when nothing is registered.
    pub fn cancel(&self, id: &OperationId) -> bool {
        match self.handles.get(id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
