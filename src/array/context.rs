use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::node::NodePath;

/// An engine session: a store and the registry of open [`Array`](super::Array) handles.
///
/// Arrays are created and opened through a context.
/// Every open handle is counted until it is closed or dropped, which makes leaked handles observable.
#[derive(Debug)]
pub struct Context<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    open_handles: Mutex<HashMap<NodePath, usize>>,
}

impl<TStorage: ?Sized> Context<TStorage> {
    /// Create a new context over `storage`.
    #[must_use]
    pub fn new(storage: Arc<TStorage>) -> Self {
        Self {
            storage,
            open_handles: Mutex::default(),
        }
    }

    /// Return the underlying storage.
    #[must_use]
    pub fn storage(&self) -> Arc<TStorage> {
        self.storage.clone()
    }

    /// Return the number of open handles of the array at `path`.
    #[must_use]
    pub fn open_handles(&self, path: &NodePath) -> usize {
        self.open_handles.lock().get(path).copied().unwrap_or_default()
    }

    /// Return the number of open handles of all arrays.
    #[must_use]
    pub fn total_open_handles(&self) -> usize {
        self.open_handles.lock().values().sum()
    }

    pub(super) fn acquire(&self, path: &NodePath) {
        *self.open_handles.lock().entry(path.clone()).or_default() += 1;
    }

    pub(super) fn release(&self, path: &NodePath) {
        let mut open_handles = self.open_handles.lock();
        if let Some(count) = open_handles.get_mut(path) {
            *count -= 1;
            if *count == 0 {
                open_handles.remove(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;

    #[test]
    fn context_handles() {
        let context = Context::new(Arc::new(MemoryStore::new()));
        let path = NodePath::new("/a").unwrap();
        assert_eq!(context.total_open_handles(), 0);
        context.acquire(&path);
        context.acquire(&path);
        context.acquire(&NodePath::root());
        assert_eq!(context.open_handles(&path), 2);
        assert_eq!(context.total_open_handles(), 3);
        context.release(&path);
        context.release(&path);
        context.release(&path);
        assert_eq!(context.open_handles(&path), 0);
        assert_eq!(context.total_open_handles(), 1);
    }
}
