use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::assets::source::{normalize_source_key, pending_key};
use crate::foundation::core::MediaKind;
use crate::foundation::error::ScenecastResult;
use crate::media::handle::MediaHandle;
use crate::media::node::NodeId;

/// Pool-owned media handle borrowed by scene nodes.
pub type SharedHandle<H> = Rc<RefCell<H>>;

/// Creates native media handles on behalf of an [`AssetPool`].
pub trait HandleFactory {
    /// Concrete handle type.
    type Handle: MediaHandle;

    /// Create a handle for `src`. An empty `src` requests an unloaded placeholder.
    fn create(&self, src: &str, kind: MediaKind) -> ScenecastResult<Self::Handle>;
}

struct PoolEntry<H> {
    handle: SharedHandle<H>,
    kind: MediaKind,
    borrowers: BTreeSet<NodeId>,
    // (tick, node) of the node steering this handle in the most recent tick.
    driver: Option<(u64, NodeId)>,
}

impl<H> PoolEntry<H> {
    fn new(handle: H, kind: MediaKind, node: NodeId) -> Self {
        Self {
            handle: Rc::new(RefCell::new(handle)),
            kind,
            borrowers: BTreeSet::from([node]),
            driver: None,
        }
    }
}

/// Keyed cache of native media handles, one per normalized source.
///
/// The pool is an explicit session object: nodes borrow handles through it, and handles are only
/// disposed by [`AssetPool::sweep`] or [`AssetPool::clear`]. Nodes sharing a source share the
/// handle; [`AssetPool::claim_driver`] elects one of them per tick to steer it.
pub struct AssetPool<F: HandleFactory> {
    factory: F,
    entries: HashMap<String, PoolEntry<F::Handle>>,
}

impl<F: HandleFactory> AssetPool<F> {
    /// Empty pool creating handles through `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            entries: HashMap::new(),
        }
    }

    /// Factory backing this pool.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Number of live entries (resolved and pending).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the pool holds no handles.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` when a handle exists under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Handle stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<SharedHandle<F::Handle>> {
        self.entries.get(key).map(|e| e.handle.clone())
    }

    /// Placeholder handle for `node` while its source is unknown.
    pub fn acquire_pending(
        &mut self,
        node: NodeId,
        kind: MediaKind,
    ) -> ScenecastResult<SharedHandle<F::Handle>> {
        let key = pending_key(node.0);
        if let Some(entry) = self.entries.get(&key) {
            return Ok(entry.handle.clone());
        }
        let handle = self.factory.create("", kind)?;
        let entry = PoolEntry::new(handle, kind, node);
        let shared = entry.handle.clone();
        self.entries.insert(key, entry);
        Ok(shared)
    }

    /// Borrow the handle for `src` on behalf of `node`, creating it if needed.
    ///
    /// When `node` holds a placeholder, the placeholder is loaded with `src` and migrated to the
    /// resolved key; if another node already loaded `src`, the placeholder is dropped and the
    /// existing handle is shared instead.
    pub fn acquire(
        &mut self,
        node: NodeId,
        src: &str,
        kind: MediaKind,
    ) -> ScenecastResult<SharedHandle<F::Handle>> {
        let key = normalize_source_key(src)?;
        let pending = self.entries.remove(&pending_key(node.0));

        if let Some(entry) = self.entries.get_mut(&key) {
            if entry.kind != kind {
                tracing::warn!(%key, ?kind, existing = ?entry.kind, "media kind mismatch for pooled source");
            }
            entry.borrowers.insert(node);
            return Ok(entry.handle.clone());
        }

        let entry = match pending {
            Some(mut entry) => {
                tracing::debug!(%key, node = node.0, "migrating pending handle");
                entry.handle.borrow_mut().load(src);
                entry.kind = kind;
                entry
            }
            None => {
                tracing::debug!(%key, node = node.0, "creating media handle");
                PoolEntry::new(self.factory.create(src, kind)?, kind, node)
            }
        };
        let shared = entry.handle.clone();
        self.entries.insert(key, entry);
        Ok(shared)
    }

    /// Elect the node steering `key` during `tick`.
    ///
    /// The first claimant in a tick wins; later claimants in the same tick get `false` and must not
    /// mutate the handle. Unknown keys are never contended.
    pub fn claim_driver(&mut self, key: &str, node: NodeId, tick: u64) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return true;
        };
        match entry.driver {
            Some((t, driver)) if t == tick => driver == node,
            _ => {
                entry.driver = Some((tick, node));
                true
            }
        }
    }

    /// Number of nodes currently borrowing `key`.
    pub fn borrower_count(&self, key: &str) -> usize {
        self.entries.get(key).map_or(0, |e| e.borrowers.len())
    }

    /// Drop the borrow `node` holds on `key`.
    pub fn unborrow(&mut self, key: &str, node: NodeId) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.borrowers.remove(&node);
        }
    }

    /// Drop every borrow held by `node`. Handles stay pooled until [`AssetPool::sweep`].
    pub fn release(&mut self, node: NodeId) {
        self.entries.remove(&pending_key(node.0));
        for entry in self.entries.values_mut() {
            entry.borrowers.remove(&node);
        }
    }

    /// Dispose handles no node borrows any more. Returns how many were dropped.
    pub fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, entry| {
            if entry.borrowers.is_empty() {
                tracing::debug!(%key, "disposing unborrowed media handle");
                entry.handle.borrow_mut().pause();
                false
            } else {
                true
            }
        });
        before - self.entries.len()
    }

    /// Pause and drop every handle.
    pub fn clear(&mut self) {
        for entry in self.entries.values() {
            entry.handle.borrow_mut().pause();
        }
        self.entries.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/pool.rs"]
mod tests;
