use std::rc::Rc;

use crate::config::SyncConfig;
use crate::media::clock::Clock;
use crate::media::collect::AssetCollector;
use crate::media::node::NodeId;
use crate::media::pool::{AssetPool, HandleFactory};

/// Media session shared by every node of a scene.
///
/// Owns the handle pool, the asset collector and the sync configuration. Created per preview
/// session or render job and torn down with [`MediaContext::dispose`].
pub struct MediaContext<F: HandleFactory> {
    pool: AssetPool<F>,
    clock: Rc<dyn Clock>,
    collector: AssetCollector,
    config: SyncConfig,
    next_node: u64,
}

impl<F: HandleFactory> MediaContext<F> {
    /// Session creating handles through `factory` and polling readiness on `clock`.
    pub fn new(factory: F, clock: Rc<dyn Clock>, config: SyncConfig) -> Self {
        Self {
            pool: AssetPool::new(factory),
            clock,
            collector: AssetCollector::new(),
            config,
            next_node: 0,
        }
    }

    /// Allocate a fresh node id.
    pub fn next_node_id(&mut self) -> NodeId {
        self.next_node += 1;
        NodeId(self.next_node)
    }

    /// Handle pool.
    pub fn pool(&self) -> &AssetPool<F> {
        &self.pool
    }

    /// Handle pool, mutably.
    pub fn pool_mut(&mut self) -> &mut AssetPool<F> {
        &mut self.pool
    }

    /// Clock used for readiness waits.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Per-frame asset collector.
    pub fn collector(&self) -> &AssetCollector {
        &self.collector
    }

    /// Per-frame asset collector, mutably.
    pub fn collector_mut(&mut self) -> &mut AssetCollector {
        &mut self.collector
    }

    /// Sync configuration handed to new nodes.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Pause and drop every pooled handle and forget collected records.
    pub fn dispose(&mut self) {
        tracing::debug!(handles = self.pool.len(), "disposing media context");
        self.pool.clear();
        self.collector.clear();
    }
}

impl<F: HandleFactory> Drop for MediaContext<F> {
    fn drop(&mut self) {
        self.pool.clear();
    }
}
