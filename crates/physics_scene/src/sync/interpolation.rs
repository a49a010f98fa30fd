//! Render interpolation between the last two ticks

use slotmap::SparseSecondaryMap;

use crate::foundation::math::Transform2D;
use crate::scene::{NodeHandle, SceneGraph};

#[derive(Debug, Clone, Copy)]
struct Sample {
    previous: Transform2D,
    current: Transform2D,
    tick: u64,
}

/// Previous and current scene transform of every body-driven node
///
/// Entries not refreshed during the latest tick are dropped by
/// [`TransformHistory::prune`], so a node that stops being body-driven is
/// never blended again.
#[derive(Debug, Default)]
pub struct TransformHistory {
    samples: SparseSecondaryMap<NodeHandle, Sample>,
}

impl TransformHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the transform a node received at `tick`
    pub fn record(&mut self, node: NodeHandle, transform: Transform2D, tick: u64) {
        match self.samples.get_mut(node) {
            Some(sample) => {
                sample.previous = sample.current;
                sample.current = transform;
                sample.tick = tick;
            }
            None => {
                self.samples.insert(node, Sample { previous: transform, current: transform, tick });
            }
        }
    }

    /// Drop entries not recorded at `tick`
    pub fn prune(&mut self, tick: u64) {
        self.samples.retain(|_, sample| sample.tick == tick);
    }

    /// Forget one node
    pub fn forget(&mut self, node: NodeHandle) {
        self.samples.remove(node);
    }

    /// Blend of previous and current for a node
    pub fn blended(&self, node: NodeHandle, alpha: f32) -> Option<Transform2D> {
        self.samples
            .get(node)
            .map(|sample| sample.previous.lerp(&sample.current, alpha.clamp(0.0, 1.0)))
    }

    /// Write blended transforms into the graph, parents before children
    ///
    /// Nodes no longer in the graph are forgotten. Returns the number of
    /// nodes written.
    pub fn apply(&mut self, graph: &mut SceneGraph, alpha: f32) -> usize {
        let alpha = alpha.clamp(0.0, 1.0);
        self.samples.retain(|node, _| graph.contains(node));

        let mut writes: Vec<_> = self
            .samples
            .iter()
            .map(|(node, sample)| (node, sample.previous.lerp(&sample.current, alpha)))
            .collect();
        graph.set_scene_transforms(&mut writes);
        writes.len()
    }

    /// Number of tracked nodes
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// No tracked nodes
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
