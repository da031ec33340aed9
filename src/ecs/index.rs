use std::collections::HashMap;

use crate::scene::VisualId;

/// Maps scene visual roots back to the agents that own them.
///
/// Picking asks the scene which root a ray hit and resolves it here, so the
/// scene graph never doubles as an identity lookup.
#[derive(Debug, Default)]
pub struct VisualIndex {
    by_root: HashMap<VisualId, hecs::Entity>,
}

impl VisualIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, root: VisualId, entity: hecs::Entity) {
        self.by_root.insert(root, entity);
    }

    pub fn remove(&mut self, root: VisualId) -> Option<hecs::Entity> {
        self.by_root.remove(&root)
    }

    pub fn agent(&self, root: VisualId) -> Option<hecs::Entity> {
        self.by_root.get(&root).copied()
    }

    pub fn len(&self) -> usize {
        self.by_root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_root.is_empty()
    }
}
