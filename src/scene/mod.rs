//! Boundary to the rendering collaborator.
//!
//! The simulation never builds meshes. It asks the scene for a visual per
//! agent, pushes poses to it once per frame, and asks it which visual root a
//! picking ray hits.

pub mod headless;
pub mod instance;

use thiserror::Error;

use crate::pet::Breed;
use crate::pick::Ray;

pub use headless::HeadlessScene;
pub use instance::AgentInstance;

/// Identity of a visual root in the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualId(pub u32);

/// What the scene should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Pet(Breed),
    Walker,
}

/// Description of an agent's visual: the root plus the animatable parts.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentVisual {
    pub root: VisualId,
    pub limbs: usize,
    pub has_tail: bool,
    pub has_tongue: bool,
}

/// Animatable parts of each model.
pub fn rig(kind: AgentKind) -> (usize, bool, bool) {
    match kind {
        AgentKind::Pet(Breed::Shiba) => (4, true, false),
        AgentKind::Pet(Breed::Corgi) => (4, false, true),
        AgentKind::Pet(Breed::Munchkin) => (4, true, false),
        AgentKind::Walker => (2, false, false),
    }
}

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("scene could not build a visual for {0:?}: {1}")]
    Build(AgentKind, String),

    #[error("unknown visual root {0:?}")]
    UnknownVisual(VisualId),

    #[error("scene backend failure: {0}")]
    Backend(String),
}

pub trait Scene {
    fn create_agent_visual(&mut self, kind: AgentKind) -> Result<AgentVisual, SceneError>;

    fn remove_agent_visual(&mut self, root: VisualId);

    /// Write position, rotation and scale for every agent.
    fn apply_poses(&mut self, instances: &[AgentInstance]) -> Result<(), SceneError>;

    /// Nearest visual root hit by the ray.
    fn raycast(&self, ray: &Ray) -> Option<VisualId>;
}
