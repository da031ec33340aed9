//! Pet farm diorama core.
//!
//! Pets roam a circular island, bouncing off its shore and off fenced
//! paddocks, while a scripted character wanders among them. Pets are earned
//! by keeping a diary and completing notes, persisted locally and optionally
//! mirrored to a remote database.
//!
//! Module structure:
//! - `spatial` - island boundary and exclusion zones
//! - `ecs` - agent components and per-tick systems
//! - `sim` - agent registry and simulation context
//! - `journal` / `store` / `sync` - records, local persistence, remote mirror
//! - `scene` - rendering collaborator boundary
//! - `app` - application context and fixed-timestep frame loop

pub mod app;
pub mod config;
pub mod debug;
pub mod ecs;
pub mod journal;
pub mod pet;
pub mod pick;
pub mod scene;
pub mod sim;
pub mod spatial;
pub mod store;
pub mod sync;
