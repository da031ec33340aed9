pub mod components;
pub mod index;
pub mod systems;
