//! Core application logic
//!
//! Dataset binding and lock rules, scenes built from configuration, and the
//! session that ties them to input. NO imports from frontend/ or rendering
//! code. Core updates structures in the data layer, frontends read and render.

pub mod binding;
pub mod scene;
pub mod session;

pub use binding::{DatasetBinding, KeyTemplate, LockRule, LockTable};
pub use scene::{LayoutRole, Scene, SceneModel};
pub use session::Session;
