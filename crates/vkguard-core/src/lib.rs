//! Validation core for GPU-API object lifetimes and render pass usage.
//!
//! Two subsystems live here: the object-lifetime graph (handle registry,
//! parent edges, in-use queries, invalidation cascades) and the render pass
//! validators (attachment usage, subpass dependency DAG, compatibility,
//! recording lifecycle). Everything is synchronous and advisory: operations
//! return the diagnostics they found and always complete.

pub mod attachment_usage;
pub mod compatibility;
pub mod config;
pub mod context;
pub mod dependency_graph;
pub mod error;
pub mod external;
pub mod handle_store;
pub mod lifecycle;
pub mod lifetime;
pub mod render_pass_model;

pub use config::ValidationConfig;
pub use context::ValidationContext;
pub use error::CoreError;
pub use lifecycle::RecordingContext;
pub use render_pass_model::RenderPassModel;
