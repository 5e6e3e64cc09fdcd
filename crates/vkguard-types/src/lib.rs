pub mod diagnostic;
pub mod error;
pub mod handle;
pub mod render_pass;

pub use diagnostic::{Diagnostic, Severity};
pub use error::DescriptionError;
pub use handle::{ObjectHandle, ObjectKind};
pub use render_pass::{UsageKind, UsageKinds};
