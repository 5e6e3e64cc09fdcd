use serde::{Deserialize, Serialize};

use crate::handle::ObjectHandle;

/// How bad a finding is. Nothing here is fatal -- validation is advisory
/// and the triggering operation always proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// API contract violation
    Error,
    /// Legal but probably unintended
    Warning,
    /// Legal but likely wasteful (bandwidth-style findings)
    Performance,
    Info,
}

/// One validation finding. Collected and returned by every top-level
/// operation, and forwarded to the configured sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable identifier for this class of finding, e.g.
    /// `"dependency-back-edge"`. Stable across releases so sinks can filter.
    pub id: &'static str,
    /// Handles involved, most specific first
    pub objects: Vec<ObjectHandle>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(id: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, id, message)
    }

    pub fn warning(id: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, id, message)
    }

    pub fn performance(id: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Performance, id, message)
    }

    pub fn new(severity: Severity, id: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            id,
            objects: Vec::new(),
            message: message.into(),
        }
    }

    pub fn with_object(mut self, handle: ObjectHandle) -> Self {
        self.objects.push(handle);
        self
    }
}

/// Stable diagnostic identifiers, one per check.
pub mod ids {
    // Attachment usage
    pub const ATTACHMENT_INDEX_OOB: &str = "attachment-index-out-of-range";
    pub const ATTACHMENT_DUAL_USE: &str = "attachment-dual-use";
    pub const ATTACHMENT_LAYOUT_MISMATCH: &str = "attachment-layout-inconsistent";
    pub const ATTACHMENT_FORMAT_UNSUPPORTED: &str = "attachment-format-unsupported";
    pub const LOAD_READS_UNDEFINED: &str = "load-op-reads-undefined";
    pub const CLEAR_NEVER_WRITTEN: &str = "clear-op-never-written";
    pub const STORE_NEVER_WRITTEN: &str = "store-op-never-written";

    // Subpass dependencies
    pub const DEP_BOTH_EXTERNAL: &str = "dependency-both-external";
    pub const DEP_VIEW_LOCAL_EXTERNAL: &str = "dependency-view-local-external";
    pub const DEP_BACK_EDGE: &str = "dependency-back-edge";
    pub const DEP_SELF_VIEW_OFFSET: &str = "self-dependency-view-offset";
    pub const DEP_SELF_MULTIVIEW: &str = "self-dependency-multiview";
    pub const DEP_SELF_STAGE_MIX: &str = "self-dependency-stage-mix";
    pub const DEP_SHADER_RESOLVE: &str = "shader-resolve-forward-dependency";

    // Compatibility
    pub const RENDER_PASS_INCOMPATIBLE: &str = "render-pass-incompatible";
    pub const INHERITANCE_SUBPASS_MISMATCH: &str = "inheritance-subpass-mismatch";

    // Recording lifecycle
    pub const PASS_ALREADY_ACTIVE: &str = "render-pass-already-active";
    pub const PASS_NOT_ACTIVE: &str = "render-pass-not-active";
    pub const PASS_MODE_MISMATCH: &str = "render-pass-mode-mismatch";
    pub const SUBPASS_BEYOND_FINAL: &str = "subpass-beyond-final";
    pub const ENDED_BEFORE_FINAL_SUBPASS: &str = "ended-before-final-subpass";
    pub const OP_REQUIRES_RENDER_PASS: &str = "operation-requires-render-pass";
    pub const OP_FORBIDDEN_INSIDE_PASS: &str = "operation-forbidden-inside-render-pass";
    pub const SECONDARY_CONTENTS_RESTRICTION: &str = "secondary-contents-restriction";

    // Framebuffers and begin-time state
    pub const FRAMEBUFFER_ATTACHMENT_COUNT: &str = "framebuffer-attachment-count";
    pub const FRAMEBUFFER_DIMENSIONS: &str = "framebuffer-dimensions";
    pub const CLEAR_VALUE_COUNT: &str = "clear-value-count-too-small";

    // Object lifetime
    pub const INVALID_OBJECT_HANDLE: &str = "invalid-object-handle";
    pub const USES_DESTROYED_OBJECT: &str = "uses-destroyed-object";
    pub const DESTROYING_IN_USE_OBJECT: &str = "destroying-in-use-object";
}
