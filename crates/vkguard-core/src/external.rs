//! Contracts for the collaborators the core consumes but does not own:
//! format capabilities, diagnostic delivery, and queue submission state.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tracing::{error, info, warn};
use vkguard_types::{Diagnostic, ObjectHandle, Severity, UsageKind, UsageKinds};

/// Answers whether a format exposes the attachment-capable feature bit for a
/// given usage kind. Backed by the physical device in production.
pub trait FormatCapabilities: Send + Sync {
    fn supports_attachment_usage(&self, format: i32, kind: UsageKind) -> bool;
}

/// Permissive oracle: every format supports everything. The default until a
/// real capability source is wired in.
pub struct AllFormats;

impl FormatCapabilities for AllFormats {
    fn supports_attachment_usage(&self, _format: i32, _kind: UsageKind) -> bool {
        true
    }
}

/// Table-backed oracle. Formats absent from the table support nothing.
#[derive(Default)]
pub struct FormatTable {
    formats: HashMap<i32, UsageKinds>,
}

impl FormatTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, format: i32, kinds: UsageKinds) {
        self.formats.insert(format, kinds);
    }
}

impl FormatCapabilities for FormatTable {
    fn supports_attachment_usage(&self, format: i32, kind: UsageKind) -> bool {
        self.formats
            .get(&format)
            .is_some_and(|kinds| kinds.contains(kind.bit()))
    }
}

/// Receives every diagnostic the core produces. Fire-and-forget: must never
/// fail and never block the recording thread.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diag: &Diagnostic);
}

/// Default sink: forwards diagnostics to `tracing` at severity-mapped levels.
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diag: &Diagnostic) {
        match diag.severity {
            Severity::Error => {
                error!(id = diag.id, objects = ?diag.objects, "{}", diag.message)
            }
            Severity::Warning | Severity::Performance => {
                warn!(id = diag.id, objects = ?diag.objects, "{}", diag.message)
            }
            Severity::Info => {
                info!(id = diag.id, objects = ?diag.objects, "{}", diag.message)
            }
        }
    }
}

/// Sink that drops everything.
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diag: &Diagnostic) {}
}

/// Supplies the per-object "is queued or executing" bit that in-use queries
/// bottom out on for leaf objects such as command buffers.
pub trait SubmissionTracker: Send + Sync {
    fn is_queued(&self, handle: ObjectHandle) -> bool;
}

/// Tracker for a device with no submissions: nothing is ever queued.
pub struct NoSubmissions;

impl SubmissionTracker for NoSubmissions {
    fn is_queued(&self, _handle: ObjectHandle) -> bool {
        false
    }
}

/// Hand-driven tracker: callers mark handles queued and retired explicitly.
#[derive(Default)]
pub struct ManualTracker {
    queued: RwLock<HashSet<ObjectHandle>>,
}

impl ManualTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_queued(&self, handle: ObjectHandle) {
        self.queued.write().insert(handle);
    }

    pub fn mark_retired(&self, handle: ObjectHandle) {
        self.queued.write().remove(&handle);
    }
}

impl SubmissionTracker for ManualTracker {
    fn is_queued(&self, handle: ObjectHandle) -> bool {
        self.queued.read().contains(&handle)
    }
}
