//! Per-attachment usage classification and conflict checking.

use ash::vk;
use vkguard_types::diagnostic::ids;
use vkguard_types::render_pass::AttachmentReference;
use vkguard_types::{Diagnostic, ObjectHandle, UsageKind, UsageKinds};

use crate::external::FormatCapabilities;
use crate::render_pass_model::RenderPassModel;

/// Index bounds rule, shared by every reference list walk.
pub fn validate_attachment_index(index: u32, count: usize) -> Option<Diagnostic> {
    if (index as usize) < count {
        return None;
    }
    Some(Diagnostic::error(
        ids::ATTACHMENT_INDEX_OOB,
        format!("attachment reference index {index} is out of range (attachment count {count})"),
    ))
}

/// Accumulated usage state of a single attachment.
#[derive(Debug, Clone, Default)]
pub struct AttachmentUsage {
    kinds: UsageKinds,
    /// Layout of the first non-conflicting use, per kind
    layouts: [Option<i32>; 5],
    first_use: Option<UsageKind>,
}

impl AttachmentUsage {
    pub fn kinds(&self) -> UsageKinds {
        self.kinds
    }

    pub fn first_use(&self) -> Option<UsageKind> {
        self.first_use
    }
}

fn kind_slot(kind: UsageKind) -> usize {
    match kind {
        UsageKind::Color => 0,
        UsageKind::Depth => 1,
        UsageKind::Input => 2,
        UsageKind::Preserve => 3,
        UsageKind::Resolve => 4,
    }
}

/// Conflict table: preserve excludes every other use; color and depth
/// exclude each other. Input and resolve may coexist with either.
fn conflicting_kinds(kind: UsageKind) -> UsageKinds {
    match kind {
        UsageKind::Color => UsageKinds::DEPTH | UsageKinds::PRESERVE,
        UsageKind::Depth => UsageKinds::COLOR | UsageKinds::PRESERVE,
        UsageKind::Input | UsageKind::Resolve => UsageKinds::PRESERVE,
        UsageKind::Preserve => UsageKinds::all() & !UsageKinds::PRESERVE,
    }
}

/// Classifies and conflict-checks attachment uses across one render pass.
pub struct AttachmentUsageAnalyzer {
    usages: Vec<AttachmentUsage>,
}

impl AttachmentUsageAnalyzer {
    pub fn new(attachment_count: usize) -> Self {
        Self {
            usages: vec![AttachmentUsage::default(); attachment_count],
        }
    }

    /// Record one use of an attachment. Idempotent on a repeated identical
    /// (kind, layout) pair; reports a layout inconsistency for a same-kind
    /// use in a different layout, and a dual use for a kind conflict. The
    /// use is recorded even when it conflicts, so later checks see the state
    /// the caller actually requested.
    ///
    /// The caller has already bounds-checked `attachment`.
    pub fn add_use(&mut self, attachment: u32, kind: UsageKind, layout: i32) -> Option<Diagnostic> {
        let usage = &mut self.usages[attachment as usize];
        if usage.first_use.is_none() {
            usage.first_use = Some(kind);
        }

        let conflict = usage.kinds & conflicting_kinds(kind);
        let diag = if !conflict.is_empty() {
            Some(Diagnostic::error(
                ids::ATTACHMENT_DUAL_USE,
                format!(
                    "attachment {attachment} used as {} but already used as {:?}",
                    kind.name(),
                    conflict
                ),
            ))
        } else if usage.kinds.contains(kind.bit()) {
            let slot = kind_slot(kind);
            match usage.layouts[slot] {
                Some(prev) if prev != layout => Some(Diagnostic::error(
                    ids::ATTACHMENT_LAYOUT_MISMATCH,
                    format!(
                        "attachment {attachment} used as {} in layout {layout} but a previous {} use specified layout {prev}",
                        kind.name(),
                        kind.name()
                    ),
                )),
                _ => None,
            }
        } else {
            None
        };

        if !usage.kinds.contains(kind.bit()) {
            usage.kinds |= kind.bit();
            usage.layouts[kind_slot(kind)] = Some(layout);
        }
        diag
    }

    pub fn usage(&self, attachment: u32) -> Option<&AttachmentUsage> {
        self.usages.get(attachment as usize)
    }

    /// True if the attachment was newly given this kind by the last
    /// `add_use` sequence (i.e. the kind bit is set).
    pub fn has_kind(&self, attachment: u32, kind: UsageKind) -> bool {
        self.usages
            .get(attachment as usize)
            .is_some_and(|u| u.kinds.contains(kind.bit()))
    }
}

/// Walk every reference list of every subpass in list order, applying the
/// bounds rule, the conflict table, and the format-capability oracle.
/// Returns the analyzer (for downstream heuristics) and the diagnostics.
pub fn analyze_render_pass(
    model: &RenderPassModel,
    caps: &dyn FormatCapabilities,
    render_pass: ObjectHandle,
) -> (AttachmentUsageAnalyzer, Vec<Diagnostic>) {
    let count = model.attachment_count();
    let mut analyzer = AttachmentUsageAnalyzer::new(count);
    let mut diags = Vec::new();

    let mut visit = |analyzer: &mut AttachmentUsageAnalyzer,
                     diags: &mut Vec<Diagnostic>,
                     reference: &AttachmentReference,
                     kind: UsageKind| {
        if reference.is_unused() {
            return;
        }
        if let Some(diag) = validate_attachment_index(reference.attachment, count) {
            diags.push(diag.with_object(render_pass));
            return;
        }
        let newly_classified = !analyzer.has_kind(reference.attachment, kind);
        if let Some(diag) = analyzer.add_use(reference.attachment, kind, reference.layout) {
            diags.push(diag.with_object(render_pass));
        }
        if newly_classified && kind != UsageKind::Preserve {
            let format = model.attachments()[reference.attachment as usize].format;
            if !caps.supports_attachment_usage(format, kind) {
                diags.push(
                    Diagnostic::error(
                        ids::ATTACHMENT_FORMAT_UNSUPPORTED,
                        format!(
                            "attachment {} has format {format} which does not support {} usage",
                            reference.attachment,
                            kind.name()
                        ),
                    )
                    .with_object(render_pass),
                );
            }
        }
    };

    for subpass in model.subpasses() {
        for r in &subpass.input_attachments {
            visit(&mut analyzer, &mut diags, r, UsageKind::Input);
        }
        for r in &subpass.color_attachments {
            visit(&mut analyzer, &mut diags, r, UsageKind::Color);
        }
        for r in &subpass.resolve_attachments {
            visit(&mut analyzer, &mut diags, r, UsageKind::Resolve);
        }
        if let Some(r) = &subpass.depth_stencil_attachment {
            visit(&mut analyzer, &mut diags, r, UsageKind::Depth);
        }
        for &index in &subpass.preserve_attachments {
            if let Some(diag) = validate_attachment_index(index, count) {
                diags.push(diag.with_object(render_pass));
                continue;
            }
            // Preserve carries no layout; record it as layout 0 throughout.
            if let Some(diag) = analyzer.add_use(index, UsageKind::Preserve, 0) {
                diags.push(diag.with_object(render_pass));
            }
        }
    }

    (analyzer, diags)
}

/// Probably-unintended load-op findings, one per attachment.
pub fn load_op_heuristics(
    model: &RenderPassModel,
    analyzer: &AttachmentUsageAnalyzer,
    render_pass: ObjectHandle,
) -> Vec<Diagnostic> {
    let load = vk::AttachmentLoadOp::LOAD.as_raw();
    let clear = vk::AttachmentLoadOp::CLEAR.as_raw();
    let undefined = vk::ImageLayout::UNDEFINED.as_raw();

    let mut diags = Vec::new();
    for (index, attachment) in model.attachments().iter().enumerate() {
        let loads = attachment.load_op == load || attachment.stencil_load_op == load;
        if loads && attachment.initial_layout == undefined {
            diags.push(
                Diagnostic::warning(
                    ids::LOAD_READS_UNDEFINED,
                    format!(
                        "attachment {index} uses LOAD_OP_LOAD with initial layout UNDEFINED; the loaded contents are undefined"
                    ),
                )
                .with_object(render_pass),
            );
        }

        if attachment.load_op == clear {
            let first_use = analyzer.usage(index as u32).and_then(|u| u.first_use());
            if matches!(first_use, Some(UsageKind::Input | UsageKind::Preserve)) {
                diags.push(
                    Diagnostic::warning(
                        ids::CLEAR_NEVER_WRITTEN,
                        format!(
                            "attachment {index} is cleared but its first use is read-only; the clear is likely unintended"
                        ),
                    )
                    .with_object(render_pass),
                );
            }
        }
    }
    diags
}
