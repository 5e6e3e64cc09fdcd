//! Structural compatibility between two independently created render passes.
//!
//! Used when a framebuffer built against one render pass is bound with
//! another, and when a secondary command buffer's inherited render pass is
//! matched against the primary's active one. The check is total: every
//! mismatch is recorded with enough position to report individually, and
//! `check(x, x)` is always empty.

use vkguard_types::diagnostic::ids;
use vkguard_types::render_pass::AttachmentReference;
use vkguard_types::{Diagnostic, ObjectHandle};

use crate::render_pass_model::RenderPassModel;

/// One structural difference between two render passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Subpass position, when the difference is inside a subpass
    pub subpass: Option<u32>,
    /// Attachment slot within the offending reference list
    pub slot: Option<u32>,
    /// Which field disagreed
    pub field: &'static str,
    pub detail: String,
}

impl Mismatch {
    fn global(field: &'static str, detail: String) -> Self {
        Self {
            subpass: None,
            slot: None,
            field,
            detail,
        }
    }

    fn in_subpass(subpass: u32, field: &'static str, detail: String) -> Self {
        Self {
            subpass: Some(subpass),
            slot: None,
            field,
            detail,
        }
    }

    fn at_slot(subpass: u32, slot: u32, field: &'static str, detail: String) -> Self {
        Self {
            subpass: Some(subpass),
            slot: Some(slot),
            field,
            detail,
        }
    }

    /// Render as a diagnostic against the objects being matched.
    pub fn into_diagnostic(self, objects: &[ObjectHandle]) -> Diagnostic {
        let position = match (self.subpass, self.slot) {
            (Some(sp), Some(slot)) => format!("subpass {sp}, slot {slot}: "),
            (Some(sp), None) => format!("subpass {sp}: "),
            _ => String::new(),
        };
        let mut diag = Diagnostic::error(
            ids::RENDER_PASS_INCOMPATIBLE,
            format!("{position}{} mismatch: {}", self.field, self.detail),
        );
        diag.objects.extend_from_slice(objects);
        diag
    }
}

/// Accumulate every structural difference between `a` and `b`.
pub fn check_compatibility(a: &RenderPassModel, b: &RenderPassModel) -> Vec<Mismatch> {
    let mut out = Vec::new();

    if a.subpass_count() != b.subpass_count() {
        out.push(Mismatch::global(
            "subpass count",
            format!("{} vs {}", a.subpass_count(), b.subpass_count()),
        ));
    }

    let common = a.subpass_count().min(b.subpass_count());
    for index in 0..common {
        compare_subpass(a, b, index as u32, &mut out);
    }

    compare_dependencies(a, b, &mut out);

    if a.correlated_view_masks() != b.correlated_view_masks() {
        out.push(Mismatch::global(
            "correlated view masks",
            format!(
                "{:?} vs {:?}",
                a.correlated_view_masks(),
                b.correlated_view_masks()
            ),
        ));
    }

    match (a.fragment_density_map(), b.fragment_density_map()) {
        (None, None) => {}
        (Some(ra), Some(rb)) => {
            compare_reference_pair(a, b, ra, rb, None, 0, "fragment density map", &mut out);
        }
        _ => out.push(Mismatch::global(
            "fragment density map",
            "present in only one render pass".to_string(),
        )),
    }

    out
}

fn compare_subpass(a: &RenderPassModel, b: &RenderPassModel, index: u32, out: &mut Vec<Mismatch>) {
    let sa = &a.subpasses()[index as usize];
    let sb = &b.subpasses()[index as usize];

    if sa.flags != sb.flags {
        out.push(Mismatch::in_subpass(
            index,
            "subpass flags",
            format!("{:#x} vs {:#x}", sa.flags, sb.flags),
        ));
    }
    if (sa.view_mask != 0 || sb.view_mask != 0) && sa.view_mask != sb.view_mask {
        out.push(Mismatch::in_subpass(
            index,
            "view mask",
            format!("{:#b} vs {:#b}", sa.view_mask, sb.view_mask),
        ));
    }

    compare_reference_list(a, b, &sa.input_attachments, &sb.input_attachments, index, "input attachment", out);
    compare_reference_list(a, b, &sa.color_attachments, &sb.color_attachments, index, "color attachment", out);
    compare_reference_list(a, b, &sa.resolve_attachments, &sb.resolve_attachments, index, "resolve attachment", out);

    let unused = AttachmentReference::unused();
    let da = sa.depth_stencil_attachment.as_ref().unwrap_or(&unused);
    let db = sb.depth_stencil_attachment.as_ref().unwrap_or(&unused);
    compare_reference_pair(a, b, da, db, Some(index), 0, "depth-stencil attachment", out);

    match (&sa.fragment_shading_rate, &sb.fragment_shading_rate) {
        (None, None) => {}
        (Some(fa), Some(fb)) => {
            if (fa.texel_width, fa.texel_height) != (fb.texel_width, fb.texel_height) {
                out.push(Mismatch::in_subpass(
                    index,
                    "fragment shading rate texel size",
                    format!(
                        "{}x{} vs {}x{}",
                        fa.texel_width, fa.texel_height, fb.texel_width, fb.texel_height
                    ),
                ));
            }
            compare_reference_pair(
                a, b, &fa.attachment, &fb.attachment, Some(index), 0,
                "fragment shading rate attachment", out,
            );
        }
        _ => out.push(Mismatch::in_subpass(
            index,
            "fragment shading rate attachment",
            "present in only one subpass".to_string(),
        )),
    }
}

fn compare_reference_list(
    a: &RenderPassModel,
    b: &RenderPassModel,
    la: &[AttachmentReference],
    lb: &[AttachmentReference],
    subpass: u32,
    field: &'static str,
    out: &mut Vec<Mismatch>,
) {
    if la.len() != lb.len() {
        out.push(Mismatch::in_subpass(
            subpass,
            field,
            format!("count {} vs {}", la.len(), lb.len()),
        ));
    }
    for (slot, (ra, rb)) in la.iter().zip(lb.iter()).enumerate() {
        compare_reference_pair(a, b, ra, rb, Some(subpass), slot as u32, field, out);
    }
}

/// Two references at the same position are compatible when both are unused,
/// or when the attachments they name agree on format, sample count, and
/// attachment flags. Out-of-range indices were reported at creation and are
/// skipped here.
fn compare_reference_pair(
    a: &RenderPassModel,
    b: &RenderPassModel,
    ra: &AttachmentReference,
    rb: &AttachmentReference,
    subpass: Option<u32>,
    slot: u32,
    field: &'static str,
    out: &mut Vec<Mismatch>,
) {
    let mismatch = |field: &'static str, detail: String| match subpass {
        Some(sp) => Mismatch::at_slot(sp, slot, field, detail),
        None => Mismatch::global(field, detail),
    };

    match (ra.is_unused(), rb.is_unused()) {
        (true, true) => {}
        (true, false) | (false, true) => {
            out.push(mismatch(field, "unused slot paired with a used slot".to_string()));
        }
        (false, false) => {
            let (Some(da), Some(db)) = (a.resolve(ra), b.resolve(rb)) else {
                return;
            };
            if da.format != db.format {
                out.push(mismatch(field, format!("format {} vs {}", da.format, db.format)));
            }
            if da.samples != db.samples {
                out.push(mismatch(
                    field,
                    format!("sample count {} vs {}", da.samples, db.samples),
                ));
            }
            if da.flags != db.flags {
                out.push(mismatch(
                    field,
                    format!("attachment flags {:#x} vs {:#x}", da.flags, db.flags),
                ));
            }
        }
    }
}

/// Dependencies are compared element-wise only when the counts agree;
/// differing counts are not themselves a mismatch.
fn compare_dependencies(a: &RenderPassModel, b: &RenderPassModel, out: &mut Vec<Mismatch>) {
    let da = a.dependencies();
    let db = b.dependencies();
    if da.len() != db.len() {
        return;
    }
    for (index, (xa, xb)) in da.iter().zip(db.iter()).enumerate() {
        if xa != xb {
            out.push(Mismatch::global(
                "subpass dependency",
                format!("dependency {index} differs: {xa:?} vs {xb:?}"),
            ));
        }
    }
}
