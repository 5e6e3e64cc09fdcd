//! Render pass description shapes.
//!
//! Field values are the raw Vulkan numeric values (`VkFormat` as `i32`,
//! layouts as `i32`, flag and stage masks as `u32`), captured at the API
//! boundary the same way the interposition layer serializes create-info
//! structs. Two shapes exist: the legacy first-version creation info and the
//! canonical one. Everything downstream of [`RenderPassDescription2`] is
//! version-agnostic -- the legacy shape is upgraded once via
//! [`RenderPassDescription2::from_legacy`] and never consulted again.

use serde::{Deserialize, Serialize};

use crate::error::DescriptionError;
use crate::handle::ObjectHandle;

/// Sentinel meaning "this slot references no attachment".
pub const ATTACHMENT_UNUSED: u32 = u32::MAX;

/// Sentinel subpass index meaning "outside the render pass".
pub const SUBPASS_EXTERNAL: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDescription {
    pub flags: u32,
    pub format: i32,
    pub samples: u32,
    pub load_op: i32,
    pub store_op: i32,
    pub stencil_load_op: i32,
    pub stencil_store_op: i32,
    pub initial_layout: i32,
    pub final_layout: i32,
}

/// Canonical attachment reference. `aspect_mask` is zero when the source
/// shape carried none (legacy references have no aspect field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentReference {
    pub attachment: u32,
    pub layout: i32,
    pub aspect_mask: u32,
}

impl AttachmentReference {
    pub fn unused() -> Self {
        Self {
            attachment: ATTACHMENT_UNUSED,
            layout: 0,
            aspect_mask: 0,
        }
    }

    pub fn is_unused(&self) -> bool {
        self.attachment == ATTACHMENT_UNUSED
    }
}

/// Fragment-shading-rate attachment for one subpass, with its texel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentShadingRateAttachment {
    pub attachment: AttachmentReference,
    pub texel_width: u32,
    pub texel_height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubpassDescription {
    pub flags: u32,
    pub pipeline_bind_point: i32,
    /// Multiview mask; zero when multiview is not in use
    pub view_mask: u32,
    pub input_attachments: Vec<AttachmentReference>,
    pub color_attachments: Vec<AttachmentReference>,
    /// Either empty or the same length as `color_attachments`
    pub resolve_attachments: Vec<AttachmentReference>,
    pub depth_stencil_attachment: Option<AttachmentReference>,
    pub preserve_attachments: Vec<u32>,
    pub fragment_shading_rate: Option<FragmentShadingRateAttachment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage_mask: u32,
    pub dst_stage_mask: u32,
    pub src_access_mask: u32,
    pub dst_access_mask: u32,
    pub dependency_flags: u32,
    /// Only meaningful for view-local dependencies; zero otherwise
    pub view_offset: i32,
}

/// Canonical, version-agnostic render pass description. All validators
/// consume this shape and never branch on which creation path produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RenderPassDescription2 {
    pub flags: u32,
    pub attachments: Vec<AttachmentDescription>,
    pub subpasses: Vec<SubpassDescription>,
    pub dependencies: Vec<SubpassDependency>,
    pub correlated_view_masks: Vec<u32>,
    /// Fragment-density-map attachment, when the extension block was present
    pub fragment_density_map: Option<AttachmentReference>,
}

// ── Legacy (first-version) shape ─────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyAttachmentReference {
    pub attachment: u32,
    pub layout: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySubpassDescription {
    pub flags: u32,
    pub pipeline_bind_point: i32,
    pub input_attachments: Vec<LegacyAttachmentReference>,
    pub color_attachments: Vec<LegacyAttachmentReference>,
    pub resolve_attachments: Vec<LegacyAttachmentReference>,
    pub depth_stencil_attachment: Option<LegacyAttachmentReference>,
    pub preserve_attachments: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage_mask: u32,
    pub dst_stage_mask: u32,
    pub src_access_mask: u32,
    pub dst_access_mask: u32,
    pub dependency_flags: u32,
}

/// Multiview extension block attached to a legacy creation info. Indexing
/// follows the extension contract: `view_masks[i]` belongs to subpass `i`,
/// `view_offsets[j]` to dependency `j`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MultiviewInfo {
    pub view_masks: Vec<u32>,
    pub view_offsets: Vec<i32>,
    pub correlation_masks: Vec<u32>,
}

/// Legacy render pass creation info plus its optional extension blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RenderPassDescription {
    pub flags: u32,
    pub attachments: Vec<AttachmentDescription>,
    pub subpasses: Vec<LegacySubpassDescription>,
    pub dependencies: Vec<LegacySubpassDependency>,
    pub multiview: Option<MultiviewInfo>,
}

impl From<LegacyAttachmentReference> for AttachmentReference {
    fn from(r: LegacyAttachmentReference) -> Self {
        Self {
            attachment: r.attachment,
            layout: r.layout,
            aspect_mask: 0,
        }
    }
}

impl RenderPassDescription2 {
    /// Upgrade a legacy creation info into the canonical shape.
    /// Counts and field values are preserved bit-for-bit; the multiview
    /// extension block is folded into the per-subpass/per-dependency fields.
    pub fn from_legacy(legacy: &RenderPassDescription) -> Self {
        let mv = legacy.multiview.as_ref();

        let subpasses = legacy
            .subpasses
            .iter()
            .enumerate()
            .map(|(i, sp)| SubpassDescription {
                flags: sp.flags,
                pipeline_bind_point: sp.pipeline_bind_point,
                view_mask: mv
                    .and_then(|m| m.view_masks.get(i).copied())
                    .unwrap_or(0),
                input_attachments: sp.input_attachments.iter().map(|&r| r.into()).collect(),
                color_attachments: sp.color_attachments.iter().map(|&r| r.into()).collect(),
                resolve_attachments: sp.resolve_attachments.iter().map(|&r| r.into()).collect(),
                depth_stencil_attachment: sp.depth_stencil_attachment.map(Into::into),
                preserve_attachments: sp.preserve_attachments.clone(),
                fragment_shading_rate: None,
            })
            .collect();

        let dependencies = legacy
            .dependencies
            .iter()
            .enumerate()
            .map(|(j, dep)| SubpassDependency {
                src_subpass: dep.src_subpass,
                dst_subpass: dep.dst_subpass,
                src_stage_mask: dep.src_stage_mask,
                dst_stage_mask: dep.dst_stage_mask,
                src_access_mask: dep.src_access_mask,
                dst_access_mask: dep.dst_access_mask,
                dependency_flags: dep.dependency_flags,
                view_offset: mv
                    .and_then(|m| m.view_offsets.get(j).copied())
                    .unwrap_or(0),
            })
            .collect();

        Self {
            flags: legacy.flags,
            attachments: legacy.attachments.clone(),
            subpasses,
            dependencies,
            correlated_view_masks: mv
                .map(|m| m.correlation_masks.clone())
                .unwrap_or_default(),
            fragment_density_map: None,
        }
    }

    /// Downgrade to the legacy shape where representable. Multiview state is
    /// re-emitted as the extension block; canonical-only attachments
    /// (fragment shading rate, fragment density map) have no legacy encoding.
    pub fn to_legacy(&self) -> Result<RenderPassDescription, DescriptionError> {
        if self.fragment_density_map.is_some() {
            return Err(DescriptionError::NotLegacyRepresentable(
                "fragment density map attachment",
            ));
        }
        if self.subpasses.iter().any(|sp| sp.fragment_shading_rate.is_some()) {
            return Err(DescriptionError::NotLegacyRepresentable(
                "fragment shading rate attachment",
            ));
        }

        let downgrade_ref = |r: &AttachmentReference| LegacyAttachmentReference {
            attachment: r.attachment,
            layout: r.layout,
        };

        let subpasses = self
            .subpasses
            .iter()
            .map(|sp| LegacySubpassDescription {
                flags: sp.flags,
                pipeline_bind_point: sp.pipeline_bind_point,
                input_attachments: sp.input_attachments.iter().map(downgrade_ref).collect(),
                color_attachments: sp.color_attachments.iter().map(downgrade_ref).collect(),
                resolve_attachments: sp.resolve_attachments.iter().map(downgrade_ref).collect(),
                depth_stencil_attachment: sp.depth_stencil_attachment.as_ref().map(downgrade_ref),
                preserve_attachments: sp.preserve_attachments.clone(),
            })
            .collect();

        let dependencies = self
            .dependencies
            .iter()
            .map(|dep| LegacySubpassDependency {
                src_subpass: dep.src_subpass,
                dst_subpass: dep.dst_subpass,
                src_stage_mask: dep.src_stage_mask,
                dst_stage_mask: dep.dst_stage_mask,
                src_access_mask: dep.src_access_mask,
                dst_access_mask: dep.dst_access_mask,
                dependency_flags: dep.dependency_flags,
            })
            .collect();

        let has_multiview = self.subpasses.iter().any(|sp| sp.view_mask != 0)
            || self.dependencies.iter().any(|dep| dep.view_offset != 0)
            || !self.correlated_view_masks.is_empty();

        let multiview = has_multiview.then(|| MultiviewInfo {
            view_masks: self.subpasses.iter().map(|sp| sp.view_mask).collect(),
            view_offsets: self.dependencies.iter().map(|dep| dep.view_offset).collect(),
            correlation_masks: self.correlated_view_masks.clone(),
        });

        Ok(RenderPassDescription {
            flags: self.flags,
            attachments: self.attachments.clone(),
            subpasses,
            dependencies,
            multiview,
        })
    }
}

// ── Attachment usage kinds ───────────────────────────────────

/// One way a subpass can use an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsageKind {
    Color,
    Depth,
    Input,
    Preserve,
    Resolve,
}

impl UsageKind {
    pub fn bit(self) -> UsageKinds {
        match self {
            UsageKind::Color => UsageKinds::COLOR,
            UsageKind::Depth => UsageKinds::DEPTH,
            UsageKind::Input => UsageKinds::INPUT,
            UsageKind::Preserve => UsageKinds::PRESERVE,
            UsageKind::Resolve => UsageKinds::RESOLVE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UsageKind::Color => "color",
            UsageKind::Depth => "depth-stencil",
            UsageKind::Input => "input",
            UsageKind::Preserve => "preserve",
            UsageKind::Resolve => "resolve",
        }
    }
}

bitflags::bitflags! {
    /// Accumulated usage kinds of one attachment across a render pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct UsageKinds: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const INPUT = 1 << 2;
        const PRESERVE = 1 << 3;
        const RESOLVE = 1 << 4;
    }
}

// ── Framebuffers ─────────────────────────────────────────────

/// Framebuffer creation info as seen by the validation core: the render pass
/// it was created against and the image views filling its attachment slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramebufferDescription {
    pub render_pass: ObjectHandle,
    pub attachments: Vec<ObjectHandle>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}
