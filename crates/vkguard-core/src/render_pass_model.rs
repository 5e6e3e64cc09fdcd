//! Frozen render pass model.

use vkguard_types::render_pass::{
    AttachmentDescription, AttachmentReference, RenderPassDescription, RenderPassDescription2,
    SubpassDependency, SubpassDescription,
};

/// Canonical, immutable representation of a render pass. Built once at
/// creation time from either creation-info shape; every validator reads this
/// and nothing else.
pub struct RenderPassModel {
    desc: RenderPassDescription2,
}

impl RenderPassModel {
    /// Freeze a canonical description.
    pub fn new(desc: RenderPassDescription2) -> Self {
        Self { desc }
    }

    /// Upgrade a legacy creation info and freeze it. The single place the
    /// first-version shape is handled.
    pub fn from_legacy(legacy: &RenderPassDescription) -> Self {
        Self::new(RenderPassDescription2::from_legacy(legacy))
    }

    pub fn attachments(&self) -> &[AttachmentDescription] {
        &self.desc.attachments
    }

    pub fn subpasses(&self) -> &[SubpassDescription] {
        &self.desc.subpasses
    }

    pub fn dependencies(&self) -> &[SubpassDependency] {
        &self.desc.dependencies
    }

    pub fn correlated_view_masks(&self) -> &[u32] {
        &self.desc.correlated_view_masks
    }

    pub fn fragment_density_map(&self) -> Option<&AttachmentReference> {
        self.desc.fragment_density_map.as_ref()
    }

    pub fn flags(&self) -> u32 {
        self.desc.flags
    }

    pub fn attachment_count(&self) -> usize {
        self.desc.attachments.len()
    }

    pub fn subpass_count(&self) -> usize {
        self.desc.subpasses.len()
    }

    /// Resolve a reference to its attachment description, or `None` if the
    /// slot is unused or the index is out of range (reported elsewhere).
    pub fn resolve(&self, reference: &AttachmentReference) -> Option<&AttachmentDescription> {
        if reference.is_unused() {
            return None;
        }
        self.desc.attachments.get(reference.attachment as usize)
    }

    pub fn description(&self) -> &RenderPassDescription2 {
        &self.desc
    }
}
