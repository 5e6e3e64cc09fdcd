//! Legacy <-> canonical render pass description conversion.
//!
//! Field values here are raw Vulkan numeric values, written as literals so
//! the crate stays free of any Vulkan binding.

use vkguard_types::render_pass::{
    AttachmentDescription, AttachmentReference, FragmentShadingRateAttachment,
    LegacyAttachmentReference, LegacySubpassDependency, LegacySubpassDescription, MultiviewInfo,
    RenderPassDescription, RenderPassDescription2, SubpassDependency, SubpassDescription,
    SUBPASS_EXTERNAL,
};
use vkguard_types::DescriptionError;

const FORMAT_R8G8B8A8_UNORM: i32 = 37;
const LAYOUT_COLOR_ATTACHMENT_OPTIMAL: i32 = 2;
const LAYOUT_SHADER_READ_ONLY_OPTIMAL: i32 = 5;
const BIND_POINT_GRAPHICS: i32 = 0;
const LOAD_OP_CLEAR: i32 = 1;
const STORE_OP_STORE: i32 = 0;

fn attachment() -> AttachmentDescription {
    AttachmentDescription {
        flags: 0,
        format: FORMAT_R8G8B8A8_UNORM,
        samples: 1,
        load_op: LOAD_OP_CLEAR,
        store_op: STORE_OP_STORE,
        stencil_load_op: 2,
        stencil_store_op: 1,
        initial_layout: 0,
        final_layout: LAYOUT_SHADER_READ_ONLY_OPTIMAL,
    }
}

fn legacy_two_subpass() -> RenderPassDescription {
    RenderPassDescription {
        flags: 0,
        attachments: vec![attachment(), attachment()],
        subpasses: vec![
            LegacySubpassDescription {
                flags: 0,
                pipeline_bind_point: BIND_POINT_GRAPHICS,
                input_attachments: Vec::new(),
                color_attachments: vec![LegacyAttachmentReference {
                    attachment: 0,
                    layout: LAYOUT_COLOR_ATTACHMENT_OPTIMAL,
                }],
                resolve_attachments: Vec::new(),
                depth_stencil_attachment: None,
                preserve_attachments: vec![1],
            },
            LegacySubpassDescription {
                flags: 0,
                pipeline_bind_point: BIND_POINT_GRAPHICS,
                input_attachments: vec![LegacyAttachmentReference {
                    attachment: 0,
                    layout: LAYOUT_SHADER_READ_ONLY_OPTIMAL,
                }],
                color_attachments: vec![LegacyAttachmentReference {
                    attachment: 1,
                    layout: LAYOUT_COLOR_ATTACHMENT_OPTIMAL,
                }],
                resolve_attachments: Vec::new(),
                depth_stencil_attachment: None,
                preserve_attachments: Vec::new(),
            },
        ],
        dependencies: vec![
            LegacySubpassDependency {
                src_subpass: SUBPASS_EXTERNAL,
                dst_subpass: 0,
                src_stage_mask: 0x1,
                dst_stage_mask: 0x400,
                src_access_mask: 0,
                dst_access_mask: 0x100,
                dependency_flags: 0,
            },
            LegacySubpassDependency {
                src_subpass: 0,
                dst_subpass: 1,
                src_stage_mask: 0x400,
                dst_stage_mask: 0x80,
                src_access_mask: 0x100,
                dst_access_mask: 0x20,
                dependency_flags: 0x1,
            },
        ],
        multiview: None,
    }
}

#[test]
fn upgrade_preserves_counts_and_field_values() {
    let legacy = legacy_two_subpass();
    let rp2 = RenderPassDescription2::from_legacy(&legacy);

    assert_eq!(rp2.attachments, legacy.attachments);
    assert_eq!(rp2.subpasses.len(), 2);
    assert_eq!(rp2.dependencies.len(), 2);

    let sp0 = &rp2.subpasses[0];
    assert_eq!(sp0.view_mask, 0);
    assert_eq!(sp0.color_attachments.len(), 1);
    assert_eq!(sp0.color_attachments[0].attachment, 0);
    assert_eq!(sp0.color_attachments[0].layout, LAYOUT_COLOR_ATTACHMENT_OPTIMAL);
    assert_eq!(sp0.color_attachments[0].aspect_mask, 0, "legacy refs carry no aspect");
    assert_eq!(sp0.preserve_attachments, vec![1]);
    assert!(sp0.fragment_shading_rate.is_none());

    let sp1 = &rp2.subpasses[1];
    assert_eq!(sp1.input_attachments[0].layout, LAYOUT_SHADER_READ_ONLY_OPTIMAL);

    let dep = &rp2.dependencies[1];
    assert_eq!(dep.src_subpass, 0);
    assert_eq!(dep.dst_subpass, 1);
    assert_eq!(dep.dependency_flags, 0x1);
    assert_eq!(dep.view_offset, 0);

    assert!(rp2.correlated_view_masks.is_empty());
    assert!(rp2.fragment_density_map.is_none());
}

#[test]
fn upgrade_folds_the_multiview_extension_block() {
    let mut legacy = legacy_two_subpass();
    legacy.multiview = Some(MultiviewInfo {
        view_masks: vec![0b11, 0b01],
        view_offsets: vec![0, 1],
        correlation_masks: vec![0b11],
    });

    let rp2 = RenderPassDescription2::from_legacy(&legacy);
    assert_eq!(rp2.subpasses[0].view_mask, 0b11);
    assert_eq!(rp2.subpasses[1].view_mask, 0b01);
    assert_eq!(rp2.dependencies[0].view_offset, 0);
    assert_eq!(rp2.dependencies[1].view_offset, 1);
    assert_eq!(rp2.correlated_view_masks, vec![0b11]);
}

#[test]
fn upgrade_tolerates_a_short_multiview_block() {
    let mut legacy = legacy_two_subpass();
    // Blocks shorter than the subpass/dependency lists read as zero.
    legacy.multiview = Some(MultiviewInfo {
        view_masks: vec![0b01],
        view_offsets: Vec::new(),
        correlation_masks: Vec::new(),
    });

    let rp2 = RenderPassDescription2::from_legacy(&legacy);
    assert_eq!(rp2.subpasses[0].view_mask, 0b01);
    assert_eq!(rp2.subpasses[1].view_mask, 0);
    assert_eq!(rp2.dependencies[0].view_offset, 0);
}

#[test]
fn representable_descriptions_round_trip() {
    let mut legacy = legacy_two_subpass();
    legacy.multiview = Some(MultiviewInfo {
        view_masks: vec![0b11, 0b11],
        view_offsets: vec![0, 1],
        correlation_masks: vec![0b11],
    });

    let rp2 = RenderPassDescription2::from_legacy(&legacy);
    let down = match rp2.to_legacy() {
        Ok(down) => down,
        Err(e) => panic!("expected a representable description, got {e}"),
    };
    assert_eq!(RenderPassDescription2::from_legacy(&down), rp2);
}

#[test]
fn downgrade_without_multiview_state_emits_no_extension_block() {
    let rp2 = RenderPassDescription2::from_legacy(&legacy_two_subpass());
    let down = match rp2.to_legacy() {
        Ok(down) => down,
        Err(e) => panic!("expected a representable description, got {e}"),
    };
    assert!(down.multiview.is_none());
}

#[test]
fn fragment_density_map_is_not_legacy_representable() {
    let mut rp2 = RenderPassDescription2::from_legacy(&legacy_two_subpass());
    rp2.fragment_density_map = Some(AttachmentReference {
        attachment: 0,
        layout: LAYOUT_SHADER_READ_ONLY_OPTIMAL,
        aspect_mask: 0,
    });

    match rp2.to_legacy() {
        Err(DescriptionError::NotLegacyRepresentable(what)) => {
            assert!(what.contains("density"), "unexpected detail: {what}");
        }
        other => panic!("expected NotLegacyRepresentable, got {other:?}"),
    }
}

#[test]
fn fragment_shading_rate_is_not_legacy_representable() {
    let mut rp2 = RenderPassDescription2::from_legacy(&legacy_two_subpass());
    rp2.subpasses[1].fragment_shading_rate = Some(FragmentShadingRateAttachment {
        attachment: AttachmentReference {
            attachment: 1,
            layout: LAYOUT_SHADER_READ_ONLY_OPTIMAL,
            aspect_mask: 0,
        },
        texel_width: 16,
        texel_height: 16,
    });

    match rp2.to_legacy() {
        Err(DescriptionError::NotLegacyRepresentable(what)) => {
            assert!(what.contains("shading rate"), "unexpected detail: {what}");
        }
        other => panic!("expected NotLegacyRepresentable, got {other:?}"),
    }
}

#[test]
fn defaulted_canonical_description_is_empty_and_representable() {
    let rp2 = RenderPassDescription2::default();
    assert!(rp2.attachments.is_empty());
    assert!(rp2.subpasses.is_empty());
    let down = match rp2.to_legacy() {
        Ok(down) => down,
        Err(e) => panic!("expected a representable description, got {e}"),
    };
    assert_eq!(down, RenderPassDescription::default());
}

// Keep the unused-subpass helpers exercised so the shapes stay honest.
#[test]
fn unused_reference_sentinels() {
    let r = AttachmentReference::unused();
    assert!(r.is_unused());
    let used = AttachmentReference {
        attachment: 0,
        layout: LAYOUT_COLOR_ATTACHMENT_OPTIMAL,
        aspect_mask: 0,
    };
    assert!(!used.is_unused());

    let dep = SubpassDependency {
        src_subpass: SUBPASS_EXTERNAL,
        dst_subpass: 0,
        src_stage_mask: 0,
        dst_stage_mask: 0,
        src_access_mask: 0,
        dst_access_mask: 0,
        dependency_flags: 0,
        view_offset: 0,
    };
    assert_eq!(dep.src_subpass, u32::MAX);

    let sp = SubpassDescription {
        flags: 0,
        pipeline_bind_point: BIND_POINT_GRAPHICS,
        view_mask: 0,
        input_attachments: Vec::new(),
        color_attachments: vec![r],
        resolve_attachments: Vec::new(),
        depth_stencil_attachment: None,
        preserve_attachments: Vec::new(),
        fragment_shading_rate: None,
    };
    assert!(sp.color_attachments[0].is_unused());
}
