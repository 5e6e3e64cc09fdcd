//! Structural render pass compatibility, framebuffer binding, and
//! secondary command buffer inheritance.

use ash::vk;
use vkguard_core::compatibility::check_compatibility;
use vkguard_core::lifecycle::{RecordingContext, SubpassContents};
use vkguard_core::{ValidationConfig, ValidationContext};
use vkguard_types::diagnostic::ids;
use vkguard_types::render_pass::{
    AttachmentDescription, AttachmentReference, FramebufferDescription, RenderPassDescription2,
    SubpassDependency, SubpassDescription,
};
use vkguard_types::{ObjectHandle, ObjectKind};

fn attachment(format: vk::Format) -> AttachmentDescription {
    AttachmentDescription {
        flags: 0,
        format: format.as_raw(),
        samples: vk::SampleCountFlags::TYPE_1.as_raw(),
        load_op: vk::AttachmentLoadOp::DONT_CARE.as_raw(),
        store_op: vk::AttachmentStoreOp::STORE.as_raw(),
        stencil_load_op: vk::AttachmentLoadOp::DONT_CARE.as_raw(),
        stencil_store_op: vk::AttachmentStoreOp::DONT_CARE.as_raw(),
        initial_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL.as_raw(),
        final_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL.as_raw(),
    }
}

fn color_pass(format: vk::Format) -> RenderPassDescription2 {
    RenderPassDescription2 {
        attachments: vec![attachment(format)],
        subpasses: vec![SubpassDescription {
            flags: 0,
            pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS.as_raw(),
            view_mask: 0,
            input_attachments: Vec::new(),
            color_attachments: vec![AttachmentReference {
                attachment: 0,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL.as_raw(),
                aspect_mask: 0,
            }],
            resolve_attachments: Vec::new(),
            depth_stencil_attachment: None,
            preserve_attachments: Vec::new(),
            fragment_shading_rate: None,
        }],
        ..Default::default()
    }
}

fn framebuffer_for(
    ctx: &ValidationContext,
    render_pass: ObjectHandle,
    attachments: Vec<ObjectHandle>,
) -> ObjectHandle {
    let (fb, diags) = ctx.create_framebuffer(FramebufferDescription {
        render_pass,
        attachments,
        width: 64,
        height: 64,
        layers: 1,
    });
    assert!(diags.is_empty(), "unexpected framebuffer findings: {diags:?}");
    fb
}

#[test]
fn a_render_pass_is_compatible_with_itself() {
    let ctx = ValidationContext::new(ValidationConfig::default());
    let (handle, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));
    let model = match ctx.store().render_pass(handle) {
        Some(m) => m,
        None => panic!("expected model for {handle:?}"),
    };

    assert!(check_compatibility(&model, &model).is_empty());
}

#[test]
fn independently_created_identical_passes_are_compatible() {
    let ctx = ValidationContext::new(ValidationConfig::default());
    let (a, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));
    let (b, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));

    let ma = ctx.store().render_pass(a).expect("model a");
    let mb = ctx.store().render_pass(b).expect("model b");
    assert!(check_compatibility(&ma, &mb).is_empty());
}

#[test]
fn differing_formats_are_reported_positionally() {
    let ctx = ValidationContext::new(ValidationConfig::default());
    let (a, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));
    let (b, _) = ctx.create_render_pass(color_pass(vk::Format::B8G8R8A8_UNORM));

    let ma = ctx.store().render_pass(a).expect("model a");
    let mb = ctx.store().render_pass(b).expect("model b");
    let mismatches = check_compatibility(&ma, &mb);

    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].subpass, Some(0));
    assert_eq!(mismatches[0].slot, Some(0));
    assert_eq!(mismatches[0].field, "color attachment");
}

#[test]
fn unused_slot_only_matches_another_unused_slot() {
    let mut with_unused = color_pass(vk::Format::R8G8B8A8_UNORM);
    with_unused.subpasses[0].color_attachments[0] = AttachmentReference::unused();

    let ctx = ValidationContext::new(ValidationConfig::default());
    let (a, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));
    let (b, _) = ctx.create_render_pass(with_unused.clone());
    let (c, _) = ctx.create_render_pass(with_unused);

    let ma = ctx.store().render_pass(a).expect("model a");
    let mb = ctx.store().render_pass(b).expect("model b");
    let mc = ctx.store().render_pass(c).expect("model c");

    assert_eq!(check_compatibility(&ma, &mb).len(), 1);
    assert!(check_compatibility(&mb, &mc).is_empty());
}

#[test]
fn view_masks_matter_when_either_is_non_zero() {
    let mut multiview = color_pass(vk::Format::R8G8B8A8_UNORM);
    multiview.subpasses[0].view_mask = 0b11;

    let ctx = ValidationContext::new(ValidationConfig::default());
    let (a, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));
    let (b, _) = ctx.create_render_pass(multiview);

    let ma = ctx.store().render_pass(a).expect("model a");
    let mb = ctx.store().render_pass(b).expect("model b");
    let mismatches = check_compatibility(&ma, &mb);
    assert!(mismatches.iter().any(|m| m.field == "view mask"));
}

#[test]
fn correlated_view_masks_must_agree() {
    let mut correlated = color_pass(vk::Format::R8G8B8A8_UNORM);
    correlated.correlated_view_masks = vec![0b11];

    let ctx = ValidationContext::new(ValidationConfig::default());
    let (a, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));
    let (b, _) = ctx.create_render_pass(correlated);

    let ma = ctx.store().render_pass(a).expect("model a");
    let mb = ctx.store().render_pass(b).expect("model b");
    assert!(check_compatibility(&ma, &mb)
        .iter()
        .any(|m| m.field == "correlated view masks"));
}

#[test]
fn dependencies_are_compared_only_when_counts_match() {
    let dep = SubpassDependency {
        src_subpass: vkguard_types::render_pass::SUBPASS_EXTERNAL,
        dst_subpass: 0,
        src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT.as_raw(),
        dst_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT.as_raw(),
        src_access_mask: 0,
        dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE.as_raw(),
        dependency_flags: 0,
        view_offset: 0,
    };

    let mut with_dep = color_pass(vk::Format::R8G8B8A8_UNORM);
    with_dep.dependencies = vec![dep];
    let mut with_other_dep = with_dep.clone();
    with_other_dep.dependencies[0].dst_access_mask = 0;

    let ctx = ValidationContext::new(ValidationConfig::default());
    let (plain, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));
    let (a, _) = ctx.create_render_pass(with_dep);
    let (b, _) = ctx.create_render_pass(with_other_dep);

    let mp = ctx.store().render_pass(plain).expect("model");
    let ma = ctx.store().render_pass(a).expect("model");
    let mb = ctx.store().render_pass(b).expect("model");

    // Different counts: dependencies are not compared at all.
    assert!(check_compatibility(&mp, &ma).is_empty());
    // Same count, different masks: one mismatch.
    assert!(check_compatibility(&ma, &mb)
        .iter()
        .any(|m| m.field == "subpass dependency"));
}

#[test]
fn binding_a_framebuffer_to_a_compatible_pass_is_clean() {
    let ctx = ValidationContext::new(ValidationConfig::default());
    let (created_against, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));
    let (bound_to, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));

    let view = ctx.track_object(ObjectKind::ImageView, &[]);
    let fb = framebuffer_for(&ctx, created_against, vec![view]);

    let cb = ctx.track_object(ObjectKind::CommandBuffer, &[]);
    let mut rec = RecordingContext::new(cb);
    let diags = ctx.begin_render_pass(&mut rec, bound_to, fb, 0, SubpassContents::Inline);
    assert!(diags.is_empty(), "unexpected findings: {diags:?}");
}

#[test]
fn binding_a_framebuffer_to_an_incompatible_pass_is_reported() {
    let ctx = ValidationContext::new(ValidationConfig::default());
    let (created_against, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));
    let (bound_to, _) = ctx.create_render_pass(color_pass(vk::Format::B8G8R8A8_UNORM));

    let view = ctx.track_object(ObjectKind::ImageView, &[]);
    let fb = framebuffer_for(&ctx, created_against, vec![view]);

    let cb = ctx.track_object(ObjectKind::CommandBuffer, &[]);
    let mut rec = RecordingContext::new(cb);
    let diags = ctx.begin_render_pass(&mut rec, bound_to, fb, 0, SubpassContents::Inline);
    assert_eq!(
        diags
            .iter()
            .filter(|d| d.id == ids::RENDER_PASS_INCOMPATIBLE)
            .count(),
        1
    );
}

#[test]
fn inherited_state_is_checked_against_the_active_pass() {
    let ctx = ValidationContext::new(ValidationConfig::default());
    let (primary_rp, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));
    let (inherited_ok, _) = ctx.create_render_pass(color_pass(vk::Format::R8G8B8A8_UNORM));
    let (inherited_bad, _) = ctx.create_render_pass(color_pass(vk::Format::B8G8R8A8_UNORM));

    let view = ctx.track_object(ObjectKind::ImageView, &[]);
    let fb = framebuffer_for(&ctx, primary_rp, vec![view]);

    let cb = ctx.track_object(ObjectKind::CommandBuffer, &[]);
    let mut rec = RecordingContext::new(cb);
    let diags = ctx.begin_render_pass(
        &mut rec,
        primary_rp,
        fb,
        0,
        SubpassContents::SecondaryCommandBuffers,
    );
    assert!(diags.is_empty());

    assert!(ctx.validate_inheritance(&rec, inherited_ok, 0).is_empty());

    let diags = ctx.validate_inheritance(&rec, inherited_bad, 0);
    assert!(diags.iter().any(|d| d.id == ids::RENDER_PASS_INCOMPATIBLE));

    let diags = ctx.validate_inheritance(&rec, inherited_ok, 1);
    assert!(diags.iter().any(|d| d.id == ids::INHERITANCE_SUBPASS_MISMATCH));
}
