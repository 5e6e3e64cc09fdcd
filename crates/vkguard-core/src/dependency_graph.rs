//! Subpass-dependency DAG validation.
//!
//! Execution order is subpass index order, so any non-external dependency
//! with `src > dst` is a back-edge and would cycle. Stage/access *values*
//! are not judged here beyond the framebuffer-space split; their semantic
//! legality belongs to the API layer.

use ash::vk;
use vkguard_types::diagnostic::ids;
use vkguard_types::render_pass::{SubpassDependency, SUBPASS_EXTERNAL};
use vkguard_types::{Diagnostic, ObjectHandle};

use crate::render_pass_model::RenderPassModel;

/// Stages that operate per-framebuffer-region. A self-dependency mixing
/// these with non-framebuffer-space stages needs a by-region or view-local
/// guarantee to be satisfiable.
fn framebuffer_space_stages() -> vk::PipelineStageFlags {
    vk::PipelineStageFlags::FRAGMENT_SHADER
        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
        | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS
        | vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
}

fn mixes_framebuffer_space(src_stages: u32, dst_stages: u32) -> bool {
    let fb = framebuffer_space_stages();
    let src = vk::PipelineStageFlags::from_raw(src_stages);
    let dst = vk::PipelineStageFlags::from_raw(dst_stages);
    let any_fb = src.intersects(fb) || dst.intersects(fb);
    let any_non_fb = !(src & !fb).is_empty() || !(dst & !fb).is_empty();
    any_fb && any_non_fb
}

/// Validate every dependency of the model against the DAG rules, in
/// priority order, accumulating all findings.
pub fn validate_dependencies(
    model: &RenderPassModel,
    render_pass: ObjectHandle,
) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    for (index, dep) in model.dependencies().iter().enumerate() {
        validate_dependency(index, dep, model, render_pass, &mut diags);
    }
    diags
}

fn validate_dependency(
    index: usize,
    dep: &SubpassDependency,
    model: &RenderPassModel,
    render_pass: ObjectHandle,
    diags: &mut Vec<Diagnostic>,
) {
    let flags = vk::DependencyFlags::from_raw(dep.dependency_flags);
    let view_local = flags.contains(vk::DependencyFlags::VIEW_LOCAL);
    let by_region = flags.contains(vk::DependencyFlags::BY_REGION);
    let src_external = dep.src_subpass == SUBPASS_EXTERNAL;
    let dst_external = dep.dst_subpass == SUBPASS_EXTERNAL;

    // Rule 1: external endpoints.
    if src_external && dst_external {
        diags.push(
            Diagnostic::error(
                ids::DEP_BOTH_EXTERNAL,
                format!("dependency {index} has both src and dst set to SUBPASS_EXTERNAL"),
            )
            .with_object(render_pass),
        );
        return;
    }
    if (src_external || dst_external) && view_local {
        diags.push(
            Diagnostic::error(
                ids::DEP_VIEW_LOCAL_EXTERNAL,
                format!("dependency {index} is view-local but has an external endpoint"),
            )
            .with_object(render_pass),
        );
        return;
    }
    if src_external || dst_external {
        return;
    }

    // Rule 2: non-external edges must not go backwards.
    if dep.src_subpass > dep.dst_subpass {
        diags.push(
            Diagnostic::error(
                ids::DEP_BACK_EDGE,
                format!(
                    "dependency {index} runs from subpass {} back to subpass {}; execution order would cycle",
                    dep.src_subpass, dep.dst_subpass
                ),
            )
            .with_object(render_pass),
        );
        return;
    }

    // Rule 3: self-dependencies.
    if dep.src_subpass == dep.dst_subpass {
        if dep.view_offset != 0 && !view_local {
            diags.push(
                Diagnostic::error(
                    ids::DEP_SELF_VIEW_OFFSET,
                    format!(
                        "self-dependency {index} has view offset {} without the view-local flag",
                        dep.view_offset
                    ),
                )
                .with_object(render_pass),
            );
        }

        let view_mask = model
            .subpasses()
            .get(dep.src_subpass as usize)
            .map(|sp| sp.view_mask)
            .unwrap_or(0);
        if view_mask.count_ones() > 1 && !view_local {
            diags.push(
                Diagnostic::error(
                    ids::DEP_SELF_MULTIVIEW,
                    format!(
                        "self-dependency {index} in subpass {} whose view mask {view_mask:#b} selects multiple views requires the view-local flag",
                        dep.src_subpass
                    ),
                )
                .with_object(render_pass),
            );
        }

        if !by_region
            && !view_local
            && mixes_framebuffer_space(dep.src_stage_mask, dep.dst_stage_mask)
        {
            diags.push(
                Diagnostic::error(
                    ids::DEP_SELF_STAGE_MIX,
                    format!(
                        "self-dependency {index} mixes framebuffer-space and non-framebuffer-space stages without a by-region or view-local flag"
                    ),
                )
                .with_object(render_pass),
            );
        }
        return;
    }

    // Rule 4: a shader-resolve subpass must not feed a later subpass.
    let src_flags = model
        .subpasses()
        .get(dep.src_subpass as usize)
        .map(|sp| vk::SubpassDescriptionFlags::from_raw(sp.flags))
        .unwrap_or_default();
    if src_flags.contains(vk::SubpassDescriptionFlags::SHADER_RESOLVE_QCOM)
        && dep.dst_subpass > dep.src_subpass
    {
        diags.push(
            Diagnostic::error(
                ids::DEP_SHADER_RESOLVE,
                format!(
                    "dependency {index}: shader-resolve subpass {} must not be the source of a dependency into later subpass {}",
                    dep.src_subpass, dep.dst_subpass
                ),
            )
            .with_object(render_pass),
        );
    }
}
