//! Per-recording-context render pass lifecycle.
//!
//! Sequencing errors are advisory: the machine reports them and still moves
//! to the caller-requested state, so later operations are validated against
//! a consistent (if wrong) state instead of getting stuck.

use std::collections::HashMap;
use std::sync::Arc;

use vkguard_types::diagnostic::ids;
use vkguard_types::{Diagnostic, ObjectHandle};

use crate::render_pass_model::RenderPassModel;

/// How a subpass's contents are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubpassContents {
    Inline,
    /// Contents come from executed secondary command buffers; only a fixed
    /// allow-list of operations may be recorded directly.
    SecondaryCommandBuffers,
}

/// One attachment of a dynamic-rendering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicAttachment {
    pub view: ObjectHandle,
    pub layout: i32,
    pub is_depth_stencil: bool,
}

/// Operation classes that care about render pass placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    /// Draws: only valid inside an active render pass
    Draw,
    /// Dispatches: only valid outside a render pass
    Dispatch,
    /// Copies, blits, clears-by-copy: only valid outside a render pass
    Copy,
    /// Executing secondary command buffers
    ExecuteCommands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Inside,
    Outside,
}

pub enum PassState {
    Inactive,
    Classic {
        subpass: u32,
        render_pass: ObjectHandle,
        framebuffer: ObjectHandle,
        model: Arc<RenderPassModel>,
        contents: SubpassContents,
    },
    Dynamic {
        attachments: Vec<DynamicAttachment>,
    },
}

/// Recording state for one command buffer. Single-threaded by contract;
/// cross-object lookups during validation still go through the shared store.
pub struct RecordingContext {
    command_buffer: ObjectHandle,
    state: PassState,
    /// Attachment index -> aspect bits written so far in the active pass
    touched: HashMap<u32, u32>,
}

impl RecordingContext {
    pub fn new(command_buffer: ObjectHandle) -> Self {
        Self {
            command_buffer,
            state: PassState::Inactive,
            touched: HashMap::new(),
        }
    }

    pub fn command_buffer(&self) -> ObjectHandle {
        self.command_buffer
    }

    pub fn state(&self) -> &PassState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, PassState::Inactive)
    }

    pub fn current_subpass(&self) -> Option<u32> {
        match &self.state {
            PassState::Classic { subpass, .. } => Some(*subpass),
            _ => None,
        }
    }

    pub fn active_model(&self) -> Option<&Arc<RenderPassModel>> {
        match &self.state {
            PassState::Classic { model, .. } => Some(model),
            _ => None,
        }
    }

    /// Reset to the freshly-allocated state (command buffer reset).
    pub fn reset(&mut self) {
        self.state = PassState::Inactive;
        self.touched.clear();
    }

    /// Enter a classic render pass at subpass zero.
    pub fn begin_classic(
        &mut self,
        render_pass: ObjectHandle,
        framebuffer: ObjectHandle,
        model: Arc<RenderPassModel>,
        contents: SubpassContents,
    ) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        if self.is_active() {
            diags.push(
                Diagnostic::error(
                    ids::PASS_ALREADY_ACTIVE,
                    "beginning a render pass while another is already active",
                )
                .with_object(self.command_buffer),
            );
        }
        self.touched.clear();
        self.state = PassState::Classic {
            subpass: 0,
            render_pass,
            framebuffer,
            model,
            contents,
        };
        diags
    }

    /// Advance to the next subpass. Advancing past the final subpass is
    /// reported but the index still advances.
    pub fn next_subpass(&mut self, contents: SubpassContents) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        match &mut self.state {
            PassState::Classic {
                subpass,
                model,
                contents: active_contents,
                ..
            } => {
                let count = model.subpass_count() as u32;
                if *subpass + 1 >= count {
                    diags.push(
                        Diagnostic::error(
                            ids::SUBPASS_BEYOND_FINAL,
                            format!(
                                "advancing beyond the final subpass (index {}, subpass count {count})",
                                *subpass
                            ),
                        )
                        .with_object(self.command_buffer),
                    );
                }
                *subpass += 1;
                *active_contents = contents;
            }
            PassState::Dynamic { .. } => {
                diags.push(
                    Diagnostic::error(
                        ids::PASS_MODE_MISMATCH,
                        "next-subpass recorded during dynamic rendering",
                    )
                    .with_object(self.command_buffer),
                );
            }
            PassState::Inactive => {
                diags.push(
                    Diagnostic::error(
                        ids::PASS_NOT_ACTIVE,
                        "next-subpass recorded outside a render pass",
                    )
                    .with_object(self.command_buffer),
                );
            }
        }
        diags
    }

    /// End the classic render pass. Ending early or in the wrong mode is
    /// reported; the state still becomes inactive.
    pub fn end_classic(&mut self) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        match &self.state {
            PassState::Classic { subpass, model, .. } => {
                let last = model.subpass_count().saturating_sub(1) as u32;
                if *subpass < last {
                    diags.push(
                        Diagnostic::error(
                            ids::ENDED_BEFORE_FINAL_SUBPASS,
                            format!(
                                "render pass ended in subpass {} before the final subpass {last}",
                                *subpass
                            ),
                        )
                        .with_object(self.command_buffer),
                    );
                }
            }
            PassState::Dynamic { .. } => {
                diags.push(
                    Diagnostic::error(
                        ids::PASS_MODE_MISMATCH,
                        "classic end recorded while dynamic rendering is active",
                    )
                    .with_object(self.command_buffer),
                );
            }
            PassState::Inactive => {
                diags.push(
                    Diagnostic::error(
                        ids::PASS_NOT_ACTIVE,
                        "render pass ended but none is active",
                    )
                    .with_object(self.command_buffer),
                );
            }
        }
        self.state = PassState::Inactive;
        diags
    }

    /// Enter dynamic rendering (no render pass object).
    pub fn begin_dynamic(&mut self, attachments: Vec<DynamicAttachment>) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        if self.is_active() {
            diags.push(
                Diagnostic::error(
                    ids::PASS_ALREADY_ACTIVE,
                    "beginning dynamic rendering while a render pass is already active",
                )
                .with_object(self.command_buffer),
            );
        }
        self.touched.clear();
        self.state = PassState::Dynamic { attachments };
        diags
    }

    pub fn end_dynamic(&mut self) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        match &self.state {
            PassState::Dynamic { .. } => {}
            PassState::Classic { .. } => {
                diags.push(
                    Diagnostic::error(
                        ids::PASS_MODE_MISMATCH,
                        "dynamic-rendering end recorded while a classic render pass is active",
                    )
                    .with_object(self.command_buffer),
                );
            }
            PassState::Inactive => {
                diags.push(
                    Diagnostic::error(
                        ids::PASS_NOT_ACTIVE,
                        "dynamic-rendering end recorded but nothing is active",
                    )
                    .with_object(self.command_buffer),
                );
            }
        }
        self.state = PassState::Inactive;
        diags
    }

    /// Check whether an operation class may be recorded in the current
    /// state: placement (inside/outside a render pass) plus the
    /// secondary-contents allow-list.
    pub fn check_operation(&self, op: OpClass) -> Vec<Diagnostic> {
        let mut diags = Vec::new();

        if let PassState::Classic { contents, .. } = &self.state {
            let allowed_in_secondary = matches!(op, OpClass::ExecuteCommands);
            if *contents == SubpassContents::SecondaryCommandBuffers && !allowed_in_secondary {
                diags.push(
                    Diagnostic::error(
                        ids::SECONDARY_CONTENTS_RESTRICTION,
                        format!(
                            "{op:?} recorded in a subpass whose contents are secondary command buffers"
                        ),
                    )
                    .with_object(self.command_buffer),
                );
                return diags;
            }
        }

        let required = match op {
            OpClass::Draw => Placement::Inside,
            OpClass::Dispatch | OpClass::Copy => Placement::Outside,
            OpClass::ExecuteCommands => return diags,
        };
        match (required, self.is_active()) {
            (Placement::Inside, false) => diags.push(
                Diagnostic::error(
                    ids::OP_REQUIRES_RENDER_PASS,
                    format!("{op:?} recorded outside a render pass"),
                )
                .with_object(self.command_buffer),
            ),
            (Placement::Outside, true) => diags.push(
                Diagnostic::error(
                    ids::OP_FORBIDDEN_INSIDE_PASS,
                    format!("{op:?} recorded inside a render pass"),
                )
                .with_object(self.command_buffer),
            ),
            _ => {}
        }
        diags
    }

    /// Accumulate written aspect bits for an attachment of the active pass.
    pub fn touch_attachment(&mut self, attachment: u32, aspects: u32) {
        *self.touched.entry(attachment).or_insert(0) |= aspects;
    }

    pub fn touched_aspects(&self, attachment: u32) -> u32 {
        self.touched.get(&attachment).copied().unwrap_or(0)
    }

    pub fn was_touched(&self, attachment: u32) -> bool {
        self.touched_aspects(attachment) != 0
    }
}
