//! Device-scoped validation context.
//!
//! One `ValidationContext` exists per logical device, created at device
//! creation and torn down with it. Everything is held by value here and
//! passed explicitly to operations; there is no process-wide state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ash::vk;
use tracing::{debug, warn};
use vkguard_types::diagnostic::ids;
use vkguard_types::render_pass::{
    FramebufferDescription, RenderPassDescription, RenderPassDescription2,
};
use vkguard_types::{Diagnostic, ObjectHandle, ObjectKind};

use crate::attachment_usage::{analyze_render_pass, load_op_heuristics};
use crate::compatibility::check_compatibility;
use crate::config::ValidationConfig;
use crate::dependency_graph::validate_dependencies;
use crate::external::{
    AllFormats, DiagnosticSink, FormatCapabilities, NoSubmissions, SubmissionTracker, TracingSink,
};
use crate::handle_store::{FramebufferState, HandleStore, ObjectPayload, TrackedObject};
use crate::lifecycle::{DynamicAttachment, OpClass, RecordingContext, SubpassContents};
use crate::lifetime::LifetimeGraph;
use crate::render_pass_model::RenderPassModel;

pub struct ValidationContext {
    config: ValidationConfig,
    store: HandleStore,
    graph: LifetimeGraph,
    next_id: AtomicU64,
    caps: Arc<dyn FormatCapabilities>,
    tracker: Arc<dyn SubmissionTracker>,
    sink: Arc<dyn DiagnosticSink>,
}

impl ValidationContext {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            store: HandleStore::new(),
            graph: LifetimeGraph::new(),
            // Start from 1 to avoid confusion with null handles
            next_id: AtomicU64::new(1),
            caps: Arc::new(AllFormats),
            tracker: Arc::new(NoSubmissions),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_format_capabilities(mut self, caps: Arc<dyn FormatCapabilities>) -> Self {
        self.caps = caps;
        self
    }

    pub fn with_submission_tracker(mut self, tracker: Arc<dyn SubmissionTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn store(&self) -> &HandleStore {
        &self.store
    }

    pub fn graph(&self) -> &LifetimeGraph {
        &self.graph
    }

    fn alloc_handle(&self, kind: ObjectKind) -> ObjectHandle {
        ObjectHandle {
            kind,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn emit(&self, diags: &[Diagnostic]) {
        if !self.config.report_diagnostics {
            return;
        }
        for diag in diags {
            self.sink.report(diag);
        }
    }

    fn register(&self, object: TrackedObject) {
        // Handles come from our own counter, so this only fails if a caller
        // re-registers; log it rather than losing the creation.
        if let Err(e) = self.store.register(object) {
            warn!("object registration failed: {e}");
        }
    }

    // ── Object tracking ─────────────────────────────────────

    /// Register an object that carries no validator-specific payload, wiring
    /// it as a dependent of each object in `depends_on` (so those report
    /// in-use while this object is, and invalidation reaches it).
    pub fn track_object(&self, kind: ObjectKind, depends_on: &[ObjectHandle]) -> ObjectHandle {
        let handle = self.alloc_handle(kind);
        let node = self.graph.insert(handle);
        for &dep in depends_on {
            match self.store.get(dep) {
                Some(obj) => {
                    self.graph.add_parent(obj.node, node);
                }
                None => warn!(?dep, "track_object: dependency handle not found"),
            }
        }
        self.register(TrackedObject {
            handle,
            node,
            payload: ObjectPayload::Plain,
        });
        handle
    }

    /// Destroy an object: run its invalidation cascade (under one graph
    /// write lock), then detach ownership and free its node.
    pub fn destroy_object(&self, handle: ObjectHandle) {
        let Some(obj) = self.store.get(handle) else {
            debug!(?handle, "destroy of unknown handle ignored");
            return;
        };
        if self.config.checks.lifetime && self.graph.in_use(obj.node, self.tracker.as_ref()) {
            self.emit(&[Diagnostic::warning(
                ids::DESTROYING_IN_USE_OBJECT,
                format!("destroying {:?} while it is in use", handle.kind),
            )
            .with_object(handle)]);
        }
        self.graph.invalidate(obj.node, true);
        self.store.remove(handle);
        self.graph.remove(obj.node);
    }

    /// True if the object, or anything depending on it, is queued.
    pub fn is_in_use(&self, handle: ObjectHandle) -> bool {
        match self.store.get(handle) {
            Some(obj) => self.graph.in_use(obj.node, self.tracker.as_ref()),
            None => false,
        }
    }

    /// Lifetime check shared by record-time operations. Pushes at most one
    /// diagnostic per handle and returns the object when it is usable.
    fn require_live(
        &self,
        handle: ObjectHandle,
        diags: &mut Vec<Diagnostic>,
    ) -> Option<Arc<TrackedObject>> {
        let Some(obj) = self.store.get(handle) else {
            if self.config.checks.lifetime {
                diags.push(
                    Diagnostic::error(
                        ids::INVALID_OBJECT_HANDLE,
                        format!("{:?} handle does not name a live object", handle.kind),
                    )
                    .with_object(handle),
                );
            }
            return None;
        };
        if self.config.checks.lifetime && self.graph.destroyed(obj.node) {
            diags.push(
                Diagnostic::error(
                    ids::USES_DESTROYED_OBJECT,
                    format!("{:?} was destroyed but is still referenced", handle.kind),
                )
                .with_object(handle),
            );
        }
        Some(obj)
    }

    // ── Render pass creation ────────────────────────────────

    /// Validate and register a render pass from the canonical description.
    /// The handle is issued even when diagnostics were found.
    pub fn create_render_pass(
        &self,
        desc: RenderPassDescription2,
    ) -> (ObjectHandle, Vec<Diagnostic>) {
        let handle = self.alloc_handle(ObjectKind::RenderPass);
        let model = Arc::new(RenderPassModel::new(desc));

        let mut diags = Vec::new();
        if self.config.checks.render_pass {
            let (analyzer, usage_diags) =
                analyze_render_pass(&model, self.caps.as_ref(), handle);
            diags.extend(usage_diags);
            diags.extend(validate_dependencies(&model, handle));
            if self.config.checks.heuristics {
                diags.extend(load_op_heuristics(&model, &analyzer, handle));
            }
        }

        let node = self.graph.insert(handle);
        self.register(TrackedObject {
            handle,
            node,
            payload: ObjectPayload::RenderPass(model),
        });
        debug!(?handle, findings = diags.len(), "render pass created");
        self.emit(&diags);
        (handle, diags)
    }

    /// Legacy entry point: upgrade the first-version shape and defer to the
    /// canonical path. No validator ever sees the legacy shape.
    pub fn create_render_pass_legacy(
        &self,
        desc: &RenderPassDescription,
    ) -> (ObjectHandle, Vec<Diagnostic>) {
        self.create_render_pass(RenderPassDescription2::from_legacy(desc))
    }

    // ── Framebuffers ────────────────────────────────────────

    pub fn create_framebuffer(
        &self,
        desc: FramebufferDescription,
    ) -> (ObjectHandle, Vec<Diagnostic>) {
        let handle = self.alloc_handle(ObjectKind::Framebuffer);
        let mut diags = Vec::new();

        let render_pass_obj = self.require_live(desc.render_pass, &mut diags);
        let model = self.store.render_pass(desc.render_pass);

        if let Some(model) = &model {
            if desc.attachments.len() != model.attachment_count() {
                diags.push(
                    Diagnostic::error(
                        ids::FRAMEBUFFER_ATTACHMENT_COUNT,
                        format!(
                            "framebuffer supplies {} attachments but the render pass declares {}",
                            desc.attachments.len(),
                            model.attachment_count()
                        ),
                    )
                    .with_object(handle)
                    .with_object(desc.render_pass),
                );
            }
        }
        if desc.width == 0 || desc.height == 0 || desc.layers == 0 {
            diags.push(
                Diagnostic::error(
                    ids::FRAMEBUFFER_DIMENSIONS,
                    format!(
                        "framebuffer dimensions {}x{}x{} must all be non-zero",
                        desc.width, desc.height, desc.layers
                    ),
                )
                .with_object(handle),
            );
        }

        let node = self.graph.insert(handle);
        // The framebuffer depends on its render pass and every attachment
        // view: each of those gains this framebuffer as a parent edge.
        if let Some(rp) = &render_pass_obj {
            self.graph.add_parent(rp.node, node);
        }
        for &view in &desc.attachments {
            if let Some(view_obj) = self.require_live(view, &mut diags) {
                self.graph.add_parent(view_obj.node, node);
            }
        }

        let payload = match model {
            Some(model) => ObjectPayload::Framebuffer(Arc::new(FramebufferState {
                render_pass: desc.render_pass,
                model,
                attachments: desc.attachments.clone(),
                width: desc.width,
                height: desc.height,
                layers: desc.layers,
            })),
            // The earlier invalid-handle finding already explains this.
            None => ObjectPayload::Plain,
        };
        self.register(TrackedObject {
            handle,
            node,
            payload,
        });
        self.emit(&diags);
        (handle, diags)
    }

    // ── Record-time operations ──────────────────────────────

    /// Begin a classic render pass in a recording context, checking object
    /// lifetimes, framebuffer compatibility, and the clear-value count.
    pub fn begin_render_pass(
        &self,
        rec: &mut RecordingContext,
        render_pass: ObjectHandle,
        framebuffer: ObjectHandle,
        clear_value_count: u32,
        contents: SubpassContents,
    ) -> Vec<Diagnostic> {
        let mut diags = Vec::new();

        self.require_live(render_pass, &mut diags);
        self.require_live(framebuffer, &mut diags);
        let model = self.store.render_pass(render_pass);
        let fb_state = self.store.framebuffer(framebuffer);

        if let Some(fb) = &fb_state {
            if self.config.checks.lifetime {
                for &view in &fb.attachments {
                    self.require_live(view, &mut diags);
                }
            }
            if let Some(model) = &model {
                if self.config.checks.compatibility && fb.render_pass != render_pass {
                    for mismatch in check_compatibility(&fb.model, model) {
                        diags.push(mismatch.into_diagnostic(&[render_pass, framebuffer]));
                    }
                }
            }
        }

        let Some(model) = model else {
            // Unresolvable render pass: the invalid-handle finding above is
            // the whole story, nothing further to validate or begin.
            self.emit(&diags);
            return diags;
        };

        let clear = vk::AttachmentLoadOp::CLEAR.as_raw();
        let required = model
            .attachments()
            .iter()
            .enumerate()
            .filter(|(_, a)| a.load_op == clear || a.stencil_load_op == clear)
            .map(|(i, _)| i as u32 + 1)
            .max()
            .unwrap_or(0);
        if clear_value_count < required {
            diags.push(
                Diagnostic::error(
                    ids::CLEAR_VALUE_COUNT,
                    format!(
                        "{clear_value_count} clear values supplied but attachments up to index {} are cleared",
                        required - 1
                    ),
                )
                .with_object(render_pass),
            );
        }

        diags.extend(rec.begin_classic(render_pass, framebuffer, Arc::clone(&model), contents));

        // Cleared attachments count as written for bandwidth heuristics.
        for (index, attachment) in model.attachments().iter().enumerate() {
            let mut aspects = 0;
            if attachment.load_op == clear {
                aspects |= vk::ImageAspectFlags::COLOR.as_raw() | vk::ImageAspectFlags::DEPTH.as_raw();
            }
            if attachment.stencil_load_op == clear {
                aspects |= vk::ImageAspectFlags::STENCIL.as_raw();
            }
            if aspects != 0 {
                rec.touch_attachment(index as u32, aspects);
            }
        }

        self.emit(&diags);
        diags
    }

    pub fn next_subpass(
        &self,
        rec: &mut RecordingContext,
        contents: SubpassContents,
    ) -> Vec<Diagnostic> {
        let diags = rec.next_subpass(contents);
        self.emit(&diags);
        diags
    }

    /// End the active render pass. With heuristics enabled, attachments that
    /// are stored but were never written during the pass are flagged.
    pub fn end_render_pass(&self, rec: &mut RecordingContext) -> Vec<Diagnostic> {
        let mut diags = Vec::new();

        if self.config.checks.heuristics {
            if let Some(model) = rec.active_model().cloned() {
                let store = vk::AttachmentStoreOp::STORE.as_raw();
                for (index, attachment) in model.attachments().iter().enumerate() {
                    if attachment.store_op == store && !rec.was_touched(index as u32) {
                        diags.push(Diagnostic::performance(
                            ids::STORE_NEVER_WRITTEN,
                            format!(
                                "attachment {index} is stored at end of pass but was never written; consider STORE_OP_DONT_CARE"
                            ),
                        ));
                    }
                }
            }
        }

        diags.extend(rec.end_classic());
        self.emit(&diags);
        diags
    }

    pub fn begin_dynamic_rendering(
        &self,
        rec: &mut RecordingContext,
        attachments: Vec<DynamicAttachment>,
    ) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        if self.config.checks.lifetime {
            for attachment in &attachments {
                self.require_live(attachment.view, &mut diags);
            }
        }
        diags.extend(rec.begin_dynamic(attachments));
        self.emit(&diags);
        diags
    }

    pub fn end_dynamic_rendering(&self, rec: &mut RecordingContext) -> Vec<Diagnostic> {
        let diags = rec.end_dynamic();
        self.emit(&diags);
        diags
    }

    /// Placement and contents-mode check for one recorded operation. Draws
    /// additionally mark the current subpass's writable attachments touched.
    pub fn validate_operation(&self, rec: &mut RecordingContext, op: OpClass) -> Vec<Diagnostic> {
        let diags = rec.check_operation(op);

        if op == OpClass::Draw && diags.is_empty() {
            if let (Some(model), Some(subpass)) =
                (rec.active_model().cloned(), rec.current_subpass())
            {
                if let Some(sp) = model.subpasses().get(subpass as usize) {
                    let color_aspect = vk::ImageAspectFlags::COLOR.as_raw();
                    let ds_aspect =
                        vk::ImageAspectFlags::DEPTH.as_raw() | vk::ImageAspectFlags::STENCIL.as_raw();
                    for r in sp.color_attachments.iter().chain(sp.resolve_attachments.iter()) {
                        if !r.is_unused() && (r.attachment as usize) < model.attachment_count() {
                            rec.touch_attachment(r.attachment, color_aspect);
                        }
                    }
                    if let Some(r) = &sp.depth_stencil_attachment {
                        if !r.is_unused() && (r.attachment as usize) < model.attachment_count() {
                            rec.touch_attachment(r.attachment, ds_aspect);
                        }
                    }
                }
            }
        }

        self.emit(&diags);
        diags
    }

    /// Match a secondary command buffer's inherited render pass state
    /// against the primary's active pass.
    pub fn validate_inheritance(
        &self,
        rec: &RecordingContext,
        inherited_render_pass: ObjectHandle,
        inherited_subpass: u32,
    ) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        if !self.config.checks.compatibility {
            return diags;
        }

        self.require_live(inherited_render_pass, &mut diags);
        let inherited = self.store.render_pass(inherited_render_pass);

        if let (Some(active), Some(inherited)) = (rec.active_model(), &inherited) {
            for mismatch in check_compatibility(active, inherited) {
                diags.push(mismatch.into_diagnostic(&[inherited_render_pass, rec.command_buffer()]));
            }
            if let Some(current) = rec.current_subpass() {
                if current != inherited_subpass {
                    diags.push(
                        Diagnostic::error(
                            ids::INHERITANCE_SUBPASS_MISMATCH,
                            format!(
                                "secondary command buffer inherits subpass {inherited_subpass} but the primary is in subpass {current}"
                            ),
                        )
                        .with_object(rec.command_buffer()),
                    );
                }
            }
        }

        self.emit(&diags);
        diags
    }
}
