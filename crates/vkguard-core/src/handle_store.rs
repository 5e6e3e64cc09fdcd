//! Strong ownership of every tracked object, keyed by handle.

use std::sync::Arc;

use dashmap::DashMap;
use vkguard_types::{ObjectHandle, ObjectKind};

use crate::error::CoreError;
use crate::lifetime::NodeId;
use crate::render_pass_model::RenderPassModel;

/// Kind-specific payload attached to a tracked object.
pub enum ObjectPayload {
    /// Registered for lifetime tracking only
    Plain,
    RenderPass(Arc<RenderPassModel>),
    Framebuffer(Arc<FramebufferState>),
}

/// Everything the core remembers about a framebuffer: the render pass it was
/// created against (by handle and by frozen model) and its attachment views.
pub struct FramebufferState {
    pub render_pass: ObjectHandle,
    pub model: Arc<RenderPassModel>,
    pub attachments: Vec<ObjectHandle>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

pub struct TrackedObject {
    pub handle: ObjectHandle,
    pub node: NodeId,
    pub payload: ObjectPayload,
}

impl TrackedObject {
    pub fn kind(&self) -> ObjectKind {
        self.handle.kind
    }
}

/// Owns strong references to all tracked objects. Lookups are shared reads;
/// register/remove are per-shard exclusive writes. Cross-references between
/// objects are handles resolved back through this store, never pointers.
#[derive(Default)]
pub struct HandleStore {
    objects: DashMap<ObjectHandle, Arc<TrackedObject>>,
}

impl HandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entry. Fails if the handle is already registered.
    pub fn register(&self, object: TrackedObject) -> Result<(), CoreError> {
        match self.objects.entry(object.handle) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(CoreError::DuplicateHandle(object.handle))
            }
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(Arc::new(object));
                Ok(())
            }
        }
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<Arc<TrackedObject>> {
        self.objects.get(&handle).map(|v| Arc::clone(&v))
    }

    /// Typed lookup: the frozen render pass model behind a handle.
    pub fn render_pass(&self, handle: ObjectHandle) -> Option<Arc<RenderPassModel>> {
        match &self.get(handle)?.payload {
            ObjectPayload::RenderPass(model) => Some(Arc::clone(model)),
            _ => None,
        }
    }

    /// Typed lookup: framebuffer state behind a handle.
    pub fn framebuffer(&self, handle: ObjectHandle) -> Option<Arc<FramebufferState>> {
        match &self.get(handle)?.payload {
            ObjectPayload::Framebuffer(state) => Some(Arc::clone(state)),
            _ => None,
        }
    }

    /// Detach ownership. Call after the object's invalidation cascade has
    /// completed; the handle is immediately invalid for future lookups.
    pub fn remove(&self, handle: ObjectHandle) -> Option<Arc<TrackedObject>> {
        self.objects.remove(&handle).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
