use serde::{Deserialize, Serialize};

/// Opaque identifier for a tracked GPU object.
/// Issued by the validation context -- never reused while the object is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectHandle {
    /// Kind tag for debugging and validation
    pub kind: ObjectKind,
    /// Unique identifier within the owning device context
    pub id: u64,
}

impl ObjectHandle {
    /// Create a null/invalid handle.
    pub fn null() -> Self {
        Self {
            kind: ObjectKind::None,
            id: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.kind == ObjectKind::None && self.id == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    None,

    Instance,
    PhysicalDevice,
    Device,
    Queue,
    CommandPool,
    CommandBuffer,
    DeviceMemory,
    Buffer,
    BufferView,
    Image,
    ImageView,
    Sampler,
    Pipeline,
    PipelineLayout,
    DescriptorSetLayout,
    DescriptorPool,
    DescriptorSet,
    ShaderModule,
    RenderPass,
    Framebuffer,
    Fence,
    Semaphore,
    Event,
    Swapchain,
}
