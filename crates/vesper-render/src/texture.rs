//! Texture handles and the registry resolving them to bindable resources.

use std::sync::Arc;

use ahash::HashMap;

/// Identity of a registered texture.
///
/// Identity is handle equality, not content equality: two registrations of
/// the same image occupy two texture units unless the caller deduplicates
/// upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u64);

impl TextureHandle {
    /// Construct a handle from a raw id, for callers that mint their own ids
    /// (asset pipelines, tests).
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The raw id of this handle.
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// A registered texture: the view to bind and the sampler to use.
pub struct TextureSlot {
    pub view: Arc<wgpu::TextureView>,
    pub sampler: Arc<wgpu::Sampler>,
}

/// Maps [`TextureHandle`]s to GPU resources for the submission backend.
///
/// Handles stay valid until [`TextureRegistry::unregister`]; a handle
/// submitted after its texture was unregistered resolves to the backend's
/// fallback texture.
pub struct TextureRegistry {
    slots: HashMap<u64, TextureSlot>,
    next_id: u64,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self {
            slots: HashMap::default(),
            next_id: 1,
        }
    }

    /// Register a texture view/sampler pair, returning its handle.
    pub fn register(
        &mut self,
        view: Arc<wgpu::TextureView>,
        sampler: Arc<wgpu::Sampler>,
    ) -> TextureHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.slots.insert(id, TextureSlot { view, sampler });
        TextureHandle(id)
    }

    /// Look up the resources behind a handle.
    pub fn get(&self, handle: TextureHandle) -> Option<&TextureSlot> {
        self.slots.get(&handle.0)
    }

    /// Drop a registration. Returns whether the handle was present.
    pub fn unregister(&mut self, handle: TextureHandle) -> bool {
        self.slots.remove(&handle.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for TextureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_distinct() {
        let a = TextureHandle::from_raw(1);
        let b = TextureHandle::from_raw(1);
        let c = TextureHandle::from_raw(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(c.id(), 2);
    }
}
