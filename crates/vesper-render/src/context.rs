//! GPU device acquisition.
//!
//! Windowing and surface management live upstream; this context is headless
//! and only owns the instance/adapter/device/queue quartet the submission
//! backend needs.

use std::sync::Arc;

/// A shared graphics context.
pub struct GraphicsContext {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

/// Failure to acquire a GPU device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// No suitable adapter was found.
    AdapterRequest(String),
    /// The adapter refused the requested features or limits.
    DeviceRequest(String),
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AdapterRequest(msg) => write!(f, "failed to find a GPU adapter: {}", msg),
            Self::DeviceRequest(msg) => write!(f, "failed to create GPU device: {}", msg),
        }
    }
}

impl std::error::Error for ContextError {}

impl GraphicsContext {
    /// Creates a new graphics context synchronously.
    ///
    /// See [`GraphicsContext::new`] for the asynchronous version.
    pub fn new_sync(max_texture_units: u32) -> Result<Arc<Self>, ContextError> {
        pollster::block_on(Self::new(max_texture_units))
    }

    /// Creates a new graphics context asynchronously.
    ///
    /// `max_texture_units` sizes the texture binding array the batch shader
    /// samples from, and raises the device limit accordingly.
    pub async fn new(max_texture_units: u32) -> Result<Arc<Self>, ContextError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ContextError::AdapterRequest(e.to_string()))?;

        let mut limits = wgpu::Limits::default();
        limits.max_binding_array_elements_per_shader_stage = max_texture_units;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("vesper_device"),
                required_features: wgpu::Features::TEXTURE_BINDING_ARRAY
                    | wgpu::Features::SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING,
                required_limits: limits,
                ..Default::default()
            })
            .await
            .map_err(|e| ContextError::DeviceRequest(e.to_string()))?;

        tracing::info!(adapter = %adapter.get_info().name, "graphics context ready");

        Ok(Arc::new(Self {
            instance,
            adapter,
            device,
            queue,
        }))
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
