//! wgpu-backed [`GpuSubmitter`].
//!
//! Owns the pipeline, the two attribute vertex buffers (allocated once at
//! batch capacity, rewritten per flush), the per-frame uniform buffer, and a
//! texture binding array sized to the unit table and padded with a 1x1 white
//! fallback.

use std::sync::Arc;

use vesper_core::profiling::profile_function;

use crate::batch::{PositionAttr, ShadeAttr};
use crate::context::GraphicsContext;
use crate::flush::BatcherConfig;
use crate::pipeline;
use crate::submit::{FrameUniforms, FrameUniformsRaw, GpuSubmitter, SubmitError};
use crate::texture::{TextureHandle, TextureRegistry};

pub struct WgpuSubmitter {
    context: Arc<GraphicsContext>,
    pipeline: wgpu::RenderPipeline,
    position_buffer: wgpu::Buffer,
    shade_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    texture_bind_group: wgpu::BindGroup,
    /// Ids the current bind group was built from, for change detection.
    bound_ids: Vec<u64>,
    sampler: wgpu::Sampler,
    _fallback_texture: wgpu::Texture,
    fallback_view: wgpu::TextureView,
    registry: TextureRegistry,
    max_texture_units: usize,
    capacity: usize,
    target: Option<wgpu::TextureView>,
    clear_color: wgpu::Color,
    /// Whether the target was cleared this frame; the first flush clears,
    /// later ones load.
    cleared: bool,
}

impl WgpuSubmitter {
    pub fn new(
        context: Arc<GraphicsContext>,
        surface_format: wgpu::TextureFormat,
        config: &BatcherConfig,
    ) -> Self {
        profile_function!();
        let device = context.device();
        let queue = context.queue();

        let position_buffer = pipeline::create_attribute_buffer(
            device,
            "batch_position_buffer",
            config.capacity,
            std::mem::size_of::<PositionAttr>(),
        );
        let shade_buffer = pipeline::create_attribute_buffer(
            device,
            "batch_shade_buffer",
            config.capacity,
            std::mem::size_of::<ShadeAttr>(),
        );
        let uniform_buffer = pipeline::create_uniform_buffer(device);

        let uniform_layout = pipeline::create_uniform_bind_group_layout(device);
        let uniform_bind_group =
            pipeline::create_uniform_bind_group(device, &uniform_layout, &uniform_buffer);

        let texture_layout =
            pipeline::create_texture_bind_group_layout(device, config.max_texture_units as u32);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("batch_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/batched.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("batch_pipeline_layout"),
            bind_group_layouts: &[&texture_layout, &uniform_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline =
            pipeline::create_batch_pipeline(device, &shader, &pipeline_layout, surface_format);

        let (fallback_texture, fallback_view) = pipeline::create_fallback_texture(device, queue);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("batch_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let texture_bind_group = Self::build_texture_bind_group(
            device,
            &texture_layout,
            &sampler,
            &fallback_view,
            &[],
            &TextureRegistry::new(),
            config.max_texture_units,
        );

        tracing::info!(
            capacity = config.capacity,
            max_texture_units = config.max_texture_units,
            "wgpu batch submitter ready"
        );

        Self {
            context,
            pipeline: render_pipeline,
            position_buffer,
            shade_buffer,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            texture_bind_group,
            bound_ids: Vec::new(),
            sampler,
            _fallback_texture: fallback_texture,
            fallback_view,
            registry: TextureRegistry::new(),
            max_texture_units: config.max_texture_units,
            capacity: config.capacity,
            target: None,
            clear_color: wgpu::Color::BLACK,
            cleared: false,
        }
    }

    /// Register a texture for later use in textured draw commands.
    pub fn register_texture(
        &mut self,
        view: Arc<wgpu::TextureView>,
        sampler: Arc<wgpu::Sampler>,
    ) -> TextureHandle {
        self.registry.register(view, sampler)
    }

    /// Drop a texture registration.
    pub fn unregister_texture(&mut self, handle: TextureHandle) -> bool {
        self.registry.unregister(handle)
    }

    /// Set the render target for subsequent frames.
    pub fn set_target(&mut self, target: wgpu::TextureView) {
        self.target = Some(target);
    }

    /// Color the first flush of each frame clears the target to.
    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    fn build_texture_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        fallback_view: &wgpu::TextureView,
        handles: &[TextureHandle],
        registry: &TextureRegistry,
        max_units: usize,
    ) -> wgpu::BindGroup {
        let mut views: Vec<&wgpu::TextureView> = Vec::with_capacity(max_units);
        for handle in handles {
            match registry.get(*handle) {
                Some(slot) => views.push(&slot.view),
                None => {
                    tracing::warn!(id = handle.id(), "unknown texture handle, using fallback");
                    views.push(fallback_view);
                }
            }
        }
        // Pad unused units with the fallback so the array is fully bound.
        while views.len() < max_units {
            views.push(fallback_view);
        }

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("batch_texture_bg"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureViewArray(&views),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Rebuild the unit binding array if the batch's texture list changed.
    fn update_texture_bind_group(&mut self, handles: &[TextureHandle]) {
        let ids: Vec<u64> = handles.iter().map(|h| h.id()).collect();
        if ids == self.bound_ids {
            return;
        }
        self.texture_bind_group = Self::build_texture_bind_group(
            self.context.device(),
            &self.texture_layout,
            &self.sampler,
            &self.fallback_view,
            handles,
            &self.registry,
            self.max_texture_units,
        );
        self.bound_ids = ids;
    }
}

impl GpuSubmitter for WgpuSubmitter {
    fn set_per_frame_uniforms(&mut self, uniforms: &FrameUniforms) -> Result<(), SubmitError> {
        let raw = FrameUniformsRaw::from(uniforms);
        self.context
            .queue()
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&raw));
        self.cleared = false;
        Ok(())
    }

    fn upload_and_draw(
        &mut self,
        positions: &[PositionAttr],
        shades: &[ShadeAttr],
        textures: &[TextureHandle],
    ) -> Result<(), SubmitError> {
        profile_function!();
        debug_assert_eq!(positions.len(), shades.len());

        if positions.is_empty() {
            return Ok(());
        }
        if positions.len() > self.capacity {
            return Err(SubmitError::Backend(format!(
                "batch of {} vertices exceeds buffer capacity {}",
                positions.len(),
                self.capacity
            )));
        }
        let queue = self.context.queue();
        queue.write_buffer(&self.position_buffer, 0, bytemuck::cast_slice(positions));
        queue.write_buffer(&self.shade_buffer, 0, bytemuck::cast_slice(shades));

        self.update_texture_bind_group(textures);

        let Some(target) = self.target.as_ref() else {
            return Err(SubmitError::MissingTarget);
        };

        let mut encoder =
            self.context
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("batch_encoder"),
                });
        {
            let load = if self.cleared {
                wgpu::LoadOp::Load
            } else {
                wgpu::LoadOp::Clear(self.clear_color)
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("batch_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.texture_bind_group, &[]);
            pass.set_bind_group(1, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.position_buffer.slice(..));
            pass.set_vertex_buffer(1, self.shade_buffer.slice(..));
            pass.draw(0..positions.len() as u32, 0..1);
        }

        self.context.queue().submit(std::iter::once(encoder.finish()));
        self.cleared = true;
        Ok(())
    }
}
