// wgpu render backend

use std::collections::{HashMap, HashSet};
use std::num::NonZeroU64;
use std::sync::Arc;

use image::RgbaImage;
use wgpu::util::DeviceExt;
use wgpu::{Adapter, BindGroup, Buffer, Device, Queue, Sampler, Texture, TextureFormat, TextureView};
use winit::window::Window;

use super::pipeline::{ClearPipelines, MeshPipelines, PipelineKey, DEPTH_FORMAT};
use super::render_list::RenderList;
use super::uniforms::{DrawUniforms, PassUniforms, DRAW_UNIFORM_STRIDE};
use super::{RenderError, RenderTarget, Renderer, TextureKey};
use crate::camera::Camera;
use crate::geometry::Geometry;
use crate::material::{Filter, TextureSlot, TextureSource, Wrap};
use crate::math::Color;
use crate::scene::Scene;
use crate::viewport::{ScissorRect, SurfaceSize};

/// Images and off-screen targets are stored without sRGB conversion: colors
/// are authored in display space and written out unchanged.
const COLOR_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

type BindingKey = (TextureSource, Wrap, Filter);

struct GpuMesh {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
}

struct GpuTexture {
    texture: Texture,
    view: TextureView,
    size: (u32, u32),
}

struct GpuTarget {
    view: TextureView,
    depth_view: TextureView,
}

/// Renderer drawing into a window surface with wgpu.
///
/// Each `render` call is encoded and submitted on its own so that uniform
/// writes for one camera never leak into another render of the same frame.
pub struct GpuRenderer {
    adapter: Adapter,
    device: Device,
    queue: Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth_view: TextureView,

    pipelines: MeshPipelines,
    clears: ClearPipelines,
    pass_buffer: Buffer,
    pass_bind_group: BindGroup,
    draw_buffer: Buffer,
    draw_bind_group: BindGroup,
    draw_capacity: usize,
    clear_buffer: Buffer,
    clear_bind_group: BindGroup,

    meshes: HashMap<u64, GpuMesh>,
    textures: HashMap<TextureKey, GpuTexture>,
    targets: HashMap<u64, GpuTarget>,
    samplers: HashMap<(Wrap, Filter), Sampler>,
    texture_bind_groups: HashMap<BindingKey, BindGroup>,
    default_bind_group: BindGroup,

    frame: Option<wgpu::SurfaceTexture>,
    frame_view: Option<TextureView>,
    in_frame: bool,
    skip_frame: bool,
    cleared: HashSet<Option<u64>>,
    current_target: Option<RenderTarget>,
    scissor: Option<ScissorRect>,
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();

        // Initialize wgpu
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Renderer Device"),
                    required_features: wgpu::Features::default(),
                    required_limits: wgpu::Limits::default(),
                },
                None, // Trace path
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(RenderError::NoAdapter)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, config.width, config.height);

        let pipelines = MeshPipelines::new(&device);
        let clears = ClearPipelines::new(&device);

        let pass_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pass_uniform_buffer"),
            size: std::mem::size_of::<PassUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let pass_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pass_bind_group"),
            layout: &pipelines.pass_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: pass_buffer.as_entire_binding(),
            }],
        });

        let draw_capacity = 64;
        let (draw_buffer, draw_bind_group) = create_draw_buffer(&device, &pipelines, draw_capacity);

        let clear_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("clear_uniform_buffer"),
            size: std::mem::size_of::<[f32; 4]>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let clear_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("clear_bind_group"),
            layout: &clears.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: clear_buffer.as_entire_binding(),
            }],
        });

        // 1x1 white stands in for missing or still-loading maps.
        let white = create_texture(&device, &queue, &RgbaImage::from_pixel(1, 1, image::Rgba([255; 4])));
        let default_sampler = create_sampler(&device, Wrap::Clamp, Filter::Linear);
        let default_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("default_texture_bind_group"),
            layout: &pipelines.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&white.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&default_sampler),
                },
            ],
        });

        log::info!(
            "surface configured: {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            adapter,
            device,
            queue,
            surface,
            config,
            depth_view,
            pipelines,
            clears,
            pass_buffer,
            pass_bind_group,
            draw_buffer,
            draw_bind_group,
            draw_capacity,
            clear_buffer,
            clear_bind_group,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            targets: HashMap::new(),
            samplers: HashMap::new(),
            texture_bind_groups: HashMap::new(),
            default_bind_group,
            frame: None,
            frame_view: None,
            in_frame: false,
            skip_frame: false,
            cleared: HashSet::new(),
            current_target: None,
            scissor: None,
        })
    }

    fn reconfigure(&mut self) {
        let surface_caps = self.surface.get_capabilities(&self.adapter);
        if !surface_caps.formats.contains(&self.config.format) {
            log::warn!("surface format {:?} no longer supported", self.config.format);
        }
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, self.config.width, self.config.height);
    }

    fn ensure_mesh(&mut self, geometry: &Geometry) {
        if self.meshes.contains_key(&geometry.id()) || geometry.indices().is_empty() {
            return;
        }
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(geometry.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(geometry.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.meshes.insert(
            geometry.id(),
            GpuMesh {
                vertex_buffer,
                index_buffer,
            },
        );
    }

    fn ensure_target(&mut self, target: RenderTarget) {
        if self.targets.contains_key(&target.id()) {
            return;
        }
        log::debug!("creating render target {}x{}", target.width, target.height);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("render_target"),
            size: wgpu::Extent3d {
                width: target.width,
                height: target.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = create_depth_view(&self.device, target.width, target.height);
        self.targets.insert(target.id(), GpuTarget { view, depth_view });
    }

    fn ensure_binding(&mut self, slot: TextureSlot) {
        let key = (slot.source, slot.wrap, slot.filter);
        if self.texture_bind_groups.contains_key(&key) {
            return;
        }
        if let TextureSource::RenderTarget(target) = slot.source {
            self.ensure_target(target);
        }
        if !self.samplers.contains_key(&(slot.wrap, slot.filter)) {
            let sampler = create_sampler(&self.device, slot.wrap, slot.filter);
            self.samplers.insert((slot.wrap, slot.filter), sampler);
        }

        let view = match slot.source {
            TextureSource::Asset(id) => self.textures.get(&TextureKey::Asset(id)).map(|t| &t.view),
            TextureSource::Stream(id) => self.textures.get(&TextureKey::Stream(id)).map(|t| &t.view),
            TextureSource::RenderTarget(target) => self.targets.get(&target.id()).map(|t| &t.view),
        };
        // Not uploaded yet; drawn with the default texture until it is.
        let (Some(view), Some(sampler)) = (view, self.samplers.get(&(slot.wrap, slot.filter))) else {
            return;
        };

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture_bind_group"),
            layout: &self.pipelines.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        self.texture_bind_groups.insert(key, bind_group);
    }

    fn ensure_draw_capacity(&mut self, count: usize) {
        if count <= self.draw_capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        let (buffer, bind_group) = create_draw_buffer(&self.device, &self.pipelines, capacity);
        self.draw_buffer = buffer;
        self.draw_bind_group = bind_group;
        self.draw_capacity = capacity;
    }

    fn encode(
        &self,
        list: &RenderList<'_>,
        target: Option<RenderTarget>,
        format: TextureFormat,
        scissor: Option<ScissorRect>,
        clear_all: bool,
        background: Color,
    ) {
        let (color_view, depth_view) = match target {
            Some(t) => match self.targets.get(&t.id()) {
                Some(gpu) => (&gpu.view, &gpu.depth_view),
                None => return,
            },
            None => match &self.frame_view {
                Some(view) => (view, &self.depth_view),
                None => return,
            },
        };

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let (color_load, depth_load) = if clear_all {
                (
                    wgpu::LoadOp::Clear(wgpu::Color {
                        r: background.r as f64,
                        g: background.g as f64,
                        b: background.b as f64,
                        a: 1.0,
                    }),
                    wgpu::LoadOp::Clear(1.0),
                )
            } else {
                (wgpu::LoadOp::Load, wgpu::LoadOp::Load)
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(rect) = scissor {
                render_pass.set_viewport(
                    rect.x as f32,
                    rect.y as f32,
                    rect.width as f32,
                    rect.height as f32,
                    0.0,
                    1.0,
                );
                render_pass.set_scissor_rect(rect.x, rect.y, rect.width, rect.height);
            }

            // Later renders into the same output only clear their own region.
            if !clear_all {
                if let Some(pipeline) = self.clears.get(format) {
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(0, &self.clear_bind_group, &[]);
                    render_pass.draw(0..3, 0..1);
                }
            }

            render_pass.set_bind_group(0, &self.pass_bind_group, &[]);

            for (i, item) in list.iter().enumerate() {
                let key = PipelineKey::new(item.geometry.topology(), item.material, format);
                let (Some(pipeline), Some(mesh)) = (self.pipelines.get(&key), self.meshes.get(&item.geometry.id())) else {
                    continue;
                };
                let (start, count) = item.range;
                if count == 0 {
                    continue;
                }

                let texture_group = item
                    .material
                    .map
                    .and_then(|slot| match slot.source {
                        // A target cannot be sampled while it is being drawn into.
                        TextureSource::RenderTarget(t) if Some(t) == target => None,
                        source => self.texture_bind_groups.get(&(source, slot.wrap, slot.filter)),
                    })
                    .unwrap_or(&self.default_bind_group);

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, &self.draw_bind_group, &[(i as u64 * DRAW_UNIFORM_STRIDE) as u32]);
                render_pass.set_bind_group(2, texture_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(start..start + count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl Renderer for GpuRenderer {
    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.config.width, self.config.height)
    }

    fn resize(&mut self, size: SurfaceSize) {
        if !size.is_valid() {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.reconfigure();
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.in_frame = true;
        self.skip_frame = false;
        self.cleared.clear();
        self.current_target = None;
        self.scissor = None;

        match self.surface.get_current_texture() {
            Ok(frame) => {
                self.frame_view = Some(frame.texture.create_view(&wgpu::TextureViewDescriptor::default()));
                self.frame = Some(frame);
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.in_frame = false;
                Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory))
            }
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("surface {err}, reconfiguring");
                self.reconfigure();
                self.skip_frame = true;
                Ok(())
            }
            Err(err) => {
                log::warn!("skipping frame: {err}");
                self.skip_frame = true;
                Ok(())
            }
        }
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        if !self.in_frame {
            return Err(RenderError::FrameNotStarted);
        }
        self.in_frame = false;
        self.frame_view = None;
        if let Some(frame) = self.frame.take() {
            frame.present();
        }
        Ok(())
    }

    fn set_render_target(&mut self, target: Option<RenderTarget>) {
        self.current_target = target;
    }

    fn set_scissor(&mut self, scissor: Option<ScissorRect>) {
        self.scissor = scissor;
    }

    fn upload_image(&mut self, key: TextureKey, image: &RgbaImage) {
        let size = image.dimensions();
        if size.0 == 0 || size.1 == 0 {
            log::warn!("ignoring empty image for {key:?}");
            return;
        }
        if let Some(existing) = self.textures.get(&key) {
            if existing.size == size {
                write_texture(&self.queue, &existing.texture, image);
                return;
            }
        }

        let texture = create_texture(&self.device, &self.queue, image);
        self.textures.insert(key, texture);

        let source = match key {
            TextureKey::Asset(id) => TextureSource::Asset(id),
            TextureKey::Stream(id) => TextureSource::Stream(id),
        };
        self.texture_bind_groups.retain(|(s, _, _), _| *s != source);
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError> {
        if !self.in_frame {
            return Err(RenderError::FrameNotStarted);
        }
        if self.skip_frame {
            return Ok(());
        }

        let target = self.current_target;
        let (format, size) = match target {
            Some(t) => {
                self.ensure_target(t);
                (COLOR_FORMAT, t.size())
            }
            None => (self.config.format, self.size()),
        };
        let scissor = match self.scissor {
            Some(rect) => {
                let rect = rect.to_top_left(size);
                if rect.width == 0 || rect.height == 0 {
                    return Ok(());
                }
                Some(rect)
            }
            None => None,
        };

        let list = RenderList::build(scene, camera.view_matrix(scene));

        // Create everything the draws need before encoding.
        for item in list.iter() {
            self.ensure_mesh(item.geometry);
            self.pipelines
                .prepare(&self.device, PipelineKey::new(item.geometry.topology(), item.material, format));
            if let Some(slot) = item.material.map {
                self.ensure_binding(slot);
            }
        }
        self.clears.prepare(&self.device, format);
        self.ensure_draw_capacity(list.len());

        self.queue
            .write_buffer(&self.pass_buffer, 0, bytemuck::bytes_of(&PassUniforms::new(scene, camera)));

        if !list.is_empty() {
            let stride = DRAW_UNIFORM_STRIDE as usize;
            let mut bytes = vec![0u8; list.len() * stride];
            for (i, item) in list.iter().enumerate() {
                let uniforms = DrawUniforms::new(item);
                let data = bytemuck::bytes_of(&uniforms);
                bytes[i * stride..i * stride + data.len()].copy_from_slice(data);
            }
            self.queue.write_buffer(&self.draw_buffer, 0, &bytes);
        }

        let background = scene.background.unwrap_or(Color::BLACK);
        let clear_all = self.cleared.insert(target.map(|t| t.id()));
        if !clear_all {
            self.queue.write_buffer(
                &self.clear_buffer,
                0,
                bytemuck::cast_slice(&[background.r, background.g, background.b, 1.0]),
            );
        }

        self.encode(&list, target, format, scissor, clear_all, background);
        Ok(())
    }
}

fn create_depth_view(device: &Device, width: u32, height: u32) -> TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_draw_buffer(device: &Device, pipelines: &MeshPipelines, capacity: usize) -> (Buffer, BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("draw_uniform_buffer"),
        size: capacity as u64 * DRAW_UNIFORM_STRIDE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("draw_bind_group"),
        layout: &pipelines.draw_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}

fn create_texture(device: &Device, queue: &Queue, image: &RgbaImage) -> GpuTexture {
    let (width, height) = image.dimensions();
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("image_texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_texture(queue, &texture, image);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        texture,
        view,
        size: (width, height),
    }
}

fn write_texture(queue: &Queue, texture: &Texture, image: &RgbaImage) {
    let (width, height) = image.dimensions();
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

fn create_sampler(device: &Device, wrap: Wrap, filter: Filter) -> Sampler {
    let address_mode = match wrap {
        Wrap::Clamp => wgpu::AddressMode::ClampToEdge,
        Wrap::Repeat => wgpu::AddressMode::Repeat,
    };
    let mag_filter = match filter {
        Filter::Nearest => wgpu::FilterMode::Nearest,
        Filter::Linear => wgpu::FilterMode::Linear,
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("texture_sampler"),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}
