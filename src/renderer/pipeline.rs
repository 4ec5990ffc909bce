// Pipeline construction and caching for the wgpu backend

use std::collections::HashMap;
use std::num::NonZeroU64;

use wgpu::{BindGroupLayout, Device, PipelineLayout, RenderPipeline, ShaderModule, TextureFormat};

use super::uniforms::{DrawUniforms, PassUniforms};
use crate::geometry::{Topology, Vertex};
use crate::material::{Material, Side};

const MESH_SHADER: &str = include_str!("shaders/mesh.wgsl");
const CLEAR_SHADER: &str = include_str!("shaders/clear.wgsl");

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Render state that requires a distinct pipeline object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub topology: Topology,
    pub side: Side,
    pub blended: bool,
    pub depth_test: bool,
    pub depth_write: bool,
    pub format: TextureFormat,
}

impl PipelineKey {
    pub fn new(topology: Topology, material: &Material, format: TextureFormat) -> Self {
        Self {
            topology,
            side: material.side,
            blended: material.transparent,
            depth_test: material.depth_test,
            depth_write: material.depth_write,
            format,
        }
    }
}

fn uniform_entry(dynamic: bool, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

/// Mesh shader, its bind group layouts and one pipeline per render state.
pub struct MeshPipelines {
    shader: ShaderModule,
    layout: PipelineLayout,
    pub pass_layout: BindGroupLayout,
    pub draw_layout: BindGroupLayout,
    pub texture_layout: BindGroupLayout,
    cache: HashMap<PipelineKey, RenderPipeline>,
}

impl MeshPipelines {
    pub fn new(device: &Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(MESH_SHADER.into()),
        });

        // Camera and lights (group 0)
        let pass_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pass_bind_group_layout"),
            entries: &[uniform_entry(false, std::mem::size_of::<PassUniforms>())],
        });

        // Per-draw uniforms (group 1), one dynamic offset per draw
        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_bind_group_layout"),
            entries: &[uniform_entry(true, std::mem::size_of::<DrawUniforms>())],
        });

        // Color map (group 2)
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&pass_layout, &draw_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        Self {
            shader,
            layout,
            pass_layout,
            draw_layout,
            texture_layout,
            cache: HashMap::new(),
        }
    }

    /// Creates the pipeline for `key` if it does not exist yet.
    pub fn prepare(&mut self, device: &Device, key: PipelineKey) {
        if self.cache.contains_key(&key) {
            return;
        }
        log::debug!("creating mesh pipeline {key:?}");
        let pipeline = self.create(device, key);
        self.cache.insert(key, pipeline);
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&RenderPipeline> {
        self.cache.get(key)
    }

    fn create(&self, device: &Device, key: PipelineKey) -> RenderPipeline {
        let (topology, cull_mode) = match key.topology {
            Topology::Lines => (wgpu::PrimitiveTopology::LineList, None),
            Topology::Triangles => (
                wgpu::PrimitiveTopology::TriangleList,
                match key.side {
                    Side::Front => Some(wgpu::Face::Back),
                    Side::Back => Some(wgpu::Face::Front),
                    Side::Double => None,
                },
            ),
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: "vs_main",
                buffers: &[Vertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.format,
                    blend: key.blended.then_some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.depth_write,
                depth_compare: if key.depth_test {
                    wgpu::CompareFunction::LessEqual
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        })
    }
}

/// Scissored clear: resets color and depth inside the current scissor only.
pub struct ClearPipelines {
    shader: ShaderModule,
    layout: PipelineLayout,
    pub bind_group_layout: BindGroupLayout,
    cache: HashMap<TextureFormat, RenderPipeline>,
}

impl ClearPipelines {
    pub fn new(device: &Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("clear_shader"),
            source: wgpu::ShaderSource::Wgsl(CLEAR_SHADER.into()),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("clear_bind_group_layout"),
            entries: &[uniform_entry(false, std::mem::size_of::<[f32; 4]>())],
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("clear_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        Self {
            shader,
            layout,
            bind_group_layout,
            cache: HashMap::new(),
        }
    }

    pub fn prepare(&mut self, device: &Device, format: TextureFormat) {
        if self.cache.contains_key(&format) {
            return;
        }
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("clear_pipeline"),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: "vs_main",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });
        self.cache.insert(format, pipeline);
    }

    pub fn get(&self, format: TextureFormat) -> Option<&RenderPipeline> {
        self.cache.get(&format)
    }
}
