//! wgpu backend for line draw commands.
//!
//! Draws are recorded during `draw_line`, their uniform snapshots are uploaded in
//! one `flush` and replayed into a render pass by `encode`. Uniform blocks live in
//! a single buffer addressed with dynamic offsets.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU64;

use atlas::{DashAtlas, LineAtlas};
use bytemuck::{Pod, Zeroable};
use line_protocol::{
    ColorMode, CompareFunction, DepthMask, DepthMode, GradientRamp, IDENTITY_MATRIX,
    IndexBufferHandle, ProgramId, TextureHandle, TransformMatrix4x4, VertexBufferHandle,
};
use slotmap::SlotMap;
use static_assertions::const_assert_eq;
use wgpu::util::DeviceExt;

use crate::emitter::{
    ImageBinding, LineCommandSink, LineDrawCommand, SubmitError, TextureFilter, TextureWrap,
    TileDrawParams,
};
use crate::tile::{ProgramConfiguration, Segment};
use crate::variant::ProgramVariant;

pub const LINE_SHADER_SOURCE: &str = include_str!("line.wgsl");

const INITIAL_UNIFORM_CAPACITY: usize = 64;

/// Tessellated line vertex: packed position/normal and extrusion/distance bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct LineVertexGpu {
    pub pos_normal: [i16; 2],
    pub data: [u8; 4],
}

const_assert_eq!(std::mem::size_of::<LineVertexGpu>(), 8);

const LINE_VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Sint16x2, 1 => Uint8x4];

/// Mirror of `LineUniforms` in `line.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineUniformsGpu {
    pub pos_matrix: TransformMatrix4x4,
    pub color: [f32; 4],
    pub pattern_from: [f32; 4],
    pub pattern_to: [f32; 4],
    pub pattern_scale: [f32; 4],
    pub patternscale_a: [f32; 2],
    pub patternscale_b: [f32; 2],
    pub units_to_pixels: [f32; 2],
    pub texsize: [f32; 2],
    pub ratio: f32,
    pub opacity: f32,
    pub width: f32,
    pub gapwidth: f32,
    pub line_offset: f32,
    pub blur: f32,
    pub sdfgamma: f32,
    pub tex_y_a: f32,
    pub tex_y_b: f32,
    pub mix_factor: f32,
    pub fade: f32,
    pub device_pixel_ratio: f32,
}

const_assert_eq!(std::mem::size_of::<LineUniformsGpu>(), 208);
const_assert_eq!(std::mem::size_of::<LineUniformsGpu>() % 16, 0);

impl Default for LineUniformsGpu {
    fn default() -> Self {
        Self {
            pos_matrix: IDENTITY_MATRIX,
            color: [0.0, 0.0, 0.0, 1.0],
            pattern_from: [0.0; 4],
            pattern_to: [0.0; 4],
            pattern_scale: [1.0; 4],
            patternscale_a: [1.0, 0.0],
            patternscale_b: [1.0, 0.0],
            units_to_pixels: [1.0, 1.0],
            texsize: [1.0, 1.0],
            ratio: 1.0,
            opacity: 1.0,
            width: 1.0,
            gapwidth: 0.0,
            line_offset: 0.0,
            blur: 0.0,
            sdfgamma: 0.0,
            tex_y_a: 0.0,
            tex_y_b: 0.0,
            mix_factor: 0.0,
            fade: 1.0,
            device_pixel_ratio: 1.0,
        }
    }
}

impl LineUniformsGpu {
    /// Overwrites the values `params` carries and keeps the rest.
    pub fn apply(&mut self, params: &TileDrawParams) {
        if let Some(paint) = params.paint {
            self.color = paint.color;
            self.opacity = paint.opacity;
            self.width = paint.width;
            self.gapwidth = paint.gap_width;
            self.line_offset = paint.offset;
            self.blur = paint.blur;
        }
        if let Some(ratio) = params.ratio {
            if let Some(dash) = ratio.dash {
                self.patternscale_a = dash.patternscale_a;
                self.patternscale_b = dash.patternscale_b;
                self.sdfgamma = dash.sdfgamma;
            }
            self.units_to_pixels = ratio.units_to_pixels;
            self.device_pixel_ratio = ratio.device_pixel_ratio;
        }
        if let Some(dash_texture) = params.dash_texture {
            self.tex_y_a = dash_texture.tex_y_a;
            self.tex_y_b = dash_texture.tex_y_b;
            self.mix_factor = dash_texture.mix;
        }
        if let Some(pattern) = params.pattern {
            if let Some(positions) = pattern.positions {
                self.pattern_from = positions.pattern_from;
                self.pattern_to = positions.pattern_to;
            }
            self.pattern_scale = pattern.scale;
            self.texsize = pattern.texsize;
            self.fade = pattern.fade;
        }
        self.pos_matrix = params.tile.matrix;
        self.ratio = params.tile.ratio;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSinkConfig {
    pub color_format: wgpu::TextureFormat,
    /// Must carry a stencil aspect; tiles are clipped by stencil reference.
    pub depth_stencil_format: wgpu::TextureFormat,
    /// Uniform blocks reserved before the first grow.
    pub initial_uniform_capacity: usize,
}

impl Default for LineSinkConfig {
    fn default() -> Self {
        Self {
            color_format: wgpu::TextureFormat::Bgra8Unorm,
            depth_stencil_format: wgpu::TextureFormat::Depth24PlusStencil8,
            initial_uniform_capacity: INITIAL_UNIFORM_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSinkError {
    MissingStencilAspect(wgpu::TextureFormat),
    UnknownTexture(TextureHandle),
    DataSizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for LineSinkError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSinkError::MissingStencilAspect(format) => {
                write!(formatter, "depth format {format:?} has no stencil aspect")
            }
            LineSinkError::UnknownTexture(handle) => {
                write!(formatter, "unknown texture handle {handle:?}")
            }
            LineSinkError::DataSizeMismatch { expected, actual } => write!(
                formatter,
                "texture data size mismatch: expected {expected} bytes, got {actual}"
            ),
        }
    }
}

impl std::error::Error for LineSinkError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ProgramKey {
    variant: ProgramVariant,
    configuration: u32,
    color_mode: ColorMode,
    depth_compare: CompareFunction,
    depth_mask: DepthMask,
}

struct LineProgram {
    key: ProgramKey,
    /// One pipeline per stencil compare function seen with this program.
    pipelines: HashMap<CompareFunction, wgpu::RenderPipeline>,
}

struct SinkTexture {
    view: wgpu::TextureView,
    texture: wgpu::Texture,
    bind_groups: HashMap<(TextureFilter, TextureWrap), wgpu::BindGroup>,
}

struct RecordedDraw {
    pipeline: wgpu::RenderPipeline,
    image_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    segments: Vec<Segment>,
    uniform_index: u32,
    stencil_reference: u32,
    depth_range: [f32; 2],
}

/// [`LineCommandSink`] that records draws for a wgpu render pass.
pub struct WgpuLineSink {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: LineSinkConfig,
    shader: wgpu::ShaderModule,
    uniform_bind_group_layout: wgpu::BindGroupLayout,
    image_bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    samplers: HashMap<(TextureFilter, TextureWrap), wgpu::Sampler>,
    fallback_image_bind_group: wgpu::BindGroup,
    programs: SlotMap<ProgramId, LineProgram>,
    program_index: HashMap<ProgramKey, ProgramId>,
    textures: SlotMap<TextureHandle, SinkTexture>,
    vertex_buffers: SlotMap<VertexBufferHandle, wgpu::Buffer>,
    index_buffers: SlotMap<IndexBufferHandle, wgpu::Buffer>,
    layer_depth: DepthMode,
    layer_color: ColorMode,
    current_uniforms: LineUniformsGpu,
    current_image: Option<ImageBinding>,
    uniform_stride: u64,
    uniform_capacity: usize,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_snapshots: Vec<LineUniformsGpu>,
    uniform_gpu_staging: Vec<u8>,
    draws: Vec<RecordedDraw>,
}

impl WgpuLineSink {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: LineSinkConfig,
    ) -> Result<Self, LineSinkError> {
        if !config.depth_stencil_format.has_stencil_aspect() {
            return Err(LineSinkError::MissingStencilAspect(
                config.depth_stencil_format,
            ));
        }

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("line_renderer.uniform_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(uniform_block_size()),
                    },
                    count: None,
                }],
            });
        let image_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("line_renderer.image_layout"),
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
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("line_renderer.pipeline_layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &image_bind_group_layout],
            immediate_size: 0,
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_renderer.line"),
            source: wgpu::ShaderSource::Wgsl(LINE_SHADER_SOURCE.into()),
        });

        let mut samplers = HashMap::new();
        for filter in [TextureFilter::Nearest, TextureFilter::Linear] {
            for wrap in [TextureWrap::ClampToEdge, TextureWrap::Repeat] {
                samplers.insert((filter, wrap), create_sampler(&device, filter, wrap));
            }
        }

        let fallback_texture = device.create_texture_with_data(
            &queue,
            &wgpu::TextureDescriptor {
                label: Some("line_renderer.fallback_image"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[255, 255, 255, 255],
        );
        let fallback_view = fallback_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let fallback_image_bind_group = create_image_bind_group(
            &device,
            &image_bind_group_layout,
            &fallback_view,
            &samplers[&(TextureFilter::Nearest, TextureWrap::ClampToEdge)],
            "line_renderer.fallback_image_bind_group",
        );

        let uniform_stride = align_to(
            uniform_block_size(),
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );
        let uniform_capacity = config.initial_uniform_capacity.max(1);
        let uniform_buffer = create_uniform_buffer(&device, uniform_stride, uniform_capacity);
        let uniform_bind_group =
            create_uniform_bind_group(&device, &uniform_bind_group_layout, &uniform_buffer);

        Ok(Self {
            device,
            queue,
            config,
            shader,
            uniform_bind_group_layout,
            image_bind_group_layout,
            pipeline_layout,
            samplers,
            fallback_image_bind_group,
            programs: SlotMap::with_key(),
            program_index: HashMap::new(),
            textures: SlotMap::with_key(),
            vertex_buffers: SlotMap::with_key(),
            index_buffers: SlotMap::with_key(),
            layer_depth: DepthMode::DISABLED,
            layer_color: ColorMode::AlphaBlended,
            current_uniforms: LineUniformsGpu::default(),
            current_image: None,
            uniform_stride,
            uniform_capacity,
            uniform_buffer,
            uniform_bind_group,
            uniform_snapshots: Vec::new(),
            uniform_gpu_staging: Vec::new(),
            draws: Vec::new(),
        })
    }

    pub fn config(&self) -> LineSinkConfig {
        self.config
    }

    pub fn recorded_draw_count(&self) -> usize {
        self.draws.len()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Drops the draws recorded for the previous frame.
    pub fn begin_frame(&mut self) {
        self.draws.clear();
        self.uniform_snapshots.clear();
    }

    pub fn create_vertex_buffer(&mut self, vertices: &[LineVertexGpu]) -> VertexBufferHandle {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("line_renderer.vertices"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.vertex_buffers.insert(buffer)
    }

    pub fn create_index_buffer(&mut self, triangles: &[[u16; 3]]) -> IndexBufferHandle {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("line_renderer.indices"),
                contents: bytemuck::cast_slice(triangles),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.index_buffers.insert(buffer)
    }

    pub fn release_vertex_buffer(&mut self, handle: VertexBufferHandle) -> bool {
        self.vertex_buffers.remove(handle).is_some()
    }

    pub fn release_index_buffer(&mut self, handle: IndexBufferHandle) -> bool {
        self.index_buffers.remove(handle).is_some()
    }

    /// Allocates the single-channel texture backing a [`LineAtlas`].
    pub fn create_dash_atlas_texture(&mut self, width: u32, height: u32) -> TextureHandle {
        self.create_texture(
            width,
            height,
            wgpu::TextureFormat::R8Unorm,
            "line_renderer.dash_atlas",
        )
    }

    /// Uploads the atlas texels if they changed; returns whether anything was written.
    pub fn upload_dash_atlas(&mut self, atlas: &mut LineAtlas) -> Result<bool, LineSinkError> {
        let texture = atlas.texture();
        let (width, height) = (atlas.width(), atlas.height());
        let Some(data) = atlas.take_dirty_data() else {
            return Ok(false);
        };
        self.write_texture(texture, width, height, 1, data)?;
        Ok(true)
    }

    /// Uploads a tile's RGBA8 pattern image atlas.
    pub fn create_image_atlas_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, LineSinkError> {
        let handle = self.create_texture(
            width,
            height,
            wgpu::TextureFormat::Rgba8Unorm,
            "line_renderer.image_atlas",
        );
        if let Err(error) = self.write_texture(handle, width, height, 4, rgba) {
            self.textures.remove(handle);
            return Err(error);
        }
        Ok(handle)
    }

    pub fn release_texture(&mut self, handle: TextureHandle) -> bool {
        self.textures.remove(handle).is_some()
    }

    /// Uploads the uniform blocks of every recorded draw.
    pub fn flush(&mut self) {
        if self.uniform_snapshots.is_empty() {
            return;
        }
        self.ensure_uniform_capacity(self.uniform_snapshots.len());

        let stride = usize::try_from(self.uniform_stride).expect("uniform stride exceeds usize");
        let total_len = stride
            .checked_mul(self.uniform_snapshots.len())
            .expect("uniform staging size overflow");
        self.uniform_gpu_staging.clear();
        self.uniform_gpu_staging.resize(total_len, 0);
        for (index, snapshot) in self.uniform_snapshots.iter().enumerate() {
            let start = index * stride;
            let block = bytemuck::bytes_of(snapshot);
            self.uniform_gpu_staging[start..start + block.len()].copy_from_slice(block);
        }
        self.queue
            .write_buffer(&self.uniform_buffer, 0, &self.uniform_gpu_staging);
    }

    /// Replays the recorded draws. `viewport` is `[x, y, width, height]` in pixels.
    ///
    /// The pass must target `config.color_format` with a depth/stencil attachment
    /// of `config.depth_stencil_format`, and `flush` must have run since the last
    /// recorded draw.
    pub fn encode(&self, pass: &mut wgpu::RenderPass<'_>, viewport: [f32; 4]) {
        let [x, y, width, height] = viewport;
        for draw in &self.draws {
            let uniform_offset = u64::from(draw.uniform_index)
                .checked_mul(self.uniform_stride)
                .and_then(|offset| u32::try_from(offset).ok())
                .expect("uniform offset exceeds u32");
            pass.set_pipeline(&draw.pipeline);
            pass.set_viewport(x, y, width, height, draw.depth_range[0], draw.depth_range[1]);
            pass.set_stencil_reference(draw.stencil_reference);
            pass.set_bind_group(0, &self.uniform_bind_group, &[uniform_offset]);
            pass.set_bind_group(1, &draw.image_bind_group, &[]);
            pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
            pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            for segment in &draw.segments {
                let base_vertex =
                    i32::try_from(segment.vertex_offset).expect("vertex offset exceeds i32");
                pass.draw_indexed(segment.index_range(), base_vertex, 0..1);
            }
        }
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> TextureHandle {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.textures.insert(SinkTexture {
            view,
            texture,
            bind_groups: HashMap::new(),
        })
    }

    fn write_texture(
        &self,
        handle: TextureHandle,
        width: u32,
        height: u32,
        bytes_per_texel: u32,
        data: &[u8],
    ) -> Result<(), LineSinkError> {
        let entry = self
            .textures
            .get(handle)
            .ok_or(LineSinkError::UnknownTexture(handle))?;
        let bytes_per_row = width
            .checked_mul(bytes_per_texel)
            .expect("texture row size overflow");
        let expected = (bytes_per_row as usize)
            .checked_mul(height as usize)
            .expect("texture size overflow");
        if data.len() != expected {
            return Err(LineSinkError::DataSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn image_bind_group(&mut self, binding: ImageBinding) -> Option<wgpu::BindGroup> {
        let entry = self.textures.get_mut(binding.texture)?;
        let sampler = &self.samplers[&(binding.filter, binding.wrap)];
        let bind_group = entry
            .bind_groups
            .entry((binding.filter, binding.wrap))
            .or_insert_with(|| {
                create_image_bind_group(
                    &self.device,
                    &self.image_bind_group_layout,
                    &entry.view,
                    sampler,
                    "line_renderer.image_bind_group",
                )
            });
        Some(bind_group.clone())
    }

    fn pipeline(
        &mut self,
        program: ProgramId,
        stencil_compare: CompareFunction,
    ) -> Option<wgpu::RenderPipeline> {
        let entry = self.programs.get_mut(program)?;
        let key = entry.key;
        let pipeline = entry
            .pipelines
            .entry(stencil_compare)
            .or_insert_with(|| {
                log::debug!(
                    target: "line_renderer::wgpu",
                    "creating pipeline variant={} stencil={stencil_compare:?}",
                    key.variant.label()
                );
                create_line_pipeline(
                    &self.device,
                    &self.pipeline_layout,
                    &self.shader,
                    &self.config,
                    key,
                    stencil_compare,
                )
            });
        Some(pipeline.clone())
    }

    fn ensure_uniform_capacity(&mut self, required_len: usize) {
        if required_len <= self.uniform_capacity {
            return;
        }
        let expanded_capacity = required_len
            .max(INITIAL_UNIFORM_CAPACITY)
            .checked_next_power_of_two()
            .expect("uniform capacity overflow");
        self.uniform_buffer =
            create_uniform_buffer(&self.device, self.uniform_stride, expanded_capacity);
        self.uniform_bind_group = create_uniform_bind_group(
            &self.device,
            &self.uniform_bind_group_layout,
            &self.uniform_buffer,
        );
        self.uniform_capacity = expanded_capacity;
    }
}

impl LineCommandSink for WgpuLineSink {
    fn use_program(
        &mut self,
        variant: ProgramVariant,
        configuration: &ProgramConfiguration,
    ) -> ProgramId {
        let key = ProgramKey {
            variant,
            configuration: configuration.key(),
            color_mode: self.layer_color,
            depth_compare: self.layer_depth.func,
            depth_mask: self.layer_depth.mask,
        };
        if let Some(program) = self.program_index.get(&key) {
            return *program;
        }
        let program = self.programs.insert(LineProgram {
            key,
            pipelines: HashMap::new(),
        });
        self.program_index.insert(key, program);
        program
    }

    fn set_layer_modes(&mut self, depth: DepthMode, color: ColorMode) {
        self.layer_depth = depth;
        self.layer_color = color;
    }

    fn create_gradient_texture(&mut self, ramp: &GradientRamp) -> TextureHandle {
        let handle = self.create_texture(
            ramp.width(),
            1,
            wgpu::TextureFormat::Rgba8Unorm,
            "line_renderer.gradient",
        );
        self.write_texture(handle, ramp.width(), 1, 4, ramp.as_bytes())
            .expect("gradient ramp size matches its texture");
        handle
    }

    fn submit(&mut self, command: &LineDrawCommand<'_>) -> Result<(), SubmitError> {
        let params = command.params;
        self.current_uniforms.apply(params);
        if let Some(image) = params.image {
            self.current_image = Some(image);
        }

        let bucket = command.bucket;
        let vertex_buffer = self
            .vertex_buffers
            .get(bucket.layout_vertex_buffer)
            .cloned()
            .ok_or(SubmitError::UnknownVertexBuffer(bucket.layout_vertex_buffer))?;
        let index_buffer = self
            .index_buffers
            .get(bucket.index_buffer)
            .cloned()
            .ok_or(SubmitError::UnknownIndexBuffer(bucket.index_buffer))?;
        let image_bind_group = match self.current_image {
            Some(image) if params.variant.samples_image() => self
                .image_bind_group(image)
                .ok_or(SubmitError::UnknownTexture(image.texture))?,
            _ => self.fallback_image_bind_group.clone(),
        };
        let pipeline = self
            .pipeline(params.program, params.stencil.func)
            .ok_or(SubmitError::UnknownProgram(params.program))?;

        let uniform_index =
            u32::try_from(self.uniform_snapshots.len()).expect("uniform snapshot count overflow");
        self.uniform_snapshots.push(self.current_uniforms);
        self.draws.push(RecordedDraw {
            pipeline,
            image_bind_group,
            vertex_buffer,
            index_buffer,
            segments: bucket.segments.clone(),
            uniform_index,
            stencil_reference: params.stencil.reference,
            depth_range: self.layer_depth.range,
        });
        Ok(())
    }
}

fn uniform_block_size() -> u64 {
    std::mem::size_of::<LineUniformsGpu>() as u64
}

fn align_to(value: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    value
        .div_ceil(alignment)
        .checked_mul(alignment)
        .expect("aligned size overflow")
}

fn create_uniform_buffer(device: &wgpu::Device, stride: u64, capacity: usize) -> wgpu::Buffer {
    let capacity_u64 = u64::try_from(capacity).expect("uniform capacity exceeds u64");
    let size = stride
        .checked_mul(capacity_u64)
        .expect("uniform buffer size overflow");
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("line_renderer.uniforms"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("line_renderer.uniform_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: NonZeroU64::new(uniform_block_size()),
            }),
        }],
    })
}

fn create_image_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
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
    })
}

fn create_sampler(
    device: &wgpu::Device,
    filter: TextureFilter,
    wrap: TextureWrap,
) -> wgpu::Sampler {
    let filter_mode = match filter {
        TextureFilter::Nearest => wgpu::FilterMode::Nearest,
        TextureFilter::Linear => wgpu::FilterMode::Linear,
    };
    let address_mode = match wrap {
        TextureWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        TextureWrap::Repeat => wgpu::AddressMode::Repeat,
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("line_renderer.sampler"),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        mag_filter: filter_mode,
        min_filter: filter_mode,
        ..Default::default()
    })
}

fn create_line_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    config: &LineSinkConfig,
    key: ProgramKey,
    stencil_compare: CompareFunction,
) -> wgpu::RenderPipeline {
    let (vertex_entry, fragment_entry) = key.variant.entry_points();
    let label = format!("line_renderer.pipeline.{}", key.variant.label());
    let stencil_face = wgpu::StencilFaceState {
        compare: to_wgpu_compare(stencil_compare),
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op: wgpu::StencilOperation::Keep,
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vertex_entry),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<LineVertexGpu>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &LINE_VERTEX_ATTRIBUTES,
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: config.color_format,
                blend: match key.color_mode {
                    ColorMode::AlphaBlended => {
                        Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING)
                    }
                    ColorMode::Unblended => None,
                },
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: config.depth_stencil_format,
            depth_write_enabled: key.depth_mask == DepthMask::ReadWrite,
            depth_compare: to_wgpu_compare(key.depth_compare),
            stencil: wgpu::StencilState {
                front: stencil_face,
                back: stencil_face,
                read_mask: 0xFF,
                write_mask: 0,
            },
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn to_wgpu_compare(func: CompareFunction) -> wgpu::CompareFunction {
    match func {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}
