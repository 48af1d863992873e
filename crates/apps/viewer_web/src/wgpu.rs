#[cfg(target_arch = "wasm32")]
mod imp {
    use ::wgpu::util::DeviceExt;
    use gpu::{MeshKey, RenderBackend, RenderError, RenderFrame, TextureData};
    use scene::components::Side;
    use scene::mesh::MeshData;
    use scene::world::TextureId;
    use std::borrow::Cow;
    use std::collections::HashMap;
    use std::num::NonZeroU64;
    use tracing::{debug, info};
    use wasm_bindgen::JsCast;

    const SCENE_SHADER: &str = r#"
struct Draw {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> draw: Draw;

@group(1) @binding(0)
var tex: texture_2d<f32>;
@group(1) @binding(1)
var samp: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_mesh(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> VsOut {
    // Mesh v runs bottom to top; image rows run top to bottom.
    return VsOut(
        draw.view_proj * draw.model * vec4<f32>(position, 1.0),
        vec2<f32>(uv.x, 1.0 - uv.y),
    );
}

@fragment
fn fs_mesh(fs_in: VsOut) -> @location(0) vec4<f32> {
    return draw.color * textureSample(tex, samp, fs_in.uv);
}

@vertex
fn vs_point(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return draw.view_proj * vec4<f32>(position, 1.0);
}

@fragment
fn fs_point() -> @location(0) vec4<f32> {
    return draw.color;
}
"#;

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Vertex {
        position: [f32; 3],
        uv: [f32; 2],
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct DrawUniforms {
        view_proj: [[f32; 4]; 4],
        model: [[f32; 4]; 4],
        color: [f32; 4],
    }

    const DRAW_UNIFORMS_SIZE: u64 = std::mem::size_of::<DrawUniforms>() as u64;
    const IDENTITY: [[f32; 4]; 4] = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];

    struct GpuMesh {
        vertex_buffer: ::wgpu::Buffer,
        index_buffer: ::wgpu::Buffer,
        index_count: u32,
    }

    /// Pipelines indexed by `[side][translucent]`.
    struct MeshPipelines([[::wgpu::RenderPipeline; 2]; 2]);

    impl MeshPipelines {
        fn get(&self, side: Side, translucent: bool) -> &::wgpu::RenderPipeline {
            let s = match side {
                Side::Front => 0,
                Side::Back => 1,
            };
            &self.0[s][translucent as usize]
        }
    }

    struct Gpu {
        surface: ::wgpu::Surface<'static>,
        device: ::wgpu::Device,
        queue: ::wgpu::Queue,
        config: ::wgpu::SurfaceConfiguration,
        depth_view: ::wgpu::TextureView,
        mesh_pipelines: MeshPipelines,
        point_pipeline: ::wgpu::RenderPipeline,
        draw_layout: ::wgpu::BindGroupLayout,
        texture_layout: ::wgpu::BindGroupLayout,
        sampler: ::wgpu::Sampler,
        draw_buffer: ::wgpu::Buffer,
        draw_bind_group: ::wgpu::BindGroup,
        draw_stride: u64,
        draw_capacity: u64,
        fallback_texture: ::wgpu::BindGroup,
        textures: HashMap<TextureId, ::wgpu::BindGroup>,
        meshes: HashMap<MeshKey, GpuMesh>,
        point_buffer: ::wgpu::Buffer,
        point_capacity: u64,
    }

    /// Draws [`RenderFrame`]s into a canvas through wgpu.
    pub struct WgpuBackend {
        _instance: &'static ::wgpu::Instance,
        _canvas: web_sys::HtmlCanvasElement,
        gpu: Option<Gpu>,
    }

    impl std::fmt::Debug for WgpuBackend {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("WgpuBackend")
                .field("disposed", &self.gpu.is_none())
                .finish()
        }
    }

    fn create_depth_view(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
    ) -> ::wgpu::TextureView {
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("moonlinks-depth"),
            size: ::wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: ::wgpu::TextureFormat::Depth24Plus,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        tex.create_view(&::wgpu::TextureViewDescriptor::default())
    }

    fn create_draw_buffer(
        device: &::wgpu::Device,
        layout: &::wgpu::BindGroupLayout,
        stride: u64,
        capacity: u64,
    ) -> (::wgpu::Buffer, ::wgpu::BindGroup) {
        let buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("moonlinks-draws"),
            size: stride * capacity.max(1),
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("moonlinks-draws-bg"),
            layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: ::wgpu::BindingResource::Buffer(::wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(DRAW_UNIFORMS_SIZE),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_point_buffer(device: &::wgpu::Device, capacity: u64) -> ::wgpu::Buffer {
        device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("moonlinks-points"),
            size: (capacity.max(1) * 12).next_multiple_of(::wgpu::COPY_BUFFER_ALIGNMENT),
            usage: ::wgpu::BufferUsages::VERTEX | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn texture_bind_group(
        device: &::wgpu::Device,
        queue: &::wgpu::Queue,
        layout: &::wgpu::BindGroupLayout,
        sampler: &::wgpu::Sampler,
        data: &TextureData,
    ) -> ::wgpu::BindGroup {
        let size = ::wgpu::Extent3d {
            width: data.width(),
            height: data.height(),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("moonlinks-texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: ::wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: ::wgpu::TextureUsages::TEXTURE_BINDING | ::wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            ::wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: ::wgpu::Origin3d::ZERO,
                aspect: ::wgpu::TextureAspect::All,
            },
            data.rgba(),
            ::wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * data.width()),
                rows_per_image: Some(data.height()),
            },
            size,
        );
        let view = texture.create_view(&::wgpu::TextureViewDescriptor::default());
        device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("moonlinks-texture-bg"),
            layout,
            entries: &[
                ::wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ::wgpu::BindingResource::TextureView(&view),
                },
                ::wgpu::BindGroupEntry {
                    binding: 1,
                    resource: ::wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn mesh_pipeline(
        device: &::wgpu::Device,
        layout: &::wgpu::PipelineLayout,
        shader: &::wgpu::ShaderModule,
        format: ::wgpu::TextureFormat,
        side: Side,
        translucent: bool,
    ) -> ::wgpu::RenderPipeline {
        let cull_mode = match side {
            Side::Front => ::wgpu::Face::Back,
            Side::Back => ::wgpu::Face::Front,
        };
        device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some("moonlinks-mesh-pipeline"),
            layout: Some(layout),
            vertex: ::wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_mesh"),
                compilation_options: Default::default(),
                buffers: &[::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x2,
                            offset: 12,
                            shader_location: 1,
                        },
                    ],
                }],
            },
            fragment: Some(::wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_mesh"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format,
                    blend: Some(if translucent {
                        ::wgpu::BlendState::ALPHA_BLENDING
                    } else {
                        ::wgpu::BlendState::REPLACE
                    }),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                cull_mode: Some(cull_mode),
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // Translucent draws test against opaque depth but never write it.
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: ::wgpu::TextureFormat::Depth24Plus,
                depth_write_enabled: !translucent,
                depth_compare: ::wgpu::CompareFunction::Less,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    impl WgpuBackend {
        pub async fn from_canvas_id(canvas_id: &str) -> Result<Self, RenderError> {
            let surface_err = |msg: String| RenderError::Surface(msg);
            let window = web_sys::window().ok_or_else(|| surface_err("window missing".into()))?;
            let document = window
                .document()
                .ok_or_else(|| surface_err("document missing".into()))?;
            let canvas = document
                .get_element_by_id(canvas_id)
                .ok_or_else(|| surface_err(format!("canvas #{canvas_id} missing")))?
                .dyn_into::<web_sys::HtmlCanvasElement>()
                .map_err(|_| surface_err(format!("#{canvas_id} is not a canvas")))?;

            // `wgpu::Surface` must not outlive its `wgpu::Instance`, so the
            // instance lives for the rest of the page.
            let instance: &'static ::wgpu::Instance = Box::leak(Box::new(::wgpu::Instance::new(
                &::wgpu::InstanceDescriptor {
                    backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                    ..Default::default()
                },
            )));

            let surface = instance
                .create_surface(::wgpu::SurfaceTarget::Canvas(canvas.clone()))
                .map_err(|e| surface_err(format!("surface: {e}")))?;

            let adapter = instance
                .request_adapter(&::wgpu::RequestAdapterOptions {
                    power_preference: ::wgpu::PowerPreference::HighPerformance,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .map_err(|e| surface_err(format!("adapter: {e}")))?;

            let limits = ::wgpu::Limits::downlevel_webgl2_defaults();
            let (device, queue) = adapter
                .request_device(&::wgpu::DeviceDescriptor {
                    label: Some("moonlinks-device"),
                    required_features: ::wgpu::Features::empty(),
                    required_limits: limits.clone(),
                    ..Default::default()
                })
                .await
                .map_err(|e| surface_err(format!("device: {e}")))?;

            let caps = surface.get_capabilities(&adapter);
            let format = caps
                .formats
                .iter()
                .copied()
                .find(|f| f.is_srgb())
                .or_else(|| caps.formats.first().copied())
                .ok_or_else(|| surface_err("surface reports no formats".into()))?;
            let alpha_mode = caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

            let config = ::wgpu::SurfaceConfiguration {
                usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: canvas.width().max(1),
                height: canvas.height().max(1),
                desired_maximum_frame_latency: 2,
                present_mode: ::wgpu::PresentMode::Fifo,
                alpha_mode,
                view_formats: vec![],
            };
            surface.configure(&device, &config);
            let depth_view = create_depth_view(&device, &config);

            let shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
                label: Some("moonlinks-scene-shader"),
                source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(SCENE_SHADER)),
            });

            let draw_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("moonlinks-draw-bgl"),
                entries: &[::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: ::wgpu::BindingType::Buffer {
                        ty: ::wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(DRAW_UNIFORMS_SIZE),
                    },
                    count: None,
                }],
            });

            let texture_layout =
                device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                    label: Some("moonlinks-texture-bgl"),
                    entries: &[
                        ::wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: ::wgpu::ShaderStages::FRAGMENT,
                            ty: ::wgpu::BindingType::Texture {
                                sample_type: ::wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: ::wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        ::wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: ::wgpu::ShaderStages::FRAGMENT,
                            ty: ::wgpu::BindingType::Sampler(::wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                });

            let mesh_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
                label: Some("moonlinks-mesh-pipeline-layout"),
                bind_group_layouts: &[&draw_layout, &texture_layout],
                immediate_size: 0,
            });
            let point_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
                label: Some("moonlinks-point-pipeline-layout"),
                bind_group_layouts: &[&draw_layout],
                immediate_size: 0,
            });

            let mesh_pipelines = MeshPipelines([
                [
                    mesh_pipeline(&device, &mesh_layout, &shader, format, Side::Front, false),
                    mesh_pipeline(&device, &mesh_layout, &shader, format, Side::Front, true),
                ],
                [
                    mesh_pipeline(&device, &mesh_layout, &shader, format, Side::Back, false),
                    mesh_pipeline(&device, &mesh_layout, &shader, format, Side::Back, true),
                ],
            ]);

            let point_pipeline = device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
                label: Some("moonlinks-point-pipeline"),
                layout: Some(&point_layout),
                vertex: ::wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_point"),
                    compilation_options: Default::default(),
                    buffers: &[::wgpu::VertexBufferLayout {
                        array_stride: 12,
                        step_mode: ::wgpu::VertexStepMode::Vertex,
                        attributes: &[::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        }],
                    }],
                },
                fragment: Some(::wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_point"),
                    compilation_options: Default::default(),
                    targets: &[Some(::wgpu::ColorTargetState {
                        format,
                        blend: Some(::wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: ::wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: ::wgpu::PrimitiveState {
                    topology: ::wgpu::PrimitiveTopology::PointList,
                    strip_index_format: None,
                    front_face: ::wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: ::wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(::wgpu::DepthStencilState {
                    format: ::wgpu::TextureFormat::Depth24Plus,
                    depth_write_enabled: false,
                    depth_compare: ::wgpu::CompareFunction::LessEqual,
                    stencil: ::wgpu::StencilState::default(),
                    bias: ::wgpu::DepthBiasState::default(),
                }),
                multisample: ::wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

            let sampler = device.create_sampler(&::wgpu::SamplerDescriptor {
                label: Some("moonlinks-sampler"),
                address_mode_u: ::wgpu::AddressMode::Repeat,
                address_mode_v: ::wgpu::AddressMode::ClampToEdge,
                mag_filter: ::wgpu::FilterMode::Linear,
                min_filter: ::wgpu::FilterMode::Linear,
                ..Default::default()
            });
            let fallback_texture = texture_bind_group(
                &device,
                &queue,
                &texture_layout,
                &sampler,
                &TextureData::solid([255, 255, 255, 255]),
            );

            let draw_stride = DRAW_UNIFORMS_SIZE
                .next_multiple_of(limits.min_uniform_buffer_offset_alignment as u64);
            let draw_capacity = 16;
            let (draw_buffer, draw_bind_group) =
                create_draw_buffer(&device, &draw_layout, draw_stride, draw_capacity);
            let point_capacity = 512;
            let point_buffer = create_point_buffer(&device, point_capacity);

            info!(width = config.width, height = config.height, ?format, "wgpu ready");
            Ok(Self {
                _instance: instance,
                _canvas: canvas,
                gpu: Some(Gpu {
                    surface,
                    device,
                    queue,
                    config,
                    depth_view,
                    mesh_pipelines,
                    point_pipeline,
                    draw_layout,
                    texture_layout,
                    sampler,
                    draw_buffer,
                    draw_bind_group,
                    draw_stride,
                    draw_capacity,
                    fallback_texture,
                    textures: HashMap::new(),
                    meshes: HashMap::new(),
                    point_buffer,
                    point_capacity,
                }),
            })
        }
    }

    impl Gpu {
        fn reserve_draws(&mut self, count: u64) {
            if count <= self.draw_capacity {
                return;
            }
            let capacity = count.next_power_of_two();
            let (buffer, bind_group) =
                create_draw_buffer(&self.device, &self.draw_layout, self.draw_stride, capacity);
            self.draw_buffer = buffer;
            self.draw_bind_group = bind_group;
            self.draw_capacity = capacity;
        }

        fn reserve_points(&mut self, count: u64) {
            if count <= self.point_capacity {
                return;
            }
            let capacity = count.next_power_of_two();
            self.point_buffer = create_point_buffer(&self.device, capacity);
            self.point_capacity = capacity;
        }
    }

    impl RenderBackend for WgpuBackend {
        fn resize(&mut self, width: u32, height: u32) {
            let Some(gpu) = self.gpu.as_mut() else {
                return;
            };
            gpu.config.width = width.max(1);
            gpu.config.height = height.max(1);
            gpu.surface.configure(&gpu.device, &gpu.config);
            gpu.depth_view = create_depth_view(&gpu.device, &gpu.config);
        }

        fn upload_mesh(&mut self, key: MeshKey, mesh: &MeshData) -> Result<(), RenderError> {
            let gpu = self.gpu.as_mut().ok_or(RenderError::Disposed)?;
            let vertices: Vec<Vertex> = mesh
                .positions
                .iter()
                .zip(&mesh.uvs)
                .map(|(position, uv)| Vertex {
                    position: *position,
                    uv: *uv,
                })
                .collect();
            let vertex_buffer = gpu
                .device
                .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                    label: Some("moonlinks-mesh-vertices"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: ::wgpu::BufferUsages::VERTEX,
                });
            let index_buffer = gpu
                .device
                .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                    label: Some("moonlinks-mesh-indices"),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: ::wgpu::BufferUsages::INDEX,
                });
            debug!(?key, vertices = vertices.len(), "mesh uploaded");
            gpu.meshes.insert(
                key,
                GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                },
            );
            Ok(())
        }

        fn upload_texture(
            &mut self,
            id: TextureId,
            texture: &TextureData,
        ) -> Result<(), RenderError> {
            let gpu = self.gpu.as_mut().ok_or(RenderError::Disposed)?;
            let bind_group = texture_bind_group(
                &gpu.device,
                &gpu.queue,
                &gpu.texture_layout,
                &gpu.sampler,
                texture,
            );
            gpu.textures.insert(id, bind_group);
            Ok(())
        }

        fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError> {
            let gpu = self.gpu.as_mut().ok_or(RenderError::Disposed)?;
            for draw in &frame.meshes {
                if !gpu.meshes.contains_key(&draw.mesh) {
                    return Err(RenderError::MissingMesh(draw.mesh));
                }
            }

            // One uniform slot per mesh, plus one for the point cloud.
            let slots = frame.meshes.len() as u64 + 1;
            gpu.reserve_draws(slots);
            let stride = gpu.draw_stride as usize;
            let mut staging = vec![0u8; stride * slots as usize];
            for (i, draw) in frame.meshes.iter().enumerate() {
                let uniforms = DrawUniforms {
                    view_proj: frame.view_proj,
                    model: draw.model,
                    color: draw.material.color,
                };
                staging[i * stride..i * stride + DRAW_UNIFORMS_SIZE as usize]
                    .copy_from_slice(bytemuck::bytes_of(&uniforms));
            }
            let point_slot = frame.meshes.len() * stride;
            let point_uniforms = DrawUniforms {
                view_proj: frame.view_proj,
                model: IDENTITY,
                color: frame.point_color,
            };
            staging[point_slot..point_slot + DRAW_UNIFORMS_SIZE as usize]
                .copy_from_slice(bytemuck::bytes_of(&point_uniforms));
            gpu.queue.write_buffer(&gpu.draw_buffer, 0, &staging);

            if !frame.points.is_empty() {
                gpu.reserve_points(frame.points.len() as u64);
                gpu.queue
                    .write_buffer(&gpu.point_buffer, 0, bytemuck::cast_slice(&frame.points));
            }

            let surface_texture = gpu
                .surface
                .get_current_texture()
                .map_err(|e| RenderError::Surface(format!("acquire failed: {e}")))?;
            let view = surface_texture
                .texture
                .create_view(&::wgpu::TextureViewDescriptor::default());

            let mut encoder = gpu
                .device
                .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                    label: Some("moonlinks-frame-encoder"),
                });
            {
                let [r, g, b, a] = frame.clear_color;
                let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                    label: Some("moonlinks-scene-pass"),
                    color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: ::wgpu::Operations {
                            load: ::wgpu::LoadOp::Clear(::wgpu::Color {
                                r: r as f64,
                                g: g as f64,
                                b: b as f64,
                                a: a as f64,
                            }),
                            store: ::wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                        view: &gpu.depth_view,
                        depth_ops: Some(::wgpu::Operations {
                            load: ::wgpu::LoadOp::Clear(1.0),
                            store: ::wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                    multiview_mask: None,
                });

                let draw_mesh = |rpass: &mut ::wgpu::RenderPass<'_>, i: usize| {
                    let draw = &frame.meshes[i];
                    let Some(mesh) = gpu.meshes.get(&draw.mesh) else {
                        return;
                    };
                    let texture = draw
                        .material
                        .texture
                        .and_then(|id| gpu.textures.get(&id))
                        .unwrap_or(&gpu.fallback_texture);
                    rpass.set_pipeline(
                        gpu.mesh_pipelines
                            .get(draw.material.side, draw.material.is_translucent()),
                    );
                    rpass.set_bind_group(0, &gpu.draw_bind_group, &[(i * stride) as u32]);
                    rpass.set_bind_group(1, texture, &[]);
                    rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    rpass.set_index_buffer(mesh.index_buffer.slice(..), ::wgpu::IndexFormat::Uint32);
                    rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
                };

                let opaque = frame
                    .meshes
                    .iter()
                    .take_while(|d| !d.material.is_translucent())
                    .count();
                for i in 0..opaque {
                    draw_mesh(&mut rpass, i);
                }

                if !frame.points.is_empty() {
                    rpass.set_pipeline(&gpu.point_pipeline);
                    rpass.set_bind_group(0, &gpu.draw_bind_group, &[point_slot as u32]);
                    rpass.set_vertex_buffer(0, gpu.point_buffer.slice(..));
                    rpass.draw(0..frame.points.len() as u32, 0..1);
                }

                for i in opaque..frame.meshes.len() {
                    draw_mesh(&mut rpass, i);
                }
            }

            gpu.queue.submit(std::iter::once(encoder.finish()));
            surface_texture.present();
            Ok(())
        }

        fn dispose(&mut self) {
            if let Some(gpu) = self.gpu.take() {
                gpu.device.destroy();
                info!("wgpu resources released");
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use gpu::{MeshKey, RenderBackend, RenderError, RenderFrame, TextureData};
    use scene::mesh::MeshData;
    use scene::world::TextureId;

    #[derive(Debug, Default)]
    pub struct WgpuBackend;

    fn unavailable() -> RenderError {
        RenderError::Surface("wgpu rendering is only available on wasm32 targets".to_string())
    }

    impl WgpuBackend {
        pub async fn from_canvas_id(_canvas_id: &str) -> Result<Self, RenderError> {
            Err(unavailable())
        }
    }

    impl RenderBackend for WgpuBackend {
        fn resize(&mut self, _width: u32, _height: u32) {}

        fn upload_mesh(&mut self, _key: MeshKey, _mesh: &MeshData) -> Result<(), RenderError> {
            Err(unavailable())
        }

        fn upload_texture(
            &mut self,
            _id: TextureId,
            _texture: &TextureData,
        ) -> Result<(), RenderError> {
            Err(unavailable())
        }

        fn render(&mut self, _frame: &RenderFrame) -> Result<(), RenderError> {
            Err(unavailable())
        }

        fn dispose(&mut self) {}
    }
}

pub use imp::WgpuBackend;
