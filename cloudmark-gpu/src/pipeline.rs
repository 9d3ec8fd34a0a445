use crate::handle::Handle;
use crate::resource_registry::ResourceRegistry;

/// Builder for creating render pipelines from registered shader modules and
/// bind group layouts.
pub struct RenderPipelineBuilder<'a> {
    device: &'a wgpu::Device,
    label: Option<String>,
    vertex_shader: Option<Handle<wgpu::ShaderModule>>,
    fragment_shader: Option<Handle<wgpu::ShaderModule>>,
    bind_group_layouts: Vec<Handle<wgpu::BindGroupLayout>>,
    vertex_buffers: Vec<wgpu::VertexBufferLayout<'static>>,
    primitive: Option<wgpu::PrimitiveState>,
    depth_stencil: Option<wgpu::DepthStencilState>,
    fragment_targets: Vec<Option<wgpu::ColorTargetState>>,
}

impl<'a> RenderPipelineBuilder<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self {
            device,
            label: None,
            vertex_shader: None,
            fragment_shader: None,
            bind_group_layouts: Vec::new(),
            vertex_buffers: Vec::new(),
            primitive: None,
            depth_stencil: None,
            fragment_targets: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_vertex_shader(mut self, shader: Handle<wgpu::ShaderModule>) -> Self {
        self.vertex_shader = Some(shader);
        self
    }

    pub fn with_fragment_shader(mut self, shader: Handle<wgpu::ShaderModule>) -> Self {
        self.fragment_shader = Some(shader);
        self
    }

    /// Append a bind group layout; its position is its group index.
    pub fn with_bind_group_layout(mut self, layout: Handle<wgpu::BindGroupLayout>) -> Self {
        self.bind_group_layouts.push(layout);
        self
    }

    pub fn with_vertex_buffer(mut self, buffer: wgpu::VertexBufferLayout<'static>) -> Self {
        self.vertex_buffers.push(buffer);
        self
    }

    pub fn with_primitive(mut self, primitive: wgpu::PrimitiveState) -> Self {
        self.primitive = Some(primitive);
        self
    }

    pub fn with_depth_stencil(mut self, depth_stencil: wgpu::DepthStencilState) -> Self {
        self.depth_stencil = Some(depth_stencil);
        self
    }

    pub fn with_fragment_target(mut self, target: Option<wgpu::ColorTargetState>) -> Self {
        self.fragment_targets.push(target);
        self
    }

    /// Build the render pipeline and register it in the registry
    pub fn build(
        self,
        registry: &mut ResourceRegistry,
    ) -> Result<Handle<wgpu::RenderPipeline>, PipelineBuildError> {
        let vertex_handle = self
            .vertex_shader
            .ok_or(PipelineBuildError::MissingVertexShader)?;
        let vertex_shader = registry
            .get(vertex_handle)
            .ok_or(PipelineBuildError::ShaderNotFound)?;

        let fragment_shader = match self.fragment_shader {
            Some(h) => Some(registry.get(h).ok_or(PipelineBuildError::ShaderNotFound)?),
            None => None,
        };

        let bind_group_layouts = self
            .bind_group_layouts
            .iter()
            .map(|h| registry.get(*h).ok_or(PipelineBuildError::LayoutNotFound))
            .collect::<Result<Vec<_>, _>>()?;

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: self.label.as_deref(),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: self.label.as_deref(),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex_shader,
                    entry_point: Some("vs_main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &self.vertex_buffers,
                },
                primitive: self.primitive.unwrap_or_default(),
                depth_stencil: self.depth_stencil,
                multisample: wgpu::MultisampleState::default(),
                fragment: fragment_shader.map(|shader| wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &self.fragment_targets,
                }),
                multiview: None,
                cache: None,
            });

        Ok(registry.insert(pipeline))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineBuildError {
    #[error("Vertex shader is required")]
    MissingVertexShader,
    #[error("Shader module not found in registry")]
    ShaderNotFound,
    #[error("Bind group layout not found in registry")]
    LayoutNotFound,
}
