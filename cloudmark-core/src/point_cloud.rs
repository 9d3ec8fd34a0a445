//! The point cloud aggregate.
//!
//! A [`PointCloud`] owns the raw arrays of one loaded file, the geometry
//! derived from them, the live pose, the optional segmentation state and the
//! GPU buffers it is drawn from. GPU work is opt-in: a cloud can be loaded,
//! inspected, edited and saved without a device.

use crate::error::{PointCloudError, Result};
use crate::input::CloudInput;
use crate::summary::CloudSummary;
use cloudmark_data::color::{
    blend_label_colors, colorize_with_height, distinct_colors, flat_colors,
};
use cloudmark_data::geometry::{bounding_box_center, centroid, extents, initial_translation};
use cloudmark_data::{
    Axis, CloudData, ColorSource, ConfigProvider, DataError, DisplayMode, HandlerRegistry,
    LabelDefinition, LabelIndex, Perspective, Pose, TransformState, read_label_definition,
};
use cloudmark_gpu::{PointCloudBuffers, PointRenderer, PointUniforms, Renderer, ResourceRegistry};
use glam::{Mat4, Vec2, Vec3};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Per-point class labels together with their colouring parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    labels: Vec<LabelIndex>,
    color_map: Vec<Vec3>,
    mix_ratio: f32,
}

impl Segmentation {
    pub fn labels(&self) -> &[LabelIndex] {
        &self.labels
    }

    pub fn color_map(&self) -> &[Vec3] {
        &self.color_map
    }

    pub fn mix_ratio(&self) -> f32 {
        self.mix_ratio
    }
}

pub struct PointCloud {
    path: PathBuf,
    points: Vec<Vec3>,
    colors: Vec<Vec3>,
    color_source: ColorSource,
    label_definition: LabelDefinition,
    segmentation: Option<Segmentation>,
    /// Blended colours, uploaded to the label colour buffer.
    label_colors: Vec<Vec3>,
    /// Set when `label_colors` changed after the last upload.
    label_colors_stale: bool,
    center: Vec3,
    mins: Vec3,
    maxs: Vec3,
    transform: TransformState,
    buffers: Option<PointCloudBuffers>,
}

impl PointCloud {
    /// Build a cloud from raw arrays. Validation happens before anything is
    /// derived, and no GPU resources are created.
    pub fn load(input: CloudInput, config: &impl ConfigProvider) -> Result<Self> {
        let CloudInput {
            path,
            points,
            colors,
            labels,
            label_definition,
            perspective,
        } = input;

        if points.is_empty() {
            return Err(DataError::EmptyCloud.into());
        }
        check_len("colors", points.len(), colors.as_deref())?;
        check_len("labels", points.len(), labels.as_deref())?;

        let (mins, maxs) = extents(&points)?;
        let center = centroid(&points)?;

        let (colors, color_source) = match colors {
            Some(colors) => (colors, ColorSource::File),
            None => synthesize_colors(&points, mins, maxs, config),
        };

        let segmentation = if config.segmentation() {
            let labels = labels.unwrap_or_else(|| {
                debug!("No labels supplied, starting with background");
                vec![0; points.len()]
            });
            label_definition.validate(&labels)?;
            Some(Segmentation {
                labels,
                color_map: distinct_colors(label_definition.len()),
                mix_ratio: checked_mix_ratio(config.label_color_mix_ratio())?,
            })
        } else {
            if labels.is_some() {
                debug!("Segmentation disabled, ignoring supplied labels");
            }
            None
        };

        let initial = match perspective {
            Some(perspective) => Pose::new(perspective.translation, perspective.rotation),
            None => Pose::new(
                initial_translation(center, mins, maxs, config.far_plane()),
                Vec3::ZERO,
            ),
        };

        let mut cloud = Self {
            path,
            points,
            colors,
            color_source,
            label_definition,
            segmentation,
            label_colors: Vec::new(),
            label_colors_stale: false,
            center,
            mins,
            maxs,
            transform: TransformState::new(initial),
            buffers: None,
        };
        cloud.label_colors = cloud.blend()?;

        info!(
            points = cloud.point_count(),
            segmentation = cloud.segmentation.is_some(),
            "Loaded point cloud {}",
            cloud.path.display()
        );
        debug!("{}", cloud.summary());
        Ok(cloud)
    }

    /// Read a cloud, its label definition and (with segmentation enabled) its
    /// labels through the registered handlers.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn from_file(
        path: &Path,
        perspective: Option<Perspective>,
        handlers: &HandlerRegistry,
        config: &impl ConfigProvider,
    ) -> Result<Self> {
        let raw = handlers.point_cloud_handler(path)?.read_point_cloud(path)?;

        let definition_path = label_definition_path(config);
        let label_definition = if config.segmentation() || definition_path.exists() {
            read_label_definition(&definition_path)?
        } else {
            warn!(
                "No label definition at {}, continuing without classes",
                definition_path.display()
            );
            LabelDefinition::default()
        };

        let labels = if config.segmentation() {
            let label_path = segmentation_path(path, config);
            info!("Loading segmentation labels from {}", label_path.display());
            let handler = handlers.segmentation_handler(&label_path)?;
            Some(handler.read_or_create_labels(&label_path, raw.points.len())?)
        } else {
            None
        };

        let mut input = CloudInput::new(path, raw.points).with_label_definition(label_definition);
        input.colors = raw.colors;
        input.labels = labels;
        input.perspective = perspective;
        Self::load(input, config)
    }

    /// Upload positions, colours and label colours. Replaces existing buffers
    /// only once the new set is complete.
    pub fn create_buffers(&mut self, renderer: &Renderer) -> Result<()> {
        let buffers = PointCloudBuffers::allocate_and_upload(
            renderer.device(),
            &self.points,
            &self.colors,
            &self.label_colors,
        )?;
        self.buffers = Some(buffers);
        self.label_colors_stale = false;
        Ok(())
    }

    pub fn release_buffers(&mut self) {
        if let Some(buffers) = self.buffers.take() {
            buffers.release();
        }
    }

    pub fn has_buffers(&self) -> bool {
        self.buffers.is_some()
    }

    /// Recompute the blended label colours and push them to the GPU if
    /// buffers exist.
    pub fn reload_label_colors(&mut self, queue: &wgpu::Queue) -> Result<()> {
        self.label_colors = self.blend()?;
        self.label_colors_stale = true;
        self.upload_label_colors(queue)
    }

    /// Replace all labels.
    pub fn set_labels(&mut self, labels: Vec<LabelIndex>) -> Result<()> {
        check_len("labels", self.points.len(), Some(labels.as_slice()))?;
        self.label_definition.validate(&labels)?;
        self.segmentation_mut()?.labels = labels;
        self.refresh_label_colors()
    }

    /// Give `points` the class `label`.
    pub fn assign_label(&mut self, points: &[usize], label: LabelIndex) -> Result<()> {
        self.segmentation_mut()?;
        let len = self.points.len();
        if let Some(&point) = points.iter().find(|&&p| p >= len) {
            return Err(PointCloudError::PointOutOfRange { point, len });
        }
        if !self.label_definition.contains(label) {
            return Err(PointCloudError::UnknownLabel(label));
        }

        let segmentation = self.segmentation_mut()?;
        for &point in points {
            segmentation.labels[point] = label;
        }
        debug!("Assigned label {} to {} points", label, points.len());
        self.refresh_label_colors()
    }

    /// Replace the palette; one colour per class.
    pub fn set_label_color_map(&mut self, color_map: Vec<Vec3>) -> Result<()> {
        self.segmentation_mut()?;
        let classes = self.label_definition.len();
        if color_map.len() != classes {
            return Err(DataError::ShapeMismatch {
                what: "label color map",
                expected: classes,
                actual: color_map.len(),
            }
            .into());
        }
        self.segmentation_mut()?.color_map = color_map;
        self.refresh_label_colors()
    }

    /// Set the label colour weight, clamped to [0, 1]. NaN and infinities
    /// are rejected.
    pub fn set_mix_ratio(&mut self, mix_ratio: f32) -> Result<()> {
        let mix_ratio = checked_mix_ratio(mix_ratio)?;
        self.segmentation_mut()?.mix_ratio = mix_ratio;
        self.refresh_label_colors()
    }

    /// Per-frame update: flush stale label colours and write the uniforms.
    pub fn prepare(
        &mut self,
        queue: &wgpu::Queue,
        renderer: &PointRenderer,
        registry: &ResourceRegistry,
        view_proj: Mat4,
        viewport: Vec2,
        config: &impl ConfigProvider,
    ) -> Result<()> {
        if self.buffers.is_none() {
            return Err(PointCloudError::BuffersNotCreated);
        }
        self.upload_label_colors(queue)?;
        let uniforms =
            PointUniforms::new(self.model_matrix(), view_proj, viewport, config.point_size());
        renderer.update(queue, registry, &uniforms)?;
        Ok(())
    }

    /// Record the draw of every point into `pass`, coloured per the current
    /// display mode.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        renderer: &PointRenderer,
        registry: &ResourceRegistry,
        config: &impl ConfigProvider,
    ) -> Result<()> {
        let buffers = self
            .buffers
            .as_ref()
            .ok_or(PointCloudError::BuffersNotCreated)?;
        let color = buffers.select_active_color_buffer(self.display_mode(config));
        renderer.draw(
            pass,
            registry,
            buffers.position_buffer(),
            color,
            buffers.point_count(),
        )?;
        Ok(())
    }

    /// Label colours only when segmentation is active and the configuration
    /// asks for them.
    pub fn display_mode(&self, config: &impl ConfigProvider) -> DisplayMode {
        DisplayMode::from_color_with_label(
            self.segmentation.is_some() && config.color_with_label(),
        )
    }

    /// Write the cloud through the handler for `destination` (default: the
    /// path it was loaded from). Points, colours (synthesised ones included)
    /// and labels are written as they are.
    pub fn save(&self, destination: Option<&Path>, handlers: &HandlerRegistry) -> Result<()> {
        self.save_with(destination, handlers, true)
    }

    /// Like [`save`](Self::save); with `write_synthesized_colors` false a
    /// colourless cloud is written without colours.
    #[tracing::instrument(skip_all)]
    pub fn save_with(
        &self,
        destination: Option<&Path>,
        handlers: &HandlerRegistry,
        write_synthesized_colors: bool,
    ) -> Result<()> {
        let path = destination.unwrap_or(&self.path);
        let handler = handlers.point_cloud_handler(path)?;

        let mut data = CloudData::new(&self.points);
        if write_synthesized_colors || !self.is_colorless() {
            data = data.with_colors(&self.colors);
        }
        if let Some(segmentation) = &self.segmentation {
            data = data.with_labels(&segmentation.labels);
        }
        handler.write_point_cloud(path, data)?;
        info!("Saved {} points to {}", self.points.len(), path.display());
        Ok(())
    }

    /// Write the labels to `<label_folder>/segmentation/<stem>.bin`.
    pub fn save_labels(
        &self,
        handlers: &HandlerRegistry,
        config: &impl ConfigProvider,
    ) -> Result<PathBuf> {
        let segmentation = self
            .segmentation
            .as_ref()
            .ok_or(PointCloudError::SegmentationDisabled)?;
        let label_path = segmentation_path(&self.path, config);
        handlers
            .segmentation_handler(&label_path)?
            .write_labels(&label_path, &segmentation.labels)?;
        Ok(label_path)
    }

    /// Points per class name, unused classes included. `None` without
    /// segmentation.
    pub fn label_counts(&self) -> Option<BTreeMap<String, usize>> {
        let segmentation = self.segmentation.as_ref()?;
        if self.label_definition.is_empty() {
            return None;
        }
        self.label_definition
            .count_labels(&segmentation.labels)
            .ok()
    }

    pub fn summary(&self) -> CloudSummary {
        CloudSummary {
            path: self.path.clone(),
            point_count: self.point_count(),
            color_count: self.color_count(),
            color_source: self.color_source,
            center: self.center,
            mins: self.mins,
            maxs: self.maxs,
            init_translation: self.init_translation(),
        }
    }

    /// Swap in a new set of points. Geometry, colours and the initial pose
    /// are recomputed, labels restart as background and the GPU buffers are
    /// dropped.
    pub fn replace_points(
        &mut self,
        points: Vec<Vec3>,
        colors: Option<Vec<Vec3>>,
        config: &impl ConfigProvider,
    ) -> Result<()> {
        let mut input = CloudInput::new(self.path.clone(), points)
            .with_label_definition(self.label_definition.clone());
        input.colors = colors;
        let mut replacement = Self::load(input, config)?;

        if let (Some(old), Some(new)) = (&self.segmentation, &mut replacement.segmentation) {
            new.color_map = old.color_map.clone();
            new.mix_ratio = old.mix_ratio;
            replacement.label_colors = replacement.blend()?;
        }

        self.release_buffers();
        *self = replacement;
        Ok(())
    }

    // Transform

    pub fn translation(&self) -> Vec3 {
        self.transform.translation()
    }

    pub fn rotation(&self) -> Vec3 {
        self.transform.rotation()
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.transform.set_translation(translation);
    }

    pub fn set_translation_axis(&mut self, axis: Axis, value: f32) {
        self.transform.set_translation_axis(axis, value);
    }

    pub fn set_rotation(&mut self, degrees: Vec3) {
        self.transform.set_rotation(degrees);
    }

    pub fn set_rotation_axis(&mut self, axis: Axis, degrees: f32) {
        self.transform.set_rotation_axis(axis, degrees);
    }

    pub fn reset(&mut self) {
        self.transform.reset();
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn init_translation(&self) -> Vec3 {
        self.transform.initial_pose().translation
    }

    pub fn init_rotation(&self) -> Vec3 {
        self.transform.initial_pose().rotation
    }

    /// Rotation happens about the bounding box center.
    pub fn model_matrix(&self) -> Mat4 {
        self.transform
            .pose()
            .model_matrix(bounding_box_center(self.mins, self.maxs))
    }

    // Accessors

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn color_source(&self) -> ColorSource {
        self.color_source
    }

    pub fn is_colorless(&self) -> bool {
        self.color_source.is_colorless()
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn color_count(&self) -> usize {
        self.colors.len()
    }

    pub fn label_definition(&self) -> &LabelDefinition {
        &self.label_definition
    }

    pub fn segmentation(&self) -> Option<&Segmentation> {
        self.segmentation.as_ref()
    }

    pub fn labels(&self) -> Option<&[LabelIndex]> {
        self.segmentation.as_ref().map(|s| s.labels.as_slice())
    }

    pub fn label_colors(&self) -> &[Vec3] {
        &self.label_colors
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn mins(&self) -> Vec3 {
        self.mins
    }

    pub fn maxs(&self) -> Vec3 {
        self.maxs
    }

    /// Lowest and highest third coordinate.
    pub fn min_max_height(&self) -> (f32, f32) {
        (self.mins.z, self.maxs.z)
    }

    fn segmentation_mut(&mut self) -> Result<&mut Segmentation> {
        self.segmentation
            .as_mut()
            .ok_or(PointCloudError::SegmentationDisabled)
    }

    fn blend(&self) -> Result<Vec<Vec3>> {
        let colors = match &self.segmentation {
            Some(s) => {
                blend_label_colors(Some(s.labels.as_slice()), &s.color_map, &self.colors, s.mix_ratio)?
            }
            None => self.colors.clone(),
        };
        Ok(colors)
    }

    fn refresh_label_colors(&mut self) -> Result<()> {
        self.label_colors = self.blend()?;
        self.label_colors_stale = true;
        Ok(())
    }

    fn upload_label_colors(&mut self, queue: &wgpu::Queue) -> Result<()> {
        if let (true, Some(buffers)) = (self.label_colors_stale, &self.buffers) {
            buffers.write_label_colors(queue, &self.label_colors)?;
            self.label_colors_stale = false;
        }
        Ok(())
    }
}

fn check_len<T>(what: &'static str, expected: usize, values: Option<&[T]>) -> Result<()> {
    match values {
        Some(values) if values.len() != expected => Err(DataError::ShapeMismatch {
            what,
            expected,
            actual: values.len(),
        }
        .into()),
        _ => Ok(()),
    }
}

fn checked_mix_ratio(mix_ratio: f32) -> Result<f32> {
    if mix_ratio.is_finite() {
        Ok(mix_ratio.clamp(0.0, 1.0))
    } else {
        Err(DataError::InvalidMixRatio(mix_ratio).into())
    }
}

fn synthesize_colors(
    points: &[Vec3],
    mins: Vec3,
    maxs: Vec3,
    config: &impl ConfigProvider,
) -> (Vec<Vec3>, ColorSource) {
    if config.colorless_colorize() {
        info!("Generated colors for colorless point cloud from height");
        (colorize_with_height(points, mins.z, maxs.z), ColorSource::HeightRamp)
    } else {
        info!("Using flat color for colorless point cloud");
        (flat_colors(points.len(), config.colorless_color()), ColorSource::Flat)
    }
}

fn label_definition_path(config: &impl ConfigProvider) -> PathBuf {
    config
        .label_folder()
        .join("schema")
        .join("label_definition.json")
}

fn segmentation_path(cloud_path: &Path, config: &impl ConfigProvider) -> PathBuf {
    let stem = cloud_path.file_stem().unwrap_or_default();
    let mut file_name = stem.to_os_string();
    file_name.push(".bin");
    config.label_folder().join("segmentation").join(file_name)
}
