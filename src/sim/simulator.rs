use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;

use crate::foundation::core::{Affine, BoundingBox, FrameSize, Point};
use crate::foundation::error::{TrackSimError, TrackSimResult};
use crate::foundation::rng::{RandomStream, fork_stream, stream_from_seed, uniform};
use crate::render::occlusion::OcclusionSet;
use crate::render::overlay::{
    BOX_COLOR, CAMERA_COLOR, OBJECT_COLOR, draw_axes, draw_polygon, draw_rect,
};
use crate::render::raster::{
    crop_or_pad, load_image, paste_over, polygon_bounds, resize_to, segment_crop,
};
use crate::sim::export::{
    GROUND_TRUTH_FILE, GroundTruthWriter, frame_file_name, save_frame_image,
};
use crate::trajectory::bounds::BoundsCorrector;
use crate::trajectory::model::{TrajectoryModel, TrajectorySampler};
use crate::trajectory::presets::{BoundedTrajectory, default_object_transforms, offset_transforms};
use crate::transform::affine::{apply_to_points, invert};
use crate::transform::path::{CANONICAL_STEPS, PathSequence};
use crate::transform::transformation::{TransformOp, Transformation, compose_at, shape_at};
use crate::transform::warp::warp_image;

const MIN_OBJECT_FRACTION: f64 = 0.4;
const MAX_OBJECT_FRACTION: f64 = 0.8;
const OCCLUDER_FRACTION: f64 = 0.3;

/// Preset camera motion used when no trajectory model is attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMotion {
    /// Straight pan across the central scene region with a cosine wave on the other axis.
    #[default]
    Bounded,
    /// Small rotation, zoom and translation jitter around the scene origin.
    Offset,
}

/// Options controlling one simulated sequence.
///
/// Parsed from JSON with [`SimulatorOpts::from_path`]; every field is optional there.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SimulatorOpts {
    /// Camera view size; defaults to the scene size. Odd sides are rounded up to even.
    pub camera_size: Option<FrameSize>,
    /// Number of frames produced by [`Simulator::step`] before exhaustion.
    pub max_steps: usize,
    /// Model a moving camera and return camera views; otherwise return scene views.
    pub camera: bool,
    /// Preset camera motion.
    pub camera_motion: CameraMotion,
    /// Outline the ground-truth box on the returned frame.
    pub draw_box: bool,
    /// Outline the camera and object footprints on the scene view.
    pub draw_camera: bool,
    /// Draw reference axes on the scene and object before simulating.
    pub axes: bool,
    /// Curve length of the trajectory model, if one is attached.
    pub trajectory_model_length: usize,
    /// Seed for the simulator's random stream; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Pre-built object content transformations.
    pub content_transforms: Option<Vec<Transformation>>,
    /// Pre-built object shape transformations.
    pub shape_transforms: Option<Vec<Transformation>>,
    /// Pre-built camera content transformations.
    pub camera_content_transforms: Option<Vec<Transformation>>,
    /// Pre-built scene shape transformations.
    pub camera_shape_transforms: Option<Vec<Transformation>>,
}

impl Default for SimulatorOpts {
    fn default() -> Self {
        Self {
            camera_size: None,
            max_steps: CANONICAL_STEPS,
            camera: true,
            camera_motion: CameraMotion::Bounded,
            draw_box: false,
            draw_camera: false,
            axes: false,
            trajectory_model_length: CANONICAL_STEPS,
            seed: None,
            content_transforms: None,
            shape_transforms: None,
            camera_content_transforms: None,
            camera_shape_transforms: None,
        }
    }
}

impl SimulatorOpts {
    /// Parse options from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> TrackSimResult<Self> {
        let opts: Self = serde_json::from_reader(r)
            .map_err(|e| TrackSimError::serde(format!("parse simulator options JSON: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parse options from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> TrackSimResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TrackSimError::validation(format!(
                "open simulator options '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check option ranges.
    pub fn validate(&self) -> TrackSimResult<()> {
        if self.max_steps == 0 {
            return Err(TrackSimError::validation("max_steps must be > 0"));
        }
        if self.trajectory_model_length == 0 {
            return Err(TrackSimError::validation(
                "trajectory_model_length must be > 0",
            ));
        }
        if let Some(size) = self.camera_size {
            FrameSize::new(size.width, size.height)?;
        }
        Ok(())
    }
}

/// Everything that exists only once [`Simulator::start`] ran.
#[derive(Debug)]
struct RunState {
    object: RgbaImage,
    object_size: FrameSize,
    object_bounds: [Point; 4],
    camera_bounds: [Point; 4],
    occlusion: OcclusionSet,
    content: Vec<Transformation>,
    shape: Vec<Transformation>,
    camera_content: Vec<Transformation>,
    camera_shape: Vec<Transformation>,
    step: usize,
    current_transform: Affine,
    camera_transform: Affine,
    object_view: RgbaImage,
    scene_view: RgbaImage,
    camera_view: RgbaImage,
    bbox: BoundingBox,
    ground_truth: Option<GroundTruthWriter>,
}

/// Stateful generator of one synthetic tracking sequence.
///
/// Lifecycle: construct, [`start`](Simulator::start), then call [`step`](Simulator::step) until
/// it reports exhaustion, reading [`frame`](Simulator::frame) and
/// [`bounding_box`](Simulator::bounding_box) (or exporting with
/// [`save_frame`](Simulator::save_frame)) after each step.
#[derive(Debug)]
pub struct Simulator {
    opts: SimulatorOpts,
    scene: RgbaImage,
    scene_size: FrameSize,
    object_source: RgbaImage,
    polygon: Vec<f64>,
    camera_size: FrameSize,
    sampler: Option<TrajectorySampler>,
    rng: RandomStream,
    state: Option<RunState>,
}

impl Simulator {
    /// Simulator over decoded (premultiplied RGBA8) scene and object images.
    pub fn new(
        scene: RgbaImage,
        object: RgbaImage,
        polygon: Vec<f64>,
        opts: SimulatorOpts,
    ) -> TrackSimResult<Self> {
        opts.validate()?;
        polygon_bounds(&polygon)?;
        let scene_size = FrameSize::new(scene.width(), scene.height())?;
        FrameSize::new(object.width(), object.height())?;
        let camera_size = opts.camera_size.unwrap_or(scene_size).even();
        let rng = stream_from_seed(opts.seed);
        Ok(Self {
            opts,
            scene,
            scene_size,
            object_source: object,
            polygon,
            camera_size,
            sampler: None,
            rng,
            state: None,
        })
    }

    /// Load scene and object images from disk.
    pub fn open(
        scene_path: &Path,
        object_path: &Path,
        polygon: Vec<f64>,
        opts: SimulatorOpts,
    ) -> TrackSimResult<Self> {
        let scene = load_image(scene_path)?;
        let object = load_image(object_path)?;
        tracing::info!(
            scene = %scene_path.display(),
            object = %object_path.display(),
            "new simulation"
        );
        Self::new(scene, object, polygon, opts)
    }

    /// Sample object and camera motion from `model` instead of the preset trajectories.
    pub fn with_trajectory_model(mut self, model: Arc<TrajectoryModel>) -> TrackSimResult<Self> {
        self.sampler = Some(TrajectorySampler::new(
            model,
            self.opts.trajectory_model_length,
        )?);
        Ok(self)
    }

    /// Options this simulator was built with.
    pub fn opts(&self) -> &SimulatorOpts {
        &self.opts
    }

    /// Scene size.
    pub fn scene_size(&self) -> FrameSize {
        self.scene_size
    }

    /// Even-sized camera view.
    pub fn camera_size(&self) -> FrameSize {
        self.camera_size
    }

    /// Size of the frames returned by [`Simulator::frame`].
    pub fn view_size(&self) -> FrameSize {
        if self.opts.camera {
            self.camera_size
        } else {
            self.scene_size
        }
    }

    /// Segment and scale the object, build the trajectories and render step 0.
    #[tracing::instrument(skip(self), fields(scene = ?self.scene_size, camera = ?self.camera_size))]
    pub fn start(&mut self) -> TrackSimResult<()> {
        let mut object = segment_crop(&self.object_source, &self.polygon)?;
        if self.opts.axes {
            draw_axes(&mut self.scene);
            draw_axes(&mut object);
        }

        let view = self.view_size();
        let object_size = self.scaled_object_size(&object, view)?;
        let object_bounds = object_size.corners();
        let camera_bounds = self.camera_size.corners();

        let mut occlusion_rng = fork_stream(&mut self.rng);
        let occlusion = OcclusionSet::sample(
            self.scene_size,
            f64::from(object_size.min_side()) * OCCLUDER_FRACTION,
            &mut occlusion_rng,
        );

        let path_steps = self.opts.max_steps.max(2);
        let (content, camera_content) = match self.sampler.clone() {
            None => {
                let content = match self.opts.content_transforms.clone() {
                    Some(t) => t,
                    None => {
                        default_object_transforms(object_size, view, path_steps, &mut self.rng)?
                    }
                };
                let camera = match self.opts.camera_content_transforms.clone() {
                    Some(t) => t,
                    None if self.opts.camera => match self.opts.camera_motion {
                        CameraMotion::Bounded => BoundedTrajectory::sample(
                            self.scene_size.to_size(),
                            path_steps,
                            &mut self.rng,
                        )?
                        .transforms(),
                        CameraMotion::Offset => offset_transforms(
                            self.camera_size.to_size(),
                            path_steps,
                            &mut self.rng,
                        )?,
                    },
                    None => Vec::new(),
                };
                (content, camera)
            }
            Some(sampler) => {
                let content = match self.opts.content_transforms.clone() {
                    Some(t) => t,
                    None => self.fit_trajectory(&sampler, &object_bounds, view)?,
                };
                let camera = match self.opts.camera_content_transforms.clone() {
                    Some(t) => t,
                    None if self.opts.camera => {
                        self.fit_trajectory(&sampler, &camera_bounds, self.scene_size)?
                    }
                    None => Vec::new(),
                };
                (content, camera)
            }
        };

        let identity_shape = || {
            vec![Transformation::with_path(
                TransformOp::IdentityShape,
                PathSequence::constant(1.0),
            )]
        };
        let shape = self
            .opts
            .shape_transforms
            .clone()
            .unwrap_or_else(identity_shape);
        let camera_shape = self
            .opts
            .camera_shape_transforms
            .clone()
            .unwrap_or_else(identity_shape);

        self.state = Some(RunState {
            object_view: RgbaImage::new(self.scene_size.width, self.scene_size.height),
            scene_view: self.scene.clone(),
            camera_view: RgbaImage::new(self.camera_size.width, self.camera_size.height),
            object,
            object_size,
            object_bounds,
            camera_bounds,
            occlusion,
            content,
            shape,
            camera_content,
            camera_shape,
            step: 0,
            current_transform: Affine::IDENTITY,
            camera_transform: Affine::IDENTITY,
            bbox: BoundingBox::default(),
            ground_truth: None,
        });

        self.transform()?;
        self.render()
    }

    /// Object size: a random fraction of the view's smaller side for the longer object side.
    fn scaled_object_size(
        &mut self,
        object: &RgbaImage,
        view: FrameSize,
    ) -> TrackSimResult<FrameSize> {
        let side = f64::from(view.min_side())
            * uniform(&mut self.rng, MIN_OBJECT_FRACTION, MAX_OBJECT_FRACTION);
        let (w, h) = (f64::from(object.width()), f64::from(object.height()));
        let aspect = h / w;
        let (w, h) = if h > w {
            (side / aspect, side)
        } else {
            (side, side * aspect)
        };
        if !(w.is_finite() && h.is_finite()) {
            return Err(TrackSimError::validation(format!(
                "object of {}x{} cannot be scaled to a {side:.1}px side",
                object.width(),
                object.height()
            )));
        }
        FrameSize::new(w.max(1.0) as u32, h.max(1.0) as u32)
    }

    fn fit_trajectory(
        &mut self,
        sampler: &TrajectorySampler,
        reference: &[Point],
        limits: FrameSize,
    ) -> TrackSimResult<Vec<Transformation>> {
        let sampled = sampler.sample(limits.to_size(), &mut self.rng)?;
        let corrector = BoundsCorrector::new(reference, limits.to_size(), sampler.length())?;
        corrector.fit(sampled, &mut self.rng)
    }

    fn state(&self) -> TrackSimResult<&RunState> {
        self.state
            .as_ref()
            .ok_or_else(|| TrackSimError::validation("simulator has not been started"))
    }

    /// Recompose the object and camera transforms at the current step and re-warp the object.
    fn transform(&mut self) -> TrackSimResult<()> {
        let scene_size = self.scene_size;
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| TrackSimError::validation("simulator has not been started"))?;

        let size = shape_at(&state.shape, state.object_size, state.step)?;
        let object = resize_to(&state.object, size);

        state.camera_transform = compose_at(&state.camera_content, state.step)?;
        state.current_transform = compose_at(&state.content, state.step)?;
        state.object_view = warp_image(
            &object,
            state.camera_transform * state.current_transform,
            scene_size,
        )?;
        Ok(())
    }

    /// Composite the current step into the scene and camera views and update the box.
    ///
    /// Calling it repeatedly without [`Simulator::step`] yields identical output.
    pub fn render(&mut self) -> TrackSimResult<()> {
        let (scene_size, camera_size) = (self.scene_size, self.camera_size);
        let opts = &self.opts;
        let scene = &self.scene;
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| TrackSimError::validation("simulator has not been started"))?;

        let mut scene_view = scene.clone();
        paste_over(&mut scene_view, &state.object_view);
        state.occlusion.apply(&mut scene_view, scene);
        for t in &state.camera_shape {
            let size = shape_at(std::slice::from_ref(t), scene_size, state.step)?;
            if size != scene_size {
                scene_view = crop_or_pad(&resize_to(&scene_view, size), scene_size);
            }
        }

        let mut camera_view = warp_image(
            &scene_view,
            invert(state.camera_transform)?,
            camera_size,
        )?;

        let scene_object = state.camera_transform * state.current_transform;
        state.bbox = if opts.camera {
            BoundingBox::from_points_clipped(
                &apply_to_points(state.current_transform, &state.object_bounds),
                camera_size,
            )
        } else {
            BoundingBox::from_points_clipped(
                &apply_to_points(scene_object, &state.object_bounds),
                scene_size,
            )
        };

        if opts.draw_box {
            let target = if opts.camera {
                &mut camera_view
            } else {
                &mut scene_view
            };
            draw_rect(target, state.bbox.to_array(), BOX_COLOR);
        }
        if opts.draw_camera {
            let camera_footprint = apply_to_points(state.camera_transform, &state.camera_bounds);
            draw_polygon(&mut scene_view, &camera_footprint, CAMERA_COLOR);
            let object_footprint = apply_to_points(scene_object, &state.object_bounds);
            draw_polygon(&mut scene_view, &object_footprint, OBJECT_COLOR);
        }

        state.scene_view = scene_view;
        state.camera_view = camera_view;
        Ok(())
    }

    /// Produce the frame for the current step and advance.
    ///
    /// Returns `Ok(false)`, leaving the state untouched, once `max_steps` frames were produced.
    pub fn step(&mut self) -> TrackSimResult<bool> {
        let max_steps = self.opts.max_steps;
        if self.state()?.step >= max_steps {
            return Ok(false);
        }
        self.transform()?;
        self.render()?;
        if let Some(state) = self.state.as_mut() {
            state.step += 1;
        }
        Ok(true)
    }

    /// Number of frames produced so far.
    pub fn current_step(&self) -> TrackSimResult<usize> {
        Ok(self.state()?.step)
    }

    /// Whether further [`Simulator::step`] calls will report exhaustion.
    pub fn is_exhausted(&self) -> TrackSimResult<bool> {
        Ok(self.state()?.step >= self.opts.max_steps)
    }

    /// Camera view when a camera is modeled, scene view otherwise (premultiplied RGBA8).
    pub fn frame(&self) -> TrackSimResult<&RgbaImage> {
        let state = self.state()?;
        Ok(if self.opts.camera {
            &state.camera_view
        } else {
            &state.scene_view
        })
    }

    /// Scene with the object composited, before the camera warp.
    pub fn scene_view(&self) -> TrackSimResult<&RgbaImage> {
        Ok(&self.state()?.scene_view)
    }

    /// Warped object layer in scene coordinates, before compositing and occlusion.
    pub fn object_view(&self) -> TrackSimResult<&RgbaImage> {
        Ok(&self.state()?.object_view)
    }

    /// Camera view of the scene.
    pub fn camera_view(&self) -> TrackSimResult<&RgbaImage> {
        Ok(&self.state()?.camera_view)
    }

    /// Ground-truth box in the coordinates of [`Simulator::frame`].
    pub fn bounding_box(&self) -> TrackSimResult<BoundingBox> {
        Ok(self.state()?.bbox)
    }

    /// Object size after the initial rescale, before shape transformations.
    pub fn object_size(&self) -> TrackSimResult<FrameSize> {
        Ok(self.state()?.object_size)
    }

    /// Object content transform at the current step.
    pub fn current_transform(&self) -> TrackSimResult<Affine> {
        Ok(self.state()?.current_transform)
    }

    /// Camera transform at the current step.
    pub fn camera_transform(&self) -> TrackSimResult<Affine> {
        Ok(self.state()?.camera_transform)
    }

    /// Object content transformations in use.
    pub fn content_transforms(&self) -> TrackSimResult<&[Transformation]> {
        Ok(&self.state()?.content)
    }

    /// Camera content transformations in use.
    pub fn camera_content_transforms(&self) -> TrackSimResult<&[Transformation]> {
        Ok(&self.state()?.camera_content)
    }

    /// Write the current frame as `NNNN.jpg` into `out_dir` and append its box to the
    /// ground-truth log there. The log is truncated on the first export of a run.
    pub fn save_frame(&mut self, out_dir: &Path) -> TrackSimResult<PathBuf> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| TrackSimError::validation("simulator has not been started"))?;
        let frame_path = out_dir.join(frame_file_name(state.step));
        let frame = if self.opts.camera {
            &state.camera_view
        } else {
            &state.scene_view
        };
        save_frame_image(frame, &frame_path)?;

        let gt_path = out_dir.join(GROUND_TRUTH_FILE);
        let writer = match state.ground_truth.take() {
            Some(w) if w.path() == gt_path => w,
            _ => GroundTruthWriter::create(gt_path)?,
        };
        let writer = state.ground_truth.insert(writer);
        writer.push(&state.bbox)?;
        Ok(frame_path)
    }

    /// Step until exhaustion, exporting every frame into `out_dir`. Returns the frame count.
    pub fn run_to_end(&mut self, out_dir: &Path) -> TrackSimResult<usize> {
        let mut frames = 0;
        while self.step()? {
            self.save_frame(out_dir)?;
            frames += 1;
        }
        tracing::info!(frames, out = %out_dir.display(), "sequence exported");
        Ok(frames)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sim/simulator.rs"]
mod tests;
