//! Tracksim generates synthetic object-tracking sequences.
//!
//! An object is segmented out of one image and moved over a scene along randomized affine
//! trajectories, optionally seen through a moving camera. Every frame comes with a ground-truth
//! bounding box.
//!
//! - Build a [`Simulator`] from a scene, an object image and a segmentation polygon
//! - Call [`Simulator::start`], then [`Simulator::step`] until it reports exhaustion
//! - Read [`Simulator::frame`] and [`Simulator::bounding_box`], or export with
//!   [`Simulator::run_to_end`]
//!
//! Trajectories come from hand-tuned presets or from a clustered [`TrajectoryModel`], fitted
//! into the view by a [`BoundsCorrector`]. A [`SimulatorFactory`] draws random inputs from a
//! dataset directory.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub(crate) mod foundation;
pub(crate) mod render;
pub(crate) mod sim;
pub(crate) mod trajectory;
pub(crate) mod transform;

pub use crate::foundation::core::{Affine, BoundingBox, FrameSize, Point, Rect, Size, Vec2};
pub use crate::foundation::error::{TrackSimError, TrackSimResult};
pub use crate::foundation::rng::{RandomStream, fork_stream, stream_from_seed, uniform};

pub use crate::transform::affine::{
    apply_to_points, compose, homogeneous, invert, rotate, scale, translate,
};
pub use crate::transform::path::{CANONICAL_STEPS, PathSequence, TIME_SPAN};
pub use crate::transform::transformation::{TransformOp, Transformation, compose_at, shape_at};
pub use crate::transform::warp::warp_image;

pub use crate::trajectory::bounds::{BoundsCorrector, SHRINK_MARGIN};
pub use crate::trajectory::model::{
    CurveLayout, DEFAULT_MAX_CLUSTERS, DEFAULT_SCALE_BASE, TrajectoryModel, TrajectorySampler,
};
pub use crate::trajectory::presets::{
    BoundedTrajectory, default_object_transforms, offset_transforms,
};

pub use crate::render::occlusion::{MAX_OCCLUDERS, OcclusionSet};
pub use crate::render::raster::{
    PixelRect, crop_or_pad, decode_image, load_image, paste_over, polygon_bounds, resize_to,
    segment_crop, to_straight_rgba,
};

pub use crate::sim::batch::{SequenceReport, generate_batch};
pub use crate::sim::export::{
    FRAME_EXTENSION, GROUND_TRUTH_FILE, GroundTruthWriter, frame_file_name, save_frame_image,
};
pub use crate::sim::factory::{
    DEFAULT_IMAGE_DIR, DatasetSummary, InstanceInputs, SimulatorFactory, SummaryEntry,
};
pub use crate::sim::simulator::{CameraMotion, Simulator, SimulatorOpts};
