use super::*;
use crate::render::overlay::{AXIS_X_COLOR, AXIS_Y_COLOR};
use crate::trajectory::model::CurveLayout;

const TOL: f64 = 1e-6;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "tracksim_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn scene(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, image::Rgba([0, 0, 255, 255]))
}

fn object(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, image::Rgba([200, 0, 0, 255]))
}

fn full_polygon(w: u32, h: u32) -> Vec<f64> {
    let (w, h) = (f64::from(w), f64::from(h));
    vec![0.0, 0.0, w, 0.0, w, h, 0.0, h]
}

fn fixed_at(x: f64, y: f64) -> Option<Vec<Transformation>> {
    Some(vec![
        Transformation::with_path(TransformOp::TranslateX, PathSequence::constant(x)),
        Transformation::with_path(TransformOp::TranslateY, PathSequence::constant(y)),
    ])
}

fn scene_only(max_steps: usize, seed: u64) -> SimulatorOpts {
    SimulatorOpts {
        camera: false,
        max_steps,
        seed: Some(seed),
        ..SimulatorOpts::default()
    }
}

#[test]
fn options_default_from_empty_json() {
    let opts = SimulatorOpts::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(opts, SimulatorOpts::default());
    assert_eq!(opts.max_steps, 60);
    assert!(opts.camera);

    let opts = SimulatorOpts::from_reader(
        r#"{"max_steps": 5, "camera_size": {"width": 31, "height": 20}}"#.as_bytes(),
    )
    .unwrap();
    assert_eq!(opts.max_steps, 5);
    assert!(SimulatorOpts::from_reader(r#"{"max_steps": 0}"#.as_bytes()).is_err());
    assert!(SimulatorOpts::from_reader(r#"{"max_steps": "many"}"#.as_bytes()).is_err());
}

#[test]
fn camera_size_rounds_up_to_even() {
    let opts = SimulatorOpts {
        camera_size: Some(FrameSize {
            width: 81,
            height: 61,
        }),
        ..SimulatorOpts::default()
    };
    let sim = Simulator::new(scene(160, 120), object(40, 30), full_polygon(40, 30), opts).unwrap();
    assert_eq!(sim.camera_size(), FrameSize { width: 82, height: 62 });
    assert_eq!(sim.view_size(), sim.camera_size());
}

#[test]
fn degenerate_polygons_are_rejected() {
    let err = Simulator::new(
        scene(100, 100),
        object(50, 50),
        vec![0.0, 0.0, 1.0, 1.0],
        scene_only(5, 1),
    );
    assert!(err.is_err());
    let err = Simulator::new(
        scene(100, 100),
        object(50, 50),
        vec![0.0, 0.0, 10.0, 0.0, 20.0, 0.0],
        scene_only(5, 1),
    );
    assert!(err.is_err());
}

#[test]
fn using_a_simulator_before_start_fails() {
    let mut sim =
        Simulator::new(scene(100, 100), object(50, 50), full_polygon(50, 50), scene_only(5, 1))
            .unwrap();
    assert!(sim.frame().is_err());
    assert!(sim.bounding_box().is_err());
    assert!(sim.step().is_err());
    assert!(sim.render().is_err());
}

#[test]
fn scene_only_sequence_keeps_box_inside_frame() {
    let mut sim =
        Simulator::new(scene(100, 100), object(50, 50), full_polygon(50, 50), scene_only(5, 7))
            .unwrap();
    sim.start().unwrap();
    let side = sim.object_size().unwrap();
    assert!((40..=80).contains(&side.width), "{side:?}");
    let preview = sim.bounding_box().unwrap();
    assert!(preview.width() > 0.0 && preview.height() > 0.0, "{preview:?}");
    assert!(preview.x2 <= 100.0 && preview.y2 <= 100.0);

    let mut produced = 0;
    while sim.step().unwrap() {
        produced += 1;
        let frame = sim.frame().unwrap();
        assert_eq!(frame.dimensions(), (100, 100));
        let b = sim.bounding_box().unwrap();
        assert!(b.x1 >= 0.0 && b.y1 >= 0.0);
        assert!(b.x2 <= 99.0 && b.y2 <= 99.0);
        assert!(b.x2 > b.x1 && b.y2 > b.y1, "{b:?}");
    }
    assert_eq!(produced, 5);
    assert!(!sim.step().unwrap());
}

#[test]
fn render_is_idempotent() {
    let mut sim =
        Simulator::new(scene(100, 100), object(50, 50), full_polygon(50, 50), scene_only(5, 3))
            .unwrap();
    sim.start().unwrap();
    sim.step().unwrap();
    let frame = sim.frame().unwrap().clone();
    let bbox = sim.bounding_box().unwrap();

    sim.render().unwrap();
    sim.render().unwrap();
    assert_eq!(sim.frame().unwrap(), &frame);
    assert_eq!(sim.bounding_box().unwrap(), bbox);
}

#[test]
fn exhausted_simulator_leaves_state_unchanged() {
    let mut sim =
        Simulator::new(scene(64, 48), object(20, 20), full_polygon(20, 20), scene_only(3, 11))
            .unwrap();
    sim.start().unwrap();
    for _ in 0..3 {
        assert!(sim.step().unwrap());
    }
    assert!(sim.is_exhausted().unwrap());
    let frame = sim.frame().unwrap().clone();
    let bbox = sim.bounding_box().unwrap();

    assert!(!sim.step().unwrap());
    assert!(!sim.step().unwrap());
    assert_eq!(sim.current_step().unwrap(), 3);
    assert_eq!(sim.frame().unwrap(), &frame);
    assert_eq!(sim.bounding_box().unwrap(), bbox);
}

#[test]
fn fixed_content_transforms_are_honored() {
    let opts = SimulatorOpts {
        content_transforms: Some(vec![
            Transformation::with_path(TransformOp::TranslateX, PathSequence::constant(10.0)),
            Transformation::with_path(TransformOp::TranslateY, PathSequence::constant(20.0)),
        ]),
        ..scene_only(2, 5)
    };
    let mut sim =
        Simulator::new(scene(100, 100), object(50, 50), full_polygon(50, 50), opts).unwrap();
    sim.start().unwrap();
    assert!(sim.step().unwrap());

    let m = sim.current_transform().unwrap();
    assert_eq!(m.as_coeffs(), [1.0, 0.0, 0.0, 1.0, 10.0, 20.0]);
    let side = sim.object_size().unwrap();
    let b = sim.bounding_box().unwrap();
    assert_eq!((b.x1, b.y1), (10.0, 20.0));
    assert_eq!(b.x2, 10.0 + f64::from(side.width));
    assert_eq!(b.y2, 20.0 + f64::from(side.height));
}

#[test]
fn camera_mode_returns_camera_sized_frames() {
    let opts = SimulatorOpts {
        camera_size: Some(FrameSize {
            width: 80,
            height: 60,
        }),
        max_steps: 4,
        seed: Some(21),
        ..SimulatorOpts::default()
    };
    let mut sim =
        Simulator::new(scene(160, 120), object(40, 30), full_polygon(40, 30), opts).unwrap();
    sim.start().unwrap();
    assert!(!sim.camera_content_transforms().unwrap().is_empty());
    while sim.step().unwrap() {
        assert_eq!(sim.frame().unwrap().dimensions(), (80, 60));
        assert_eq!(sim.scene_view().unwrap().dimensions(), (160, 120));
        let b = sim.bounding_box().unwrap();
        assert!(b.x1 >= 0.0 && b.x2 <= 79.0 && b.x1 <= b.x2);
        assert!(b.y1 >= 0.0 && b.y2 <= 59.0 && b.y1 <= b.y2);
    }
}

#[test]
fn model_trajectories_stay_inside_the_view() {
    let len = 60;
    let mut centroid = vec![0.0; 2 * len];
    centroid.extend(std::iter::repeat_n(0.004, 2 * len));
    let model = TrajectoryModel {
        means: vec![centroid.clone(), centroid.iter().map(|v| v * 2.0).collect()],
        relative: true,
        scale_offset: 0.0,
        layout: CurveLayout::ScaleFirst,
    };

    for seed in 0..4 {
        let mut sim = Simulator::new(
            scene(120, 90),
            object(30, 20),
            full_polygon(30, 20),
            scene_only(len, seed),
        )
        .unwrap()
        .with_trajectory_model(Arc::new(model.clone()))
        .unwrap();
        sim.start().unwrap();
        let corners = sim.object_size().unwrap().corners();
        while sim.step().unwrap() {
            let m = sim.current_transform().unwrap();
            for p in apply_to_points(m, &corners) {
                assert!(p.x >= -TOL && p.x <= 120.0 + TOL, "seed {seed}: {p:?}");
                assert!(p.y >= -TOL && p.y <= 90.0 + TOL, "seed {seed}: {p:?}");
            }
        }
    }
}

#[test]
fn run_to_end_exports_frames_and_ground_truth() {
    let dir = temp_dir("sim_export");
    let mut sim =
        Simulator::new(scene(64, 48), object(20, 16), full_polygon(20, 16), scene_only(3, 2))
            .unwrap();
    sim.start().unwrap();
    assert_eq!(sim.run_to_end(&dir).unwrap(), 3);
    for name in ["0001.jpg", "0002.jpg", "0003.jpg"] {
        assert!(dir.join(name).is_file(), "{name}");
    }
    let gt = std::fs::read_to_string(dir.join(GROUND_TRUTH_FILE)).unwrap();
    assert_eq!(gt.lines().count(), 3);

    // A restarted run truncates the log instead of appending to it.
    sim.start().unwrap();
    sim.run_to_end(&dir).unwrap();
    let gt = std::fs::read_to_string(dir.join(GROUND_TRUTH_FILE)).unwrap();
    assert_eq!(gt.lines().count(), 3);
}

#[test]
fn offset_camera_motion_jitters_around_origin() {
    let opts = SimulatorOpts {
        camera_motion: CameraMotion::Offset,
        max_steps: 3,
        seed: Some(9),
        ..SimulatorOpts::default()
    };
    let mut sim =
        Simulator::new(scene(120, 80), object(30, 30), full_polygon(30, 30), opts).unwrap();
    sim.start().unwrap();
    let ops: Vec<_> = sim
        .camera_content_transforms()
        .unwrap()
        .iter()
        .map(Transformation::op)
        .collect();
    assert_eq!(ops[0], TransformOp::Rotate);
    assert!(sim.step().unwrap());
    let origin = sim.camera_transform().unwrap() * Point::ZERO;
    assert!(origin.x.abs() <= 60.0 + TOL && origin.y.abs() <= 40.0 + TOL);
}

#[test]
fn camera_shape_zooms_the_scene_view() {
    let left = image::Rgba([0, 0, 255, 255]);
    let right = image::Rgba([0, 200, 0, 255]);
    let split = RgbaImage::from_fn(100, 100, |x, _| if x < 50 { left } else { right });
    let opts = SimulatorOpts {
        content_transforms: fixed_at(0.0, 60.0),
        camera_shape_transforms: Some(vec![Transformation::with_path(
            TransformOp::ScaleX,
            PathSequence::constant(2.0),
        )]),
        ..scene_only(3, 4)
    };
    let mut sim = Simulator::new(split, object(30, 30), full_polygon(30, 30), opts).unwrap();
    sim.start().unwrap();
    for _ in 0..3 {
        assert!(sim.step().unwrap());
        let view = sim.scene_view().unwrap();
        assert_eq!(view.dimensions(), (100, 100));
        // Twice as wide, anchored at the origin: the left half fills the view.
        assert_eq!(*view.get_pixel(10, 10), left);
        assert_eq!(*view.get_pixel(90, 10), left);
        assert_eq!(sim.frame().unwrap(), view);
    }
}

#[test]
fn shape_transforms_resize_the_base_object_each_step() {
    let opts = SimulatorOpts {
        content_transforms: fixed_at(10.0, 10.0),
        shape_transforms: Some(vec![Transformation::with_path(
            TransformOp::ScaleX,
            PathSequence::constant(0.5),
        )]),
        ..scene_only(4, 6)
    };
    let mut sim =
        Simulator::new(scene(100, 100), object(50, 50), full_polygon(50, 50), opts).unwrap();
    sim.start().unwrap();
    let base = sim.object_size().unwrap();
    let row = 10 + base.height / 2;
    let half = (f64::from(base.width) * 0.5).round() as usize;

    let covered = |sim: &Simulator| {
        let layer = sim.object_view().unwrap();
        (0..layer.width())
            .filter(|&x| layer.get_pixel(x, row).0[3] > 0)
            .count()
    };
    assert_eq!(covered(&sim), half);
    while sim.step().unwrap() {
        assert_eq!(sim.object_size().unwrap(), base);
        assert_eq!(covered(&sim), half);
        let layer = sim.object_view().unwrap();
        assert!(layer.get_pixel(10, row).0[3] > 0);
        assert_eq!(layer.get_pixel(10 + half as u32, row).0[3], 0);
    }
    assert_eq!(sim.current_step().unwrap(), 4);
}

#[test]
fn axes_are_drawn_in_the_scene_corner() {
    let opts = SimulatorOpts {
        axes: true,
        content_transforms: fixed_at(40.0, 40.0),
        ..scene_only(2, 8)
    };
    let mut sim =
        Simulator::new(scene(100, 100), object(40, 40), full_polygon(40, 40), opts).unwrap();
    sim.start().unwrap();
    assert!(sim.step().unwrap());
    let view = sim.scene_view().unwrap();
    // The horizontal bar is drawn over the vertical one.
    assert_eq!(view.get_pixel(0, 0).0, AXIS_X_COLOR);
    assert_eq!(view.get_pixel(25, 5).0, AXIS_X_COLOR);
    assert_eq!(view.get_pixel(5, 25).0, AXIS_Y_COLOR);
    assert_eq!(view.get_pixel(35, 35).0, [0, 0, 255, 255]);
}

#[test]
fn elongated_objects_keep_a_one_pixel_side() {
    let opts = SimulatorOpts {
        content_transforms: fixed_at(20.0, 20.0),
        ..scene_only(2, 12)
    };
    let mut sim =
        Simulator::new(scene(100, 100), object(100, 2), full_polygon(100, 2), opts).unwrap();
    sim.start().unwrap();
    let size = sim.object_size().unwrap();
    assert!((40..=80).contains(&size.width), "{size:?}");
    assert_eq!(size.height, 1);
    assert!(sim.step().unwrap());
    let b = sim.bounding_box().unwrap();
    assert!(b.x2 > b.x1 && b.y2 >= b.y1, "{b:?}");
}
