use super::*;

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

fn summary_json() -> &'static str {
    r#"{
        "summary": [
            {"category_id": 18, "image_id": 7, "file_name": " object.png ",
             "segmentation": [[2, 2, 30, 2, 30, 20, 2, 20], [5, 5, 25, 5, 15, 18]]}
        ],
        "categories": {"18": "dog"}
    }"#
}

fn data_dir(name: &str) -> PathBuf {
    let dir = temp_dir(name);
    let images = dir.join(DEFAULT_IMAGE_DIR);
    std::fs::create_dir_all(&images).unwrap();
    for (file, color) in [("a.png", [10, 200, 10, 255]), ("b.png", [10, 10, 200, 255])] {
        image::RgbaImage::from_pixel(96, 64, image::Rgba(color))
            .save(images.join(file))
            .unwrap();
    }
    std::fs::create_dir_all(dir.join("objects")).unwrap();
    image::RgbaImage::from_pixel(32, 24, image::Rgba([220, 30, 30, 255]))
        .save(dir.join("objects").join("object.png"))
        .unwrap();
    dir
}

#[test]
fn summary_parses_categories_and_rejects_empty_inputs() {
    let summary = DatasetSummary::from_reader(summary_json().as_bytes()).unwrap();
    assert_eq!(summary.summary.len(), 1);
    assert_eq!(summary.category_name(18), Some("dog"));
    assert_eq!(summary.category_name(1), None);

    assert!(DatasetSummary::from_reader(r#"{"summary": []}"#.as_bytes()).is_err());
    assert!(
        DatasetSummary::from_reader(
            r#"{"summary": [{"category_id": 1, "image_id": 1, "file_name": "x", "segmentation": []}]}"#
                .as_bytes()
        )
        .is_err()
    );
}

#[test]
fn missing_or_empty_scene_dirs_are_rejected() {
    let summary = DatasetSummary::from_reader(summary_json().as_bytes()).unwrap();
    let dir = temp_dir("factory_empty");
    assert!(SimulatorFactory::new(&dir, summary.clone(), Some(1)).is_err());
    std::fs::create_dir_all(dir.join(DEFAULT_IMAGE_DIR)).unwrap();
    assert!(SimulatorFactory::new(&dir, summary, Some(1)).is_err());
}

#[test]
fn inputs_come_from_the_data_dir_and_summary() {
    let dir = data_dir("factory_inputs");
    let summary = DatasetSummary::from_reader(summary_json().as_bytes()).unwrap();
    let mut factory = SimulatorFactory::with_dirs(
        &dir,
        DEFAULT_IMAGE_DIR,
        "objects",
        summary.clone(),
        Some(3),
    )
    .unwrap();
    assert_eq!(factory.scenes().len(), 2);

    for _ in 0..10 {
        let inputs = factory.next_inputs().unwrap();
        assert!(factory.scenes().contains(&inputs.scene_path));
        assert_eq!(inputs.object_path, dir.join("objects").join("object.png"));
        assert!(summary.summary[0].segmentation.contains(&inputs.polygon));
    }
}

#[test]
fn seeded_factories_repeat_their_choices() {
    let dir = data_dir("factory_seeded");
    let summary = DatasetSummary::from_reader(summary_json().as_bytes()).unwrap();
    let mut a = SimulatorFactory::new(&dir, summary.clone(), Some(42)).unwrap();
    let mut b = SimulatorFactory::new(&dir, summary, Some(42)).unwrap();
    for _ in 0..5 {
        assert_eq!(a.next_inputs().unwrap(), b.next_inputs().unwrap());
    }
}

#[test]
fn created_instances_simulate() {
    let dir = data_dir("factory_instance");
    let summary = DatasetSummary::from_reader(summary_json().as_bytes()).unwrap();
    let mut factory = SimulatorFactory::with_dirs(
        &dir,
        DEFAULT_IMAGE_DIR,
        "objects",
        summary,
        Some(8),
    )
    .unwrap();
    let opts = SimulatorOpts {
        max_steps: 2,
        ..SimulatorOpts::default()
    };
    let mut sim = factory.create_instance(opts).unwrap();
    assert!(sim.opts().seed.is_some());
    sim.start().unwrap();
    assert!(sim.step().unwrap());
    assert_eq!(sim.frame().unwrap().dimensions(), (96, 64));
}
