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

#[test]
fn frame_names_are_zero_padded() {
    assert_eq!(frame_file_name(7), "0007.jpg");
    assert_eq!(frame_file_name(1234), "1234.jpg");
}

#[test]
fn ground_truth_truncates_then_appends() {
    let dir = temp_dir("gt_log");
    let path = dir.join(GROUND_TRUTH_FILE);
    std::fs::write(&path, "stale\n").unwrap();

    let b = BoundingBox {
        x1: 1.5,
        y1: 2.0,
        x2: 10.9,
        y2: 20.0,
    };
    let mut w = GroundTruthWriter::create(&path).unwrap();
    w.push(&b).unwrap();
    w.push(&b).unwrap();
    assert_eq!(w.path(), path.as_path());
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "1,2,10,20\n1,2,10,20\n"
    );

    drop(w);
    let mut w = GroundTruthWriter::create(&path).unwrap();
    w.push(&b).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "1,2,10,20\n");
}

#[test]
fn frames_save_as_jpeg_and_png() {
    let dir = temp_dir("frame_save");
    let frame = RgbaImage::from_pixel(8, 6, image::Rgba([10, 20, 30, 255]));
    for name in ["0001.jpg", "0001.png"] {
        let path = dir.join(name);
        save_frame_image(&frame, &path).unwrap();
        let back = image::open(&path).unwrap();
        assert_eq!((back.width(), back.height()), (8, 6));
    }
}
