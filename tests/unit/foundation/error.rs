use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TrackSimError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        TrackSimError::geometry("x")
            .to_string()
            .contains("geometry error:")
    );
    assert!(
        TrackSimError::model("x")
            .to_string()
            .contains("trajectory model error:")
    );
    assert!(
        TrackSimError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TrackSimError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
