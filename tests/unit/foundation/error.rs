use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ScenecastError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ScenecastError::timeout("x")
            .to_string()
            .contains("readiness timeout:")
    );
    assert!(ScenecastError::media("x").to_string().contains("media error:"));
    assert!(
        ScenecastError::export("x")
            .to_string()
            .contains("export error:")
    );
    assert!(
        ScenecastError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn only_timeouts_are_retryable() {
    assert!(ScenecastError::timeout("slow").is_retryable());
    assert!(!ScenecastError::media("decode").is_retryable());
    assert!(!ScenecastError::Cancelled.is_retryable());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ScenecastError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
