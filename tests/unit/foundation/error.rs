use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LayeringError::invalid_argument("x")
            .to_string()
            .contains("invalid argument:")
    );
    assert!(
        LayeringError::not_configured("x")
            .to_string()
            .contains("not configured:")
    );
    assert!(
        LayeringError::internal("x")
            .to_string()
            .contains("internal error:")
    );
    assert!(LayeringError::config("x").to_string().contains("config error:"));
    assert!(
        LayeringError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn kind_buckets_the_taxonomy() {
    assert_eq!(
        LayeringError::invalid_argument("pipe").kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        LayeringError::not_configured("topology").kind(),
        ErrorKind::NotConfigured
    );
    assert_eq!(LayeringError::internal("slots").kind(), ErrorKind::Internal);
    assert_eq!(LayeringError::config("bound").kind(), ErrorKind::Other);
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LayeringError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), ErrorKind::Other);
}

#[test]
fn serde_json_errors_convert() {
    let err: LayeringError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::Other);
    assert!(err.to_string().contains("serialization error:"));
}
