//! Unit tests for `AppError` display format and classification.

use proman::AppError;

#[test]
fn display_prefixes_identify_the_category() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::UnknownKind("x".into()), "unknown kind: x"),
        (AppError::DuplicateKind("x".into()), "duplicate kind: x"),
        (AppError::InvalidConfig("x".into()), "invalid config: x"),
        (
            AppError::UnsupportedConfigShape("x".into()),
            "unsupported config shape: x",
        ),
        (
            AppError::InvalidProcessEntry("x".into()),
            "invalid process entry: x",
        ),
        (AppError::NotFound("x".into()), "not found: x"),
        (AppError::StartFailure("x".into()), "start failure: x"),
        (AppError::StopTimeout("x".into()), "stop timeout: x"),
        (AppError::Http("x".into()), "http: x"),
        (AppError::Ipc("x".into()), "ipc: x"),
        (AppError::Io("x".into()), "io: x"),
    ];

    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn error_message_no_trailing_period() {
    let err = AppError::NotFound("process 'api' not found".into());
    let s = err.to_string();
    assert!(!s.ends_with('.'), "error message must not end with a period: {s}");
}

#[test]
fn resolution_errors_are_classified() {
    assert!(AppError::UnknownKind("x".into()).is_resolution_error());
    assert!(AppError::DuplicateKind("x".into()).is_resolution_error());
    assert!(AppError::InvalidConfig("x".into()).is_resolution_error());
    assert!(AppError::UnsupportedConfigShape("x".into()).is_resolution_error());
    assert!(AppError::InvalidProcessEntry("x".into()).is_resolution_error());
}

#[test]
fn lifecycle_errors_are_not_resolution_errors() {
    assert!(!AppError::NotFound("x".into()).is_resolution_error());
    assert!(!AppError::StartFailure("x".into()).is_resolution_error());
    assert!(!AppError::StopTimeout("x".into()).is_resolution_error());
    assert!(!AppError::Config("x".into()).is_resolution_error());
}

#[test]
fn yaml_errors_convert_to_config_errors() {
    let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [1, 2").unwrap_err();
    let err = AppError::from(yaml_err);
    assert!(matches!(err, AppError::Config(_)));
    assert!(err.to_string().starts_with("config: invalid process document"));
}

#[test]
fn toml_errors_convert_to_config_errors() {
    let toml_err = toml::from_str::<toml::Value>("stop_timeout_seconds = ").unwrap_err();
    let err = AppError::from(toml_err);
    assert!(err.to_string().starts_with("config: invalid settings"));
}
