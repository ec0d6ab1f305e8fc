use regd::{Registry, RegistryConfig, RegistryError, load_config};
use serde_json::json;
use std::fs;

#[test]
fn config_defaults_are_strict() {
    let cfg = RegistryConfig::default();
    assert!(cfg.strict_targets);
    assert!(cfg.dedupe);
    assert_eq!(Registry::new().config(), &cfg);
}

#[test]
fn config_deserializes_with_defaults() {
    let cfg: RegistryConfig =
        serde_json::from_value(json!({ "strict_targets": false })).expect("config deserialize");
    assert!(!cfg.strict_targets);
    assert!(cfg.dedupe);
}

#[test]
fn load_config_reads_file() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let path = tmp_dir.path().join("regd.toml");
    fs::write(&path, "dedupe = false\n")?;

    let cfg: RegistryConfig = load_config(Some(&path))?;
    assert!(!cfg.dedupe);
    assert!(cfg.strict_targets);

    let registry = Registry::with_config(cfg);
    assert!(!registry.config().dedupe);
    Ok(())
}

#[test]
fn load_config_missing_file_is_config_error() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let err = load_config::<RegistryConfig>(Some(tmp_dir.path().join("absent.toml")))
        .expect_err("missing file should fail");

    assert!(matches!(err, RegistryError::Config { context: Some(_), .. }));
    assert!(err.to_string().contains("Failed to build config"));
    Ok(())
}
