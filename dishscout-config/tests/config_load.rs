use dishscout_common::observability::LogFormat;
use dishscout_config::DishscoutConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn loads_file_with_env_placeholder() {
    let tmp = TempDir::new().unwrap();
    let file_yaml = r#"
version: "1"
llm:
  provider: gemini
  api_key: "${DISHSCOUT_TEST_GEMINI_KEY}"
  model: gemini-2.0-flash
  timeout_secs: 12
  maps_grounding: false
search:
  result_count: 5
  require_links: true
logging:
  format: json
  filter: debug
"#;
    let p = write_yaml(&tmp, "dishscout.yaml", file_yaml);

    temp_env::with_var("DISHSCOUT_TEST_GEMINI_KEY", Some("abc123"), || {
        let config = DishscoutConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config");

        assert_eq!(config.version.as_deref(), Some("1"));
        assert_eq!(config.llm.api_key().as_deref(), Some("abc123"));
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.llm.timeout_secs, 12);
        assert!(!config.llm.maps_grounding);
        assert_eq!(config.search.result_count, 5);
        assert!(config.search.require_links);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "debug");
    });
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "dishscout.yaml", "search:\n  result_count: 5\n");

    temp_env::with_vars(
        [
            ("DISHSCOUT__SEARCH__RESULT_COUNT", Some("20")),
            ("DISHSCOUT__LLM__MODEL", Some("gemini-2.5-pro")),
        ],
        || {
            let config = DishscoutConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load config");
            assert_eq!(config.search.result_count, 20);
            assert_eq!(config.llm.model, "gemini-2.5-pro");
        },
    );
}

#[test]
#[serial]
fn env_overrides_inline_yaml_added_after_files() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "dishscout.yaml", "search:\n  result_count: 5\n");

    temp_env::with_var("DISHSCOUT__SEARCH__RESULT_COUNT", Some("7"), || {
        let config = DishscoutConfigLoader::new()
            .with_file(&p)
            .with_yaml_str("search:\n  result_count: 12\n  require_links: true\n")
            .load()
            .expect("load config");
        assert_eq!(config.search.result_count, 7);
        assert!(config.search.require_links);
    });
}

#[test]
#[serial]
fn missing_optional_file_is_fine() {
    let tmp = TempDir::new().unwrap();
    let config = DishscoutConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults");
    assert_eq!(config.search.result_count, 20);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = DishscoutConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}
