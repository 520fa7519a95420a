use drg_config::{load_layered_yaml_from_strings, report_unused_keys, ConfigMode, UnusedKeyPolicy};

/// Unused-key detection:
/// 1) Unused keys are detected in WARN mode but do not error.
/// 2) Unused keys cause failure in FAIL mode.
/// 3) Keys that are known to be consumed in a mode are not flagged.
/// 4) Exact-leaf consumption does NOT accidentally consume sibling keys.
/// 5) Deterministic ordering of unused pointers.

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let yaml = r#"
tables:
  dir: "/ref/2024"

classify:
  sector: "public"
  cluster_mode: "stay_modes"

unused_section:
  foo: 123
  bar: 456
"#;

    let loaded = load_layered_yaml_from_strings(ConfigMode::Classify, &[yaml]).expect("config load must succeed");

    let report = report_unused_keys(ConfigMode::Classify, &loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert!(!report.is_clean(), "report should detect unused keys");
    assert!(report.unused_leaf_pointers.contains(&"/unused_section/foo".to_string()));
    assert!(report.unused_leaf_pointers.contains(&"/unused_section/bar".to_string()));
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let yaml = r#"
tables:
  dir: "/ref/2024"

classify:
  sector: "public"
  cluster_mode: "stay_modes"

unused_section:
  foo: 1
"#;

    let loaded = load_layered_yaml_from_strings(ConfigMode::Classify, &[yaml]).expect("config load must succeed");

    let result = report_unused_keys(ConfigMode::Classify, &loaded.config_json, UnusedKeyPolicy::Fail);

    assert!(result.is_err(), "fail policy must error when unused keys exist");
    let msg = format!("{}", result.err().unwrap());
    assert!(msg.contains("CONFIG_UNUSED_KEYS"), "error message should contain CONFIG_UNUSED_KEYS");
}

#[test]
fn only_consumed_keys_are_clean_in_classify_mode() {
    let yaml = r#"
tables:
  dir: "/ref/2024"

classify:
  sector: "public"
  cluster_mode: "stay_modes"
"#;

    let loaded = load_layered_yaml_from_strings(ConfigMode::Classify, &[yaml]).expect("config load must succeed");

    let report = report_unused_keys(ConfigMode::Classify, &loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert!(report.is_clean(), "config should be clean when it only uses consumed keys");
}

#[test]
fn exact_leaf_consumption_does_not_consume_sibling_keys() {
    // Classify consumes /classify/sector.
    // It must NOT treat /classify/sector_extra as consumed.
    let yaml = r#"
tables:
  dir: "/ref/2024"

classify:
  sector: "public"
  cluster_mode: "stay_modes"
  sector_extra: 999
"#;

    let loaded = load_layered_yaml_from_strings(ConfigMode::Classify, &[yaml]).expect("config load must succeed");

    let report = report_unused_keys(ConfigMode::Classify, &loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert!(
        report.unused_leaf_pointers.contains(&"/classify/sector_extra".to_string()),
        "sibling key must remain unused"
    );
}

#[test]
fn deterministic_unused_pointer_ordering() {
    let yaml = r#"
tables:
  dir: "/ref/2024"

classify:
  sector: "public"
  cluster_mode: "stay_modes"

unused:
  b: 2
  a: 1
"#;

    let loaded = load_layered_yaml_from_strings(ConfigMode::Classify, &[yaml]).expect("config load must succeed");

    let report = report_unused_keys(ConfigMode::Classify, &loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/unused/a".to_string(), "/unused/b".to_string()],
        "unused pointers must be sorted deterministically"
    );
}
