use super::*;

#[test]
fn defaults_match_documented_constants() {
    let config = SearchConfig::default();
    assert_eq!(config.parent_check_try_limit, 1);
    assert_eq!(config.late_acceptance.queue_size, 400);
    assert_eq!(config.exploration.backoff_base, 10);
    assert!((config.exploration.backoff_multiplier - 1.3).abs() < 1e-9);
    assert_eq!(config.exploration.backoff_increase_limit, 15);
    assert!((config.ucb.exploration_bias - 2.0).abs() < 1e-9);
    assert_eq!(config.random_seed, None);
    assert_eq!(config.iteration_limit, None);
}

#[test]
fn partial_toml_keeps_defaults_elsewhere() {
    let config = SearchConfig::from_toml_str(
        r#"
        iteration_limit = 5000

        [ucb]
        exploration_bias = 1.5
        "#,
    )
    .unwrap();
    assert_eq!(config.iteration_limit, Some(5000));
    assert!((config.ucb.exploration_bias - 1.5).abs() < 1e-9);
    assert_eq!(config.late_acceptance.queue_size, 400);
}

#[test]
fn round_trips_through_toml() {
    let mut config = SearchConfig::default();
    config.random_seed = Some(9);
    config.sanity_check_interval = Some(100);
    let text = toml::to_string(&config).unwrap();
    let back = SearchConfig::from_toml_str(&text).unwrap();
    assert_eq!(back.random_seed, Some(9));
    assert_eq!(back.sanity_check_interval, Some(100));
    assert_eq!(back.late_acceptance.queue_size, config.late_acceptance.queue_size);
}

#[test]
fn rejects_invalid_values() {
    assert!(SearchConfig::from_toml_str("parent_check_try_limit = 0").is_err());
    assert!(SearchConfig::from_toml_str("[exploration]\nbackoff_multiplier = 0.5").is_err());
    assert!(SearchConfig::from_toml_str("not valid toml [").is_err());
}

#[test]
fn missing_file_is_an_io_error() {
    let err = SearchConfig::load("/nonexistent/search.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
