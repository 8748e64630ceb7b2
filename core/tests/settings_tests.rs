// tests/settings_tests.rs
mod common;

use common::*;
use reqchain::{ChainError, Settings, TraversalOptions};
use serial_test::serial;
use std::io::Write;
use std::time::Duration;

const TIMEOUT_VAR: &str = "REQCHAIN_CUSTOM_SCRIPT_TIMEOUT";
const PARALLEL_VAR: &str = "REQCHAIN_RUN_PARALLEL_CONDITION_EVALUATIONS";

fn clear_env() {
  std::env::remove_var(TIMEOUT_VAR);
  std::env::remove_var(PARALLEL_VAR);
}

#[test]
fn test_defaults() {
  let settings = Settings::default();
  assert!(!settings.run_parallel_condition_evaluations);
  assert!(!settings.continue_failed_condition_evaluation);
  assert_eq!(settings.custom_script_timeout, 30);
  assert_eq!(settings.traversal_options(), TraversalOptions::default());
  assert_eq!(settings.script_timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn test_override_closure() {
  let settings = Settings::new(|s| {
    s.continue_failed_condition_evaluation = true;
    s.custom_script_timeout = 5;
  });
  assert_eq!(
    settings.traversal_options(),
    TraversalOptions {
      parallel_evaluation: false,
      continue_on_failure: true,
    }
  );
  assert_eq!(settings.script_timeout(), Some(Duration::from_secs(5)));
}

#[test]
#[serial]
fn test_load_reads_environment() {
  setup_tracing();
  clear_env();
  std::env::set_var(TIMEOUT_VAR, "7");
  std::env::set_var(PARALLEL_VAR, "true");

  let loaded = Settings::load();
  clear_env();

  let settings = loaded.expect("settings should load from the environment");
  assert_eq!(settings.custom_script_timeout, 7);
  assert!(settings.run_parallel_condition_evaluations);
  assert!(!settings.continue_failed_condition_evaluation);
}

#[test]
#[serial]
fn test_load_from_file_then_environment() {
  setup_tracing();
  clear_env();
  let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
  writeln!(file, "continue_failed_condition_evaluation = true").unwrap();
  writeln!(file, "custom_script_timeout = 12").unwrap();

  let from_file = Settings::load_from(file.path()).unwrap();
  assert!(from_file.continue_failed_condition_evaluation);
  assert_eq!(from_file.custom_script_timeout, 12);
  assert!(!from_file.run_parallel_condition_evaluations);

  std::env::set_var(TIMEOUT_VAR, "3");
  let overridden = Settings::load_from(file.path());
  clear_env();
  assert_eq!(overridden.unwrap().custom_script_timeout, 3);
}

#[test]
#[serial]
fn test_load_from_missing_file_is_a_configuration_error() {
  setup_tracing();
  clear_env();
  let err = Settings::load_from("/definitely/missing/reqchain.toml").unwrap_err();
  assert!(matches!(err, ChainError::Configuration(_)), "got {:?}", err);
}

#[test]
#[serial]
fn test_load_rejects_malformed_values() {
  setup_tracing();
  clear_env();
  std::env::set_var(TIMEOUT_VAR, "soon");
  let loaded = Settings::load();
  clear_env();
  assert!(matches!(loaded, Err(ChainError::Configuration(_))));
}
