use super::{apply_env_overrides, apply_file_overrides, load_settings, Settings};

use std::{collections::HashMap, env, fs, time::Duration};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn defaults_match_client_core_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.api_prefix, "/api");
    assert_eq!(settings.access_token, None);
    assert_eq!(settings.request_timeout_secs, None);
    assert_eq!(settings.progress_plan(), client_core::ProgressPlan::default());
    assert_eq!(settings.upload_policy(), client_core::UploadPolicy::default());
    assert_eq!(settings.transfer_config().request_timeout, None);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file_overrides(
        &mut settings,
        r#"
server_url = "https://tutor.example.edu"
access_token = "abc"
request_timeout_secs = 30
progress_interval_ms = "120"
max_upload_bytes = 2048
"#,
    )
    .expect("parse");

    assert_eq!(settings.server_url, "https://tutor.example.edu");
    assert_eq!(settings.access_token.as_deref(), Some("abc"));
    assert_eq!(
        settings.transfer_config().request_timeout,
        Some(Duration::from_secs(30))
    );
    assert_eq!(settings.progress_plan().interval, Duration::from_millis(120));
    assert_eq!(settings.upload_policy().max_bytes, 2048);
    assert!(settings.upload_policy().require_pdf);
}

#[test]
fn bad_values_keep_previous_setting() {
    let mut settings = Settings::default();
    apply_file_overrides(
        &mut settings,
        "progress_step = \"fast\"\nprogress_ceiling = 400\nunknown = 1\nflag = true\n",
    )
    .expect("parse");
    assert_eq!(settings, Settings::default());
}

#[test]
fn unparsable_file_is_an_error() {
    let mut settings = Settings::default();
    assert!(apply_file_overrides(&mut settings, "server_url = ").is_err());
}

#[test]
fn app_prefixed_env_wins_over_tutor_prefixed() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[
            ("TUTOR_SERVER_URL", "http://first"),
            ("APP__SERVER_URL", "http://second"),
            ("TUTOR_ACCESS_TOKEN", "  "),
            ("APP__REQUEST_TIMEOUT_SECS", "0"),
        ]),
    );
    assert_eq!(settings.server_url, "http://second");
    assert_eq!(settings.access_token, None);
    assert_eq!(settings.request_timeout_secs, Some(0));
    assert_eq!(settings.transfer_config().request_timeout, None);
}

#[test]
fn loads_explicit_config_file() {
    let dir = env::temp_dir().join(format!("tutor_config_test_{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("custom.toml");
    fs::write(&path, "api_prefix = \"/v2\"\nprogress_start = 5\n").expect("write");

    let settings = load_settings(Some(&path));
    assert_eq!(settings.api_prefix, "/v2");
    assert_eq!(settings.progress_plan().start, 5);

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn missing_explicit_config_file_falls_back_to_defaults() {
    let path = env::temp_dir().join("tutor_config_test_missing").join("none.toml");
    let settings = load_settings(Some(&path));
    assert_eq!(settings.progress_plan(), Settings::default().progress_plan());
}
