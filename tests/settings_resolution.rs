use serde_json::{json, Map, Value};
use std::fs;
use tempfile::TempDir;

use surge::settings::{
    load_settings_file, recursive_update, resolve, BoolFallback, DeployDefaults, ServiceManager,
    SettingSource, UpdateOptions,
};

fn obj(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}

fn defaults() -> Map<String, Value> {
    DeployDefaults::default().to_settings()
}

fn declared() -> Map<String, Value> {
    obj(json!({
        "HOST": "app.example.com",
        "User": "deploy",
        "group": "www-data",
        "DEPLOY_PATH": "/srv/app",
        "BRANCH_NAME": "production",
    }))
}

#[test]
fn overrides_beat_declared_beat_defaults() {
    let settings = resolve(&defaults(), &declared(), &obj(json!({"branch_name": "hotfix"}))).unwrap();
    assert_eq!(settings.get_str("branch_name"), Some("hotfix"));
    assert_eq!(settings.get_str("BRANCH_NAME"), Some("hotfix"));
    assert_eq!(settings.get("django_project"), Some(&json!(true)));
    assert_eq!(settings.deploy().os_service_manager, ServiceManager::Upstart);

    assert_eq!(settings.source("django_project"), SettingSource::Default);
    assert_eq!(settings.source("branch_name"), SettingSource::OverriddenDefault);
    assert_eq!(settings.source("host"), SettingSource::Configured);
}

#[test]
fn applying_the_same_override_twice_is_idempotent() {
    let mut settings = resolve(&defaults(), &declared(), &Map::new()).unwrap();
    let patch = obj(json!({"skip_migrate": "yes", "extra": {"a": 1}}));

    settings.update(&patch).unwrap();
    let once = settings.as_map().clone();
    settings.update(&patch).unwrap();

    assert_eq!(settings.as_map(), &once);
}

#[test]
fn boolean_strings_coerce_on_read() {
    let settings = resolve(
        &defaults(),
        &obj(json!({
            "host": "h", "user": "u", "group": "g", "deploy_path": "/p",
            "require_clean": true,
        })),
        &obj(json!({"require_clean": "false"})),
    )
    .unwrap();

    assert_eq!(settings.get("require_clean"), Some(&json!("false")));
    assert!(!settings.get_bool("require_clean", &BoolFallback::Raise).unwrap());
}

#[test]
fn unboolable_setting_is_a_typed_error_when_strict() {
    let settings = resolve(&defaults(), &declared(), &obj(json!({"restart_nginx": "sometimes"}))).unwrap();
    let err = settings.get_bool("restart_nginx", &BoolFallback::Raise).unwrap_err();
    assert_eq!(err.code.as_str(), "validation.unboolable");
    assert!(settings
        .get_bool("restart_nginx", &BoolFallback::Default(json!(false)))
        .is_ok());
}

#[test]
fn missing_required_keys_are_reported_together() {
    let err = resolve(&defaults(), &obj(json!({"host": "h", "user": "u"})), &Map::new()).unwrap_err();
    assert_eq!(err.code.as_str(), "config.missing_key");
    assert_eq!(err.details["keys"], json!(["GROUP", "DEPLOY_PATH"]));
}

#[test]
fn wrong_typed_required_keys_are_reported_with_the_missing_ones() {
    let err = resolve(
        &defaults(),
        &obj(json!({"host": 5, "user": "u", "group": ["g"]})),
        &Map::new(),
    )
    .unwrap_err();

    assert_eq!(err.code.as_str(), "config.missing_key");
    assert_eq!(err.details["keys"], json!(["DEPLOY_PATH"]));
    assert_eq!(err.details["invalid"], json!(["HOST", "GROUP"]));
    assert!(err.message.contains("not strings: HOST, GROUP"));
}

#[test]
fn missing_deploy_path_is_named() {
    let mut incomplete = declared();
    incomplete.remove("DEPLOY_PATH");
    let err = resolve(&defaults(), &incomplete, &Map::new()).unwrap_err();
    assert!(err.message.contains("DEPLOY_PATH"));
}

#[test]
fn unknown_service_manager_is_rejected_before_anything_runs() {
    let err = resolve(&defaults(), &declared(), &obj(json!({"os_service_manager": "runit"}))).unwrap_err();
    assert_eq!(err.code.as_str(), "config.invalid_value");
    assert_eq!(err.details["key"], "os_service_manager");
}

#[test]
fn derived_settings_fill_in() {
    let settings = resolve(&defaults(), &declared(), &Map::new()).unwrap();
    let deploy = settings.deploy();
    assert_eq!(deploy.chown_target, "deploy:www-data");
    assert_eq!(deploy.crontab_owner, "deploy");
    assert_eq!(deploy.git_tree, "/srv/app");
    assert_eq!(deploy.port, 22);
}

#[test]
fn crontab_owner_is_fixed_once_set() {
    let mut settings = resolve(&defaults(), &declared(), &Map::new()).unwrap();

    settings.update(&obj(json!({"user": "release"}))).unwrap();
    assert_eq!(settings.deploy().crontab_owner, "deploy");
    assert_eq!(settings.deploy().chown_target, "release:www-data");

    settings.update(&obj(json!({"crontab_owner": "cron"}))).unwrap();
    assert_eq!(settings.deploy().crontab_owner, "cron");
}

#[test]
fn failed_update_leaves_settings_untouched() {
    let mut settings = resolve(&defaults(), &declared(), &Map::new()).unwrap();
    let before = settings.as_map().clone();

    assert!(settings.update(&obj(json!({"deploy_path": ""}))).is_err());
    assert_eq!(settings.as_map(), &before);
}

#[test]
fn nested_mappings_merge_recursively() {
    let mut base = obj(json!({"1": {"2": 3, "4": 5}}));
    recursive_update(&mut base, &obj(json!({"1": {"2": 4, "3": 4}})), &UpdateOptions::default()).unwrap();
    assert_eq!(Value::Object(base), json!({"1": {"2": 4, "3": 4, "4": 5}}));
}

#[test]
fn settings_file_keys_are_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("surge.json");
    fs::write(
        &path,
        r#"{"Host": "app.example.com", "USER": "deploy", "Group": "www", "deploy_path": "/srv/app", "BOUNCE_SERVICES": ["web"]}"#,
    )
    .unwrap();

    let declared = load_settings_file(&path).unwrap();
    let settings = resolve(&defaults(), &declared, &Map::new()).unwrap();
    assert_eq!(settings.get("bounce_services"), Some(&json!(["web"])));
    assert_eq!(settings.deploy().host, "app.example.com");
}

#[test]
fn non_object_settings_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("surge.json");
    fs::write(&path, "[1, 2]").unwrap();
    assert_eq!(
        load_settings_file(&path).unwrap_err().code.as_str(),
        "config.invalid_value"
    );

    fs::write(&path, "{not json").unwrap();
    assert_eq!(
        load_settings_file(&path).unwrap_err().code.as_str(),
        "config.invalid_json"
    );
}
