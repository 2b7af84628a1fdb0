//! Tests for layered configuration loading.
//!
//! Process-environment access is serialized through a lock because Rust
//! tests share the process env.

use std::{
    env, fs,
    sync::{Mutex, MutexGuard, OnceLock},
};

use tempfile::TempDir;

use nova_import::config::ConfigLoader;

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    unsafe {
        env::remove_var("NOVA_IMPORT_PROFILE");
        env::remove_var("NOVA_IMPORT_API_BIND_ADDR");
        env::remove_var("NOVA_IMPORT_LOG_LEVEL");
        env::remove_var("NOVA_IMPORT_DATABASE_URL");
        env::remove_var("NOVA_IMPORT_OPERATOR_TOKEN");
        env::remove_var("NOVA_IMPORT_OPERATOR_TOKENS");
        env::remove_var("NOVA_IMPORT_PROGRESS_HEARTBEAT_SECONDS");
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let cfg = loader.load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "dev");
    assert_eq!(cfg.api_bind_addr, "127.0.0.1:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.progress_heartbeat_seconds, 15);
    assert!(cfg.operator_tokens.is_empty());
    cfg.bind_addr().expect("default bind addr parses");

    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();
    write_env_file(
        &dir,
        ".env",
        "NOVA_IMPORT_LOG_LEVEL=warn\nNOVA_IMPORT_PROFILE=staging\n",
    );
    write_env_file(&dir, ".env.staging", "NOVA_IMPORT_LOG_LEVEL=debug\n");

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let cfg = loader.load().expect("layered config loads");

    assert_eq!(cfg.profile, "staging");
    // The profile file overrides the base file.
    assert_eq!(cfg.log_level, "debug");

    clear_env();
}

#[test]
fn process_env_wins_over_files() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();
    write_env_file(&dir, ".env", "NOVA_IMPORT_LOG_LEVEL=warn\n");

    unsafe {
        env::set_var("NOVA_IMPORT_LOG_LEVEL", "trace");
    }

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let cfg = loader.load().expect("config loads");

    assert_eq!(cfg.log_level, "trace");

    clear_env();
}

#[test]
fn operator_tokens_accept_single_and_list_forms() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();

    unsafe {
        env::set_var("NOVA_IMPORT_OPERATOR_TOKEN", "only-one");
    }
    let cfg = ConfigLoader::with_base_dir(dir.path().to_path_buf())
        .load()
        .unwrap();
    assert_eq!(cfg.operator_tokens, vec!["only-one".to_string()]);

    unsafe {
        env::remove_var("NOVA_IMPORT_OPERATOR_TOKEN");
        env::set_var("NOVA_IMPORT_OPERATOR_TOKENS", "alpha, beta,,gamma");
    }
    let cfg = ConfigLoader::with_base_dir(dir.path().to_path_buf())
        .load()
        .unwrap();
    assert_eq!(
        cfg.operator_tokens,
        vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()]
    );

    clear_env();
}

#[test]
fn invalid_heartbeat_is_rejected() {
    let _guard = env_guard();
    clear_env();

    let dir = TempDir::new().unwrap();
    write_env_file(&dir, ".env", "NOVA_IMPORT_PROGRESS_HEARTBEAT_SECONDS=0\n");

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    assert!(loader.load().is_err());

    clear_env();
}
