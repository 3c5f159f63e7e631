// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Integration tests for configuration loading and validation.

use base64::Engine;
use std::fs;
use tempfile::tempdir;

use saas_login_portal::config::Config;

#[test]
fn missing_file_creates_a_default_configuration() {
    let dir = tempdir().expect("temp directory");
    let path = dir.path().join("config.yaml");

    let config = Config::from_file(&path).expect("default configuration");

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.address, "127.0.0.1");
    assert_eq!(config.provider.providers, vec!["github", "google"]);
    assert_eq!(config.branding.title, "SaaS Starter Login");
    // The default was written back so the operator can fill in the secrets
    assert!(path.exists());
}

#[test]
fn save_and_reload_roundtrip_preserves_values() {
    let dir = tempdir().expect("temp directory");
    let path = dir.path().join("config.yaml");

    let mut config = Config::default();
    config.server.port = 9443;
    config.provider.url = "https://project.example.co".to_string();
    config.provider.api_key = "anon-key".to_string();
    config.provider.providers = vec!["gitlab".to_string()];
    config.branding.title = "Acme Portal".to_string();
    config.save_to_file(&path).expect("saved configuration");

    let reloaded = Config::from_file(&path).expect("reloaded configuration");
    assert_eq!(reloaded.server.port, 9443);
    assert_eq!(reloaded.provider.url, "https://project.example.co");
    assert_eq!(reloaded.provider.api_key, "anon-key");
    assert_eq!(reloaded.provider.providers, vec!["gitlab"]);
    assert_eq!(reloaded.branding.title, "Acme Portal");
}

#[test]
fn partial_file_falls_back_to_section_defaults() {
    let dir = tempdir().expect("temp directory");
    let path = dir.path().join("config.yaml");
    fs::write(
        &path,
        "provider:\n  url: https://project.example.co\n  api_key: anon-key\n",
    )
    .expect("written configuration");

    let config = Config::from_file(&path).expect("loaded configuration");
    assert_eq!(config.provider.url, "https://project.example.co");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.branding.logo_path, "resources/public/logo.svg");
}

#[test]
fn unknown_keys_are_rejected_by_the_schema() {
    let dir = tempdir().expect("temp directory");
    let path = dir.path().join("config.yaml");
    fs::write(&path, "server:\n  bogus_key: true\n").expect("written configuration");

    let result = Config::from_file(&path);
    assert!(result.is_err());
    // A sample file is produced next to the rejected one
    assert!(dir.path().join("config.sample.yaml").exists());
}

#[test]
fn certificate_without_key_is_rejected() {
    let dir = tempdir().expect("temp directory");
    let path = dir.path().join("config.yaml");
    let cert = base64::engine::general_purpose::STANDARD.encode("---CERT---");
    fs::write(&path, format!("server:\n  cert: {}\n", cert)).expect("written configuration");

    let result = Config::from_file(&path);
    assert!(result.is_err());
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("certificate provided without a key"));
}

#[test]
fn malformed_session_secret_is_rejected() {
    let dir = tempdir().expect("temp directory");
    let path = dir.path().join("config.yaml");
    fs::write(&path, "server:\n  session_secret: dG9vLXNob3J0\n").expect("written configuration");

    let result = Config::from_file(&path);
    assert!(result.is_err());
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("32 bytes"));
}

#[test]
fn invalid_provider_url_is_rejected() {
    let dir = tempdir().expect("temp directory");
    let path = dir.path().join("config.yaml");
    fs::write(&path, "provider:\n  url: 'not a url'\n").expect("written configuration");

    let result = Config::from_file(&path);
    assert!(result.is_err());
}

#[test]
fn empty_provider_list_is_rejected() {
    let dir = tempdir().expect("temp directory");
    let path = dir.path().join("config.yaml");
    fs::write(&path, "provider:\n  providers: []\n").expect("written configuration");

    let result = Config::from_file(&path);
    assert!(result.is_err());
}

#[test]
fn command_line_overrides_take_precedence() {
    let mut config = Config::default();
    config.apply_args(Some(9000), Some("0.0.0.0".to_string()));
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.address, "0.0.0.0");

    // Absent arguments leave the file values untouched
    config.apply_args(None, None);
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.address, "0.0.0.0");
}

#[test]
fn default_session_secret_decodes_to_32_bytes() {
    let config = Config::default();
    let secret = base64::engine::general_purpose::STANDARD
        .decode(&config.server.session_secret)
        .expect("base64 secret");
    assert_eq!(secret.len(), 32);
}
