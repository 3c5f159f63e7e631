// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Configuration Management
//!
//! This module implements configuration handling for the login portal.
//! It supports loading, validating, and saving configuration from YAML files
//! using JSON Schema validation for robust error checking.
//!
//! ## Configuration Structure
//!
//! The configuration is organized as a nested structure with sections:
//! - `server`: Settings for the web server (binding, TLS, cookie secret)
//! - `provider`: The hosted identity provider (URL, API key, OAuth providers)
//! - `branding`: Page title, logo asset, and optional login widget template
//!
//! ## Usage
//!
//! ```no_run
//! use saas_login_portal::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(Some(8081), Some("0.0.0.0".to_string()));
//!
//! // Access configuration values
//! println!("Server port: {}", config.server.port);
//! ```

use anyhow::{Context, Result};
use base64::Engine;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

/// Root configuration structure for the login portal.
///
/// The configuration is deserialized from and serialized to YAML using the
/// serde framework and is validated against a JSON schema before use. Each
/// section falls back to default values when not present in the file, so a
/// minimal configuration only needs the provider secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Settings for the web server component.
    #[serde(default)]
    pub server: ServerConfig,

    /// Settings for the hosted identity provider this portal delegates to.
    ///
    /// Carries the two deployment secrets (provider URL and API key) together
    /// with the list of OAuth providers offered on the login widget.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Branding settings for the rendered page.
    #[serde(default)]
    pub branding: BrandingConfig,
}

/// Configuration for the web server serving the login page.
///
/// Contains network binding parameters, optional TLS material, and the secret
/// key protecting the private visitor cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The TCP port the server will listen on.
    ///
    /// Valid range is 1-65534. Default value is 8080.
    #[serde(default = "default_port")]
    pub port: u16,

    /// The network address the server will bind to.
    ///
    /// Can be an IPv4/IPv6 address or a hostname. Default is "127.0.0.1".
    /// Use "0.0.0.0" to bind to all IPv4 interfaces.
    #[serde(default = "default_address")]
    pub address: String,

    /// The server name reported in HTTP headers and logs.
    #[serde(default = "default_name")]
    pub name: String,

    /// SSL/TLS certificate in PEM format, Base64 encoded.
    ///
    /// If provided, `key` must also be supplied. If either is missing the
    /// server runs in non-TLS mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,

    /// SSL/TLS private key in PEM format, Base64 encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Secret key for the private visitor cookie.
    ///
    /// Must be 32 bytes of Base64. A random value is generated when absent,
    /// which means sessions do not survive a restart.
    #[serde(default = "default_session_secret")]
    pub session_secret: String,
}

/// Configuration for the hosted identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the identity provider, e.g. `https://project.example.co`.
    #[serde(default)]
    pub url: String,

    /// API key sent with every request to the provider.
    #[serde(default)]
    pub api_key: String,

    /// OAuth providers offered on the login widget.
    ///
    /// Default is `["github", "google"]`.
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,

    /// The URL the provider redirects back to after an OAuth login.
    ///
    /// This must point at this portal's `/login` page and be registered with
    /// the provider as an allowed callback.
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,
}

/// Branding settings for the rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandingConfig {
    /// Page title shown in the browser tab and above the login widget.
    #[serde(default = "default_title")]
    pub title: String,

    /// Path to the logo asset rendered at the top of the page.
    ///
    /// A missing file degrades to a text placeholder, never an error.
    #[serde(default = "default_logo_path")]
    pub logo_path: String,

    /// Optional path to a handlebars template overriding the built-in login
    /// widget.
    ///
    /// A missing or malformed template degrades to the manual fallback form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_path: Option<String>,
}

/// Provides the default TCP port (8080) for the web server.
fn default_port() -> u16 {
    8080
}

/// Provides the default network binding address (127.0.0.1).
///
/// This loopback address ensures the server only accepts connections from the
/// local machine. For production use where remote connections are required,
/// this should be changed to "0.0.0.0" or a specific network interface.
fn default_address() -> String {
    "127.0.0.1".to_string()
}

/// Generates the default server name string based on the current package version.
fn default_name() -> String {
    format!("SaasLoginPortal/{}", env!("CARGO_PKG_VERSION"))
}

/// Generate a random session secret key for cookie-based visitor tracking.
fn default_session_secret() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let secret: [u8; 32] = rng.random();
    base64::engine::general_purpose::STANDARD.encode(secret)
}

/// Provides the default OAuth provider list offered on the login widget.
fn default_providers() -> Vec<String> {
    vec!["github".to_string(), "google".to_string()]
}

/// Provides the default OAuth callback URL, pointing at the local login page.
fn default_redirect_url() -> String {
    "http://localhost:8080/login".to_string()
}

/// Provides the default page title.
fn default_title() -> String {
    "SaaS Starter Login".to_string()
}

/// Provides the default logo asset path.
fn default_logo_path() -> String {
    "resources/public/logo.svg".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            address: default_address(),
            name: default_name(),
            cert: None,
            key: None,
            session_secret: default_session_secret(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            providers: default_providers(),
            redirect_url: default_redirect_url(),
        }
    }
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            logo_path: default_logo_path(),
            widget_path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            provider: ProviderConfig::default(),
            branding: BrandingConfig::default(),
        }
    }
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        debug!("Creating sample configuration file at {:?}", path);
        let sample_path = path.with_extension("sample.yaml");

        // Create parent directories if they don't exist
        if let Some(parent) = sample_path.parent() {
            if !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                std::fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        let sample_config = Self::default();
        sample_config
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        // First step: convert YAML to a generic Value
        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // Convert to JSON Value for validation
        let json_value = serde_json::to_value(&yaml_value)
            .context("Failed to convert YAML to JSON for validation")?;

        // Load and validate with the schema
        let schema_str = include_str!("../resources/config.schema.json");
        let schema: serde_json::Value =
            serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

        // Create the validator
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        // Validate before deserializing to Config
        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            // We generate a config.sample.yaml file with the default values
            // for the user to edit
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        // Now that YAML has been validated, deserialize to Config
        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                match Self::create_sample_config(path) {
                    Ok(_) => debug!("Successfully created sample config"),
                    Err(e) => error!("Failed to create sample config: {}", e),
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        // Perform additional specific validations
        if let Err(err) = Self::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only values that are explicitly provided override the existing
    /// configuration.
    pub fn apply_args(&mut self, web_port: Option<u16>, web_address: Option<String>) {
        if let Some(web_port) = web_port {
            debug!("Overriding port from command line: {}", web_port);
            self.server.port = web_port;
        }

        if let Some(web_address) = web_address {
            debug!("Overriding address from command line: {}", web_address);
            self.server.address = web_address;
        }
    }

    /// Validates the configuration against additional rules that aren't
    /// covered by the JSON schema.
    ///
    /// This covers checks that can't be easily expressed in a schema, such as
    /// verifying that certificate and key pairs are both present and that
    /// Base64-encoded material actually decodes.
    fn validate_specific_rules(config: &Config) -> Result<()> {
        debug!("Performing additional validation checks");

        // Validate SSL certificates
        if let Some(cert) = &config.server.cert {
            if config.server.key.is_none() {
                anyhow::bail!("SSL certificate provided without a key");
            }

            let _ = base64::engine::general_purpose::STANDARD
                .decode(cert)
                .context("SSL certificate is not valid base64")?;
        }

        if let Some(key) = &config.server.key {
            if config.server.cert.is_none() {
                anyhow::bail!("SSL key provided without a certificate");
            }

            let _ = base64::engine::general_purpose::STANDARD
                .decode(key)
                .context("SSL key is not valid base64")?;
        }

        // Check value ranges for certain fields
        if config.server.port < 1 || config.server.port > 65534 {
            anyhow::bail!("Invalid port number: {}", config.server.port);
        }

        // Check if the address is in a valid format
        if !is_valid_ip_address(&config.server.address) {
            debug!(
                "Potentially invalid address format: {}",
                config.server.address
            );
            // Just issue a warning but don't block
        }

        // The session secret must decode to 32 bytes for the cookie layer
        let secret = base64::engine::general_purpose::STANDARD
            .decode(&config.server.session_secret)
            .context("Session secret is not valid base64")?;
        if secret.len() != 32 {
            anyhow::bail!(
                "Session secret must decode to 32 bytes, got {}",
                secret.len()
            );
        }

        // The provider URL, when set, must be a well-formed absolute URL
        if !config.provider.url.is_empty() {
            let _ = url::Url::parse(&config.provider.url)
                .with_context(|| format!("Invalid provider URL: {}", config.provider.url))?;
        }

        let _ = url::Url::parse(&config.provider.redirect_url).with_context(|| {
            format!("Invalid redirect URL: {}", config.provider.redirect_url)
        })?;

        if config.provider.providers.is_empty() {
            anyhow::bail!("At least one OAuth provider must be configured");
        }

        Ok(())
    }
}

/// Check if a string is a valid IP address
fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }

    // Special cases
    matches!(addr, "localhost" | "::" | "::0" | "0.0.0.0")
}

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line. It outputs the full JSON schema for the configuration
/// to stdout, formatted for readability.
pub fn output_config_schema() -> Result<()> {
    let schema_str = include_str!("../resources/config.schema.json");

    let schema: serde_json::Value =
        serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}
