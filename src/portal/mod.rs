// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).
//!
//! Portal module
//!
//! This module hosts the login page: the Rocket server, the per-render flow
//! controller, the per-visitor session store, and the page presenter.

pub mod chrome;
pub mod flow;
pub mod render;
pub mod server;
pub mod session;

use anyhow::Result;
use base64::{self, Engine};
use rocket::config::LogLevel;

use crate::config::Config;

/// Start the login portal web server
pub async fn start(config: Config) -> Result<()> {
    // Configure Rocket
    let mut figment = rocket::Config::figment()
        .merge(("ident", config.server.name.clone()))
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port))
        .merge(("log_level", LogLevel::Normal));

    // Configure TLS if certificates are provided
    if let (Some(cert), Some(key)) = (&config.server.cert, &config.server.key) {
        log::debug!("SSL certificates found in configuration, enabling TLS");

        // Decode base64 certificates
        let cert_data = base64::engine::general_purpose::STANDARD.decode(cert)?;
        let key_data = base64::engine::general_purpose::STANDARD.decode(key)?;

        // Create temporary files for the certificates
        let temp_dir = std::env::temp_dir();
        let cert_path = temp_dir.join("server.crt");
        let key_path = temp_dir.join("server.key");

        std::fs::write(&cert_path, cert_data)?;
        std::fs::write(&key_path, key_data)?;

        figment = figment
            .merge(("tls.certs", cert_path))
            .merge(("tls.key", key_path));

        log::info!("TLS enabled for web server");
    }

    let rocket = server::build_rocket(figment, &config).await?;
    rocket.ignite().await?.launch().await?;

    Ok(())
}
