// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Error taxonomy for the login portal.
//!
//! Every identity-provider failure is caught at the boundary where it occurs
//! and converted into an inline user message plus a log entry; none of these
//! variants ever propagates into a crash of the page host.

use thiserror::Error;

/// Authentication and rendering failures surfaced by the portal.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The authorization code was invalid, expired, or already used.
    #[error("authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    /// The email/password pair was rejected by the provider.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Network fault or provider-side error while talking to the provider.
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Structural fault in the primary login widget template.
    ///
    /// Triggers the degraded fallback form rather than a terminal failure.
    #[error("login widget fault: {0}")]
    WidgetFault(String),

    /// A required configuration value or asset file is absent.
    #[error("missing configuration or asset: {0}")]
    ConfigurationMissing(String),
}

impl AuthError {
    /// The non-fatal message rendered inline on the page for this error.
    pub fn inline_message(&self) -> &'static str {
        match self {
            AuthError::ExchangeFailed(_) => "Failed to exchange code for session.",
            AuthError::InvalidCredentials => "Invalid email or password.",
            AuthError::ProviderUnavailable(_) => {
                "The identity provider is currently unavailable. Please try again."
            }
            AuthError::WidgetFault(_) | AuthError::ConfigurationMissing(_) => {
                "The login widget could not be loaded."
            }
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::ProviderUnavailable(err.to_string())
    }
}
