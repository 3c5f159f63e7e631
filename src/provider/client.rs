// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HTTP client for the hosted identity provider.
//!
//! The provider exposes a GoTrue-style API under `/auth/v1/`:
//!
//! - `POST /auth/v1/token?grant_type=password` — email/password sign-in
//! - `POST /auth/v1/token?grant_type=authorization_code` — one-time code
//!   exchange (codes are single-use by provider contract; a repeated call
//!   fails)
//! - `GET /auth/v1/authorize?provider=..&redirect_to=..&state=..` — browser
//!   redirect target starting an OAuth login
//! - `POST /auth/v1/logout` — invalidate the provider-side session
//!
//! Every request carries the deployment API key. The client performs no
//! local persistence and no token verification; tokens are opaque.

use log::debug;
use serde::Deserialize;
use url::Url;

use crate::config::ProviderConfig;
use crate::portal::session::{Session, SessionTokens, UserIdentity};

use super::error::AuthError;

/// Client for the hosted identity provider's HTTP API.
pub struct AuthClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

/// Successful token-endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: UserIdentity,
}

impl AuthClient {
    /// Build a client from the provider configuration.
    ///
    /// Fails with [`AuthError::ConfigurationMissing`] when either of the two
    /// deployment secrets (provider URL, API key) is absent or malformed.
    pub fn new(cfg: &ProviderConfig) -> Result<Self, AuthError> {
        if cfg.url.is_empty() {
            return Err(AuthError::ConfigurationMissing(
                "provider.url is not set".to_string(),
            ));
        }
        if cfg.api_key.is_empty() {
            return Err(AuthError::ConfigurationMissing(
                "provider.api_key is not set".to_string(),
            ));
        }

        let base = Url::parse(&cfg.url).map_err(|e| {
            AuthError::ConfigurationMissing(format!("provider.url is not a valid URL: {}", e))
        })?;

        let http = reqwest::Client::builder()
            .user_agent(format!("SaasLoginPortal/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base,
            api_key: cfg.api_key.clone(),
        })
    }

    /// Trade a one-time authorization code for a session.
    ///
    /// Codes are single-use: a reused, expired, or unknown code is answered
    /// with a 4xx by the provider and surfaces as
    /// [`AuthError::ExchangeFailed`].
    pub async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError> {
        let url = self.token_endpoint("authorization_code");
        debug!("Exchanging authorization code at {}", url);

        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "auth_code": code }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            parse_session(response).await
        } else if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            debug!("Code exchange rejected ({}): {}", status, detail);
            Err(AuthError::ExchangeFailed(format!(
                "provider returned {}",
                status
            )))
        } else {
            Err(AuthError::ProviderUnavailable(format!(
                "provider returned {}",
                status
            )))
        }
    }

    /// Sign in with an email/password pair.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = self.token_endpoint("password");
        debug!("Password sign-in for {} at {}", email, url);

        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            parse_session(response).await
        } else if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            debug!("Password sign-in rejected ({}): {}", status, detail);
            Err(AuthError::InvalidCredentials)
        } else {
            Err(AuthError::ProviderUnavailable(format!(
                "provider returned {}",
                status
            )))
        }
    }

    /// Build the provider URL starting an OAuth login, embedding the
    /// anti-forgery `state` token.
    pub fn authorize_url(&self, provider: &str, redirect_to: &str, state: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path("/auth/v1/authorize");
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .append_pair("state", state);
        url
    }

    /// Invalidate the provider-side session behind an access token.
    pub async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let mut url = self.base.clone();
        url.set_path("/auth/v1/logout");
        debug!("Logging out at {}", url);

        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AuthError::ProviderUnavailable(format!(
                "logout returned {}",
                status
            )))
        }
    }

    /// The token endpoint for a given grant type.
    fn token_endpoint(&self, grant_type: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path("/auth/v1/token");
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        url
    }
}

/// Deserialize a successful token response into a session.
async fn parse_session(response: reqwest::Response) -> Result<Session, AuthError> {
    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| AuthError::ProviderUnavailable(format!("malformed provider response: {}", e)))?;

    Ok(Session::new(
        token.user,
        SessionTokens {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> AuthClient {
        AuthClient::new(&ProviderConfig {
            url: "https://project.example.co".to_string(),
            api_key: "anon-key".to_string(),
            ..ProviderConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn authorize_url_embeds_state_and_redirect() {
        let client = test_client();
        let url = client.authorize_url("github", "http://localhost:8080/login", "tok123");

        assert_eq!(url.path(), "/auth/v1/authorize");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(pairs.contains(&("provider".to_string(), "github".to_string())));
        assert!(pairs.contains(&("state".to_string(), "tok123".to_string())));
        assert!(pairs.contains(&(
            "redirect_to".to_string(),
            "http://localhost:8080/login".to_string()
        )));
    }

    #[test]
    fn client_requires_both_secrets() {
        let missing_url = AuthClient::new(&ProviderConfig {
            api_key: "anon-key".to_string(),
            ..ProviderConfig::default()
        });
        assert!(matches!(
            missing_url,
            Err(AuthError::ConfigurationMissing(_))
        ));

        let missing_key = AuthClient::new(&ProviderConfig {
            url: "https://project.example.co".to_string(),
            ..ProviderConfig::default()
        });
        assert!(matches!(
            missing_key,
            Err(AuthError::ConfigurationMissing(_))
        ));
    }
}
