// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Session model and the process-wide per-visitor state store.
//!
//! A browser is identified by a private cookie holding an opaque visitor id.
//! Each visitor owns at most one [`Session`] plus, between rendering the
//! login widget and the provider calling back, one pending anti-forgery
//! state token. The store lives for the lifetime of the process; nothing is
//! persisted.

use std::collections::HashMap;
use std::sync::RwLock;

use base64::Engine;
use rocket::http::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};

/// Name of the private cookie carrying the opaque visitor id.
const VISITOR_COOKIE: &str = "portal_visitor";

/// Role string assigned unconditionally to every authenticated user.
///
/// No enforcement logic reads it; it is carried on the session for the
/// hosting application.
pub const DEFAULT_ROLE: &str = "user";

/// Identity of the authenticated user as returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Provider-assigned user id
    pub id: String,
    /// The user's email address
    pub email: String,
}

/// Opaque provider tokens attached to a session.
///
/// The portal never inspects or verifies these; they are only handed back to
/// the provider on logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Authenticated user context held for the duration of a browser visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: UserIdentity,
    pub tokens: SessionTokens,
    /// Fixed role classification, see [`DEFAULT_ROLE`].
    pub role: String,
}

impl Session {
    /// Build a session from the provider's response, assigning the fixed role.
    pub fn new(user: UserIdentity, tokens: SessionTokens) -> Self {
        Self {
            user,
            tokens,
            role: DEFAULT_ROLE.to_string(),
        }
    }
}

/// Per-visitor slot in the state store.
#[derive(Debug, Default, Clone)]
struct VisitorEntry {
    session: Option<Session>,
    pending_state: Option<String>,
}

/// Process-wide per-visitor state store.
///
/// Mutated only by the login flow routes when applying controller decisions.
/// Within one visitor's browser session there are no concurrent writers, so a
/// plain `RwLock` over the map is sufficient.
#[derive(Debug, Default)]
pub struct SessionStore {
    entries: RwLock<HashMap<String, VisitorEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the visitor currently holds a session.
    pub fn has_session(&self, visitor: &str) -> bool {
        let entries = self.entries.read().unwrap();
        entries
            .get(visitor)
            .map(|e| e.session.is_some())
            .unwrap_or(false)
    }

    /// The visitor's current session, if any.
    pub fn session(&self, visitor: &str) -> Option<Session> {
        let entries = self.entries.read().unwrap();
        entries.get(visitor).and_then(|e| e.session.clone())
    }

    /// Store a freshly exchanged session, replacing any stale one.
    pub fn put_session(&self, visitor: &str, session: Session) {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.entry(visitor.to_string()).or_default();
        entry.session = Some(session);
    }

    /// Remove and return the visitor's session, e.g. on logout.
    pub fn clear_session(&self, visitor: &str) -> Option<Session> {
        let mut entries = self.entries.write().unwrap();
        entries.get_mut(visitor).and_then(|e| e.session.take())
    }

    /// Record the pending anti-forgery state token for the visitor's current
    /// login attempt, replacing any abandoned one.
    pub fn set_pending_state(&self, visitor: &str, state: String) {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.entry(visitor.to_string()).or_default();
        entry.pending_state = Some(state);
    }

    /// Consume the pending state token. Tokens are single-use: a second
    /// callback with the same token finds nothing to compare against.
    pub fn take_pending_state(&self, visitor: &str) -> Option<String> {
        let mut entries = self.entries.write().unwrap();
        entries.get_mut(visitor).and_then(|e| e.pending_state.take())
    }
}

/// Mint a random opaque token (state tokens, visitor ids).
pub fn mint_token() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let bytes: [u8; 24] = rng.random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// The visitor id for this browser, minting the private cookie on first
/// contact.
pub fn visitor_id(cookies: &CookieJar<'_>) -> String {
    if let Some(cookie) = cookies.get_private(VISITOR_COOKIE) {
        return cookie.value().to_string();
    }

    let id = mint_token();
    let mut cookie = Cookie::new(VISITOR_COOKIE, id.clone());
    cookie.set_http_only(true);
    cookie.set_path("/");
    // No max-age: the cookie lasts for the browser session only
    cookies.add_private(cookie);
    id
}
