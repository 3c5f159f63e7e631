// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Login flow controller.
//!
//! Each page load is one pass through a three-phase state machine:
//!
//! - `CallbackPending` — the request carries an authorization code and state
//!   token from the provider
//! - `Authenticated` — the visitor already holds a session in the store
//! - `Unauthenticated` — default: render the login widget
//!
//! The phase is selected from an explicit per-request context (query
//! parameters plus a store snapshot); the routes apply the outcome to the
//! store. When both a callback and an existing session are present the
//! callback wins, so the freshest login always produces the session.

/// OAuth callback parameters carried on the page URL.
#[derive(Debug, Default, Clone)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Phase of the login flow for one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// An authorization code is waiting to be exchanged.
    CallbackPending { code: String, state: String },
    /// A session exists in the store.
    Authenticated,
    /// No callback and no session: show the login widget.
    Unauthenticated,
}

/// Select the phase for this render pass.
///
/// A callback requires both `code` and `state`; one without the other is
/// treated as "no callback", not an error. A callback takes precedence over
/// an existing session.
pub fn resolve(params: &CallbackParams, has_session: bool) -> Phase {
    match (&params.code, &params.state) {
        (Some(code), Some(state)) => Phase::CallbackPending {
            code: code.clone(),
            state: state.clone(),
        },
        _ if has_session => Phase::Authenticated,
        _ => Phase::Unauthenticated,
    }
}

/// Compare the state token returned by the provider against the pending one.
///
/// The pending token has already been consumed from the store at this point,
/// so a replayed callback finds nothing to match and is refused.
pub fn state_matches(returned: &str, pending: Option<&str>) -> bool {
    match pending {
        Some(expected) => expected == returned,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(code: Option<&str>, state: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(String::from),
            state: state.map(String::from),
        }
    }

    #[test]
    fn callback_selected_when_code_and_state_present() {
        let phase = resolve(&params(Some("abc"), Some("tok")), false);
        assert_eq!(
            phase,
            Phase::CallbackPending {
                code: "abc".to_string(),
                state: "tok".to_string()
            }
        );
    }

    #[test]
    fn callback_takes_precedence_over_existing_session() {
        // Freshest login wins: a pending code is exchanged even when a
        // session already exists.
        let phase = resolve(&params(Some("abc"), Some("tok")), true);
        assert!(matches!(phase, Phase::CallbackPending { .. }));
    }

    #[test]
    fn partial_callback_is_not_a_callback() {
        assert_eq!(resolve(&params(Some("abc"), None), false), Phase::Unauthenticated);
        assert_eq!(resolve(&params(None, Some("tok")), false), Phase::Unauthenticated);
        assert_eq!(resolve(&params(Some("abc"), None), true), Phase::Authenticated);
    }

    #[test]
    fn session_selects_authenticated() {
        assert_eq!(resolve(&params(None, None), true), Phase::Authenticated);
    }

    #[test]
    fn default_is_unauthenticated() {
        assert_eq!(resolve(&params(None, None), false), Phase::Unauthenticated);
    }

    #[test]
    fn state_comparison_is_single_use() {
        assert!(state_matches("tok", Some("tok")));
        assert!(!state_matches("tok", Some("other")));
        // Consumed or never-minted pending token refuses the callback
        assert!(!state_matches("tok", None));
    }
}
