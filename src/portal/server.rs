// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rocket server assembly and the login page routes.
//!
//! Each route is one synchronous pass through the flow controller: inspect
//! the incoming request, consult the per-visitor state store, call the
//! identity provider when a callback or form submission demands it, and
//! render. Every provider failure is caught here and answered with an inline
//! message; nothing propagates to the page host.

use anyhow::{Context as _, Result};
use include_dir::{include_dir, Dir};
use log::{info, warn};
use rocket::figment::Figment;
use rocket::form::{Form, FromForm};
use rocket::http::{ContentType, CookieJar, Header};
use rocket::response::content::RawHtml;
use rocket::response::{Redirect, Responder};
use rocket::{async_trait, get, post, routes, uri, Build, Request, Response, Rocket, State};
use std::io::Cursor;
use std::path::PathBuf;

use crate::config::Config;
use crate::provider::{AuthClient, AuthError};

use super::chrome::{ChromeHost, StaticChrome};
use super::flow::{self, CallbackParams, Phase};
use super::render::{AccountView, LoginView, PageRenderer};
use super::session::{self, SessionStore};

const STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/resources/public");

#[derive(Debug)]
struct StaticFileResponse(Vec<u8>, ContentType);

#[async_trait]
impl<'r> Responder<'r, 'r> for StaticFileResponse {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'static> {
        Response::build()
            .header(self.1)
            .header(Header {
                name: "Cache-Control".into(),
                value: "max-age=604800".into(), // 1 week
            })
            .sized_body(self.0.len(), Cursor::new(self.0))
            .ok()
    }
}

/// Response of one pass through the login flow.
#[derive(Responder)]
pub enum PortalPage {
    Redirect(Redirect),
    Html(RawHtml<String>),
    #[response(status = 401)]
    Unauthorized(RawHtml<String>),
}

/// Manual sign-in form data (fallback path).
#[derive(Debug, FromForm)]
pub struct LoginForm {
    email: String,
    password: String,
    redirect: Option<String>,
}

/// Build the Rocket instance serving the login portal.
pub async fn build_rocket(figment: Figment, config: &Config) -> Result<Rocket<Build>> {
    let auth = AuthClient::new(&config.provider)
        .context("Failed to initialize the identity provider client")?;
    let renderer = PageRenderer::new(&config.branding);

    // The session secret protects the private visitor cookie
    let figment = figment.merge(("secret_key", config.server.session_secret.clone()));

    Ok(rocket::custom(figment)
        .mount(
            "/",
            routes![
                index,
                login_page,
                login_submit,
                oauth_redirect,
                logout,
                assets,
                favicon
            ],
        )
        .manage(auth)
        .manage(SessionStore::new())
        .manage(renderer)
        .manage(Box::new(StaticChrome) as Box<dyn ChromeHost>)
        .manage(config.clone()))
}

#[get("/")]
fn index() -> Redirect {
    Redirect::to(uri!("/login"))
}

/// The login page: one controller pass per request.
///
/// Three mutually exclusive paths: an OAuth callback is exchanged for a
/// session, an existing session renders the account chrome, and everything
/// else renders the login widget.
#[get("/login?<code>&<state>&<login>&<redirect>")]
#[allow(clippy::too_many_arguments)]
async fn login_page(
    code: Option<String>,
    state: Option<String>,
    login: Option<String>,
    redirect: Option<String>,
    cookies: &CookieJar<'_>,
    auth: &State<AuthClient>,
    store: &State<SessionStore>,
    renderer: &State<PageRenderer>,
    chrome: &State<Box<dyn ChromeHost>>,
    config: &State<Config>,
) -> PortalPage {
    let visitor = session::visitor_id(cookies);
    let params = CallbackParams { code, state };

    match flow::resolve(&params, store.has_session(&visitor)) {
        Phase::CallbackPending { code, state } => {
            // The pending token is consumed here: callbacks are single-use
            let pending = store.take_pending_state(&visitor);
            if !flow::state_matches(&state, pending.as_deref()) {
                warn!("Rejecting OAuth callback with unknown state token");
                store.clear_session(&visitor);
                let html = unauthenticated_html(
                    Some("Login attempt could not be verified. Please try again."),
                    redirect.as_deref(),
                    &visitor,
                    store,
                    renderer,
                    chrome,
                    config,
                );
                return PortalPage::Html(RawHtml(html));
            }

            match auth.exchange_code_for_session(&code).await {
                Ok(new_session) => {
                    info!("Successfully logged in {}", new_session.user.email);
                    store.put_session(&visitor, new_session);
                    // Redirect clears code/state from the visible URL so a
                    // refresh cannot replay the exchange
                    PortalPage::Redirect(Redirect::to(post_login_target(redirect.as_deref())))
                }
                Err(err) => {
                    warn!("OAuth callback failed: {}", err);
                    store.clear_session(&visitor);
                    let html = unauthenticated_html(
                        Some(err.inline_message()),
                        redirect.as_deref(),
                        &visitor,
                        store,
                        renderer,
                        chrome,
                        config,
                    );
                    PortalPage::Html(RawHtml(html))
                }
            }
        }
        Phase::Authenticated => match store.session(&visitor) {
            Some(active) => {
                let html = renderer.account_page(&AccountView {
                    email: &active.user.email,
                    just_signed_in: login.as_deref() == Some("success"),
                    menu: chrome.menu(),
                    logout_control: chrome.logout_control(),
                });
                PortalPage::Html(RawHtml(html))
            }
            None => {
                let html = unauthenticated_html(
                    None,
                    redirect.as_deref(),
                    &visitor,
                    store,
                    renderer,
                    chrome,
                    config,
                );
                PortalPage::Html(RawHtml(html))
            }
        },
        Phase::Unauthenticated => {
            let html = unauthenticated_html(
                None,
                redirect.as_deref(),
                &visitor,
                store,
                renderer,
                chrome,
                config,
            );
            PortalPage::Html(RawHtml(html))
        }
    }
}

/// Manual email/password sign-in, used by the widget and the fallback form.
#[post("/login", data = "<form>")]
async fn login_submit(
    form: Form<LoginForm>,
    cookies: &CookieJar<'_>,
    auth: &State<AuthClient>,
    store: &State<SessionStore>,
    renderer: &State<PageRenderer>,
    chrome: &State<Box<dyn ChromeHost>>,
    config: &State<Config>,
) -> PortalPage {
    let visitor = session::visitor_id(cookies);

    match auth.sign_in_with_password(&form.email, &form.password).await {
        Ok(new_session) => {
            info!("Successfully logged in {}", new_session.user.email);
            store.put_session(&visitor, new_session);
            PortalPage::Redirect(Redirect::to(post_login_target(form.redirect.as_deref())))
        }
        Err(err) => {
            warn!("Password sign-in failed: {}", err);
            let html = unauthenticated_html(
                Some(err.inline_message()),
                form.redirect.as_deref(),
                &visitor,
                store,
                renderer,
                chrome,
                config,
            );
            match err {
                AuthError::InvalidCredentials => PortalPage::Unauthorized(RawHtml(html)),
                _ => PortalPage::Html(RawHtml(html)),
            }
        }
    }
}

/// Start an OAuth login: mint a state token and redirect to the provider.
#[get("/oauth/<provider>?<redirect>")]
fn oauth_redirect(
    provider: &str,
    redirect: Option<String>,
    cookies: &CookieJar<'_>,
    auth: &State<AuthClient>,
    store: &State<SessionStore>,
    config: &State<Config>,
) -> Result<Redirect, rocket::http::Status> {
    if !config.provider.providers.iter().any(|p| p == provider) {
        warn!("Unknown OAuth provider requested: {}", provider);
        return Err(rocket::http::Status::NotFound);
    }

    let visitor = session::visitor_id(cookies);
    let state = session::mint_token();
    store.set_pending_state(&visitor, state.clone());

    let redirect_to = callback_url(&config.provider.redirect_url, redirect.as_deref());
    let url = auth.authorize_url(provider, &redirect_to, &state);
    Ok(Redirect::to(url.to_string()))
}

/// End the session: provider logout is best-effort, the store always clears.
#[post("/logout")]
async fn logout(
    cookies: &CookieJar<'_>,
    auth: &State<AuthClient>,
    store: &State<SessionStore>,
) -> Redirect {
    let visitor = session::visitor_id(cookies);

    if let Some(active) = store.clear_session(&visitor) {
        info!("Logging out {}", active.user.email);
        if let Err(err) = auth.logout(&active.tokens.access_token).await {
            warn!("Provider logout failed: {}", err);
        }
    }

    Redirect::to(uri!("/login"))
}

/// Retrieves a static asset embedded from the resources/public directory
#[get("/assets/<path..>")]
fn assets(path: PathBuf) -> Option<StaticFileResponse> {
    let path = path.to_str().unwrap_or("");
    STATIC_DIR.get_file(path).map(|file| {
        let content_type = ContentType::from_extension(
            file.path()
                .extension()
                .unwrap_or_default()
                .to_str()
                .unwrap_or(""),
        )
        .unwrap_or(ContentType::Binary);
        StaticFileResponse(file.contents().to_vec(), content_type)
    })
}

#[get("/favicon.ico")]
fn favicon() -> Option<StaticFileResponse> {
    STATIC_DIR
        .get_file("logo.svg")
        .map(|file| StaticFileResponse(file.contents().to_vec(), ContentType::SVG))
}

/// Render the unauthenticated page, minting a fresh state token for the
/// new login attempt (any abandoned one is replaced).
fn unauthenticated_html(
    error: Option<&str>,
    redirect: Option<&str>,
    visitor: &str,
    store: &SessionStore,
    renderer: &PageRenderer,
    chrome: &State<Box<dyn ChromeHost>>,
    config: &Config,
) -> String {
    let state = session::mint_token();
    store.set_pending_state(visitor, state.clone());

    renderer.login_page(&LoginView {
        error,
        state: &state,
        redirect,
        providers: &config.provider.providers,
        menu: chrome.unauthenticated_menu(),
    })
}

/// Where to send the browser after a successful login.
///
/// Only local paths are honored; anything else lands on the page with the
/// `login=success` marker (code/state already cleared).
fn post_login_target(redirect: Option<&str>) -> String {
    match redirect {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/login?login=success".to_string(),
    }
}

/// Append the post-login redirect to the provider callback URL.
fn callback_url(base: &str, redirect: Option<&str>) -> String {
    match redirect {
        Some(path) => {
            let query = serde_urlencoded::to_string([("redirect", path)]).unwrap_or_default();
            format!("{}?{}", base, query)
        }
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_login_target_only_honors_local_paths() {
        assert_eq!(post_login_target(None), "/login?login=success");
        assert_eq!(post_login_target(Some("/app")), "/app");
        assert_eq!(
            post_login_target(Some("https://evil.example")),
            "/login?login=success"
        );
        assert_eq!(
            post_login_target(Some("//evil.example")),
            "/login?login=success"
        );
    }

    #[test]
    fn callback_url_carries_redirect() {
        assert_eq!(
            callback_url("http://localhost:8080/login", None),
            "http://localhost:8080/login"
        );
        assert_eq!(
            callback_url("http://localhost:8080/login", Some("/app")),
            "http://localhost:8080/login?redirect=%2Fapp"
        );
    }
}
