// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Session presenter.
//!
//! Renders the authenticated chrome (email display, logout control) and the
//! unauthenticated chrome (login widget, provider buttons) from handlebars
//! templates. Pure presentation: no business logic beyond reading the view
//! structs handed in by the routes.
//!
//! The primary login widget can be overridden by a template on disk
//! (`branding.widget_path`). Any structural fault in that template — the
//! file is missing, it does not parse, it does not render — degrades to the
//! compiled-in manual fallback form instead of failing the page.

use handlebars::Handlebars;
use log::warn;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

use crate::config::BrandingConfig;
use crate::provider::AuthError;

/// View data for the unauthenticated page.
pub struct LoginView<'a> {
    /// Inline error message from the previous step, if any.
    pub error: Option<&'a str>,
    /// Anti-forgery state token minted for this login attempt.
    pub state: &'a str,
    /// Post-login redirect path carried through the flow.
    pub redirect: Option<&'a str>,
    /// OAuth providers offered as buttons.
    pub providers: &'a [String],
    /// Sidebar menu supplied by the rendering host.
    pub menu: String,
}

/// View data for the authenticated page.
pub struct AccountView<'a> {
    pub email: &'a str,
    /// True when the URL carries the `login=success` marker.
    pub just_signed_in: bool,
    pub menu: String,
    pub logout_control: String,
}

/// Handlebars-backed page renderer.
pub struct PageRenderer {
    handlebars: Handlebars<'static>,
    title: String,
    logo_path: PathBuf,
    widget_path: Option<PathBuf>,
}

impl PageRenderer {
    pub fn new(branding: &BrandingConfig) -> Self {
        let mut handlebars = Handlebars::new();

        // Compiled-in templates; registration of these cannot fail at runtime
        handlebars
            .register_template_string("login", include_str!("../../resources/pages/login.hbs"))
            .expect("Failed to register login template");
        handlebars
            .register_template_string("widget", include_str!("../../resources/pages/widget.hbs"))
            .expect("Failed to register widget template");
        handlebars
            .register_template_string(
                "fallback",
                include_str!("../../resources/pages/fallback.hbs"),
            )
            .expect("Failed to register fallback template");
        handlebars
            .register_template_string(
                "account",
                include_str!("../../resources/pages/account.hbs"),
            )
            .expect("Failed to register account template");

        Self {
            handlebars,
            title: branding.title.clone(),
            logo_path: PathBuf::from(&branding.logo_path),
            widget_path: branding.widget_path.as_ref().map(PathBuf::from),
        }
    }

    /// Render the unauthenticated page.
    ///
    /// Tries the primary login widget first; a [`AuthError::WidgetFault`] or
    /// [`AuthError::ConfigurationMissing`] from it degrades to the manual
    /// fallback form. Either way the page renders.
    pub fn login_page(&self, view: &LoginView) -> String {
        let widget = match self.widget_html(view) {
            Ok(html) => html,
            Err(err) => {
                warn!("Falling back to the manual login form: {}", err);
                self.fallback_html(view)
            }
        };

        let data = json!({
            "title": self.title,
            "logo": self.logo_html(),
            "error": view.error,
            "menu": view.menu,
            "widget": widget,
        });

        self.handlebars
            .render("login", &data)
            .expect("Failed to render login template")
    }

    /// Render the authenticated page.
    pub fn account_page(&self, view: &AccountView) -> String {
        let data = json!({
            "title": self.title,
            "logo": self.logo_html(),
            "email": view.email,
            "just_signed_in": view.just_signed_in,
            "menu": view.menu,
            "logout_control": view.logout_control,
        });

        self.handlebars
            .render("account", &data)
            .expect("Failed to render account template")
    }

    /// Template data shared by the widget and the fallback form.
    fn widget_data(&self, view: &LoginView) -> serde_json::Value {
        json!({
            "state": view.state,
            "redirect": view.redirect,
            "providers": view.providers,
        })
    }

    /// Render the primary login widget.
    fn widget_html(&self, view: &LoginView) -> Result<String, AuthError> {
        match &self.widget_path {
            Some(path) => {
                let source = fs::read_to_string(path).map_err(|e| {
                    AuthError::ConfigurationMissing(format!(
                        "widget template {:?}: {}",
                        path, e
                    ))
                })?;

                // The external template is registered per render so a
                // structural fault surfaces here and nowhere else
                let mut external = Handlebars::new();
                external
                    .register_template_string("widget", source)
                    .map_err(|e| AuthError::WidgetFault(e.to_string()))?;
                external
                    .render("widget", &self.widget_data(view))
                    .map_err(|e| AuthError::WidgetFault(e.to_string()))
            }
            None => self
                .handlebars
                .render("widget", &self.widget_data(view))
                .map_err(|e| AuthError::WidgetFault(e.to_string())),
        }
    }

    /// Render the manual fallback form (compiled in, cannot be absent).
    fn fallback_html(&self, view: &LoginView) -> String {
        self.handlebars
            .render("fallback", &self.widget_data(view))
            .expect("Failed to render fallback template")
    }

    /// Inline the logo asset, or degrade to a text placeholder.
    fn logo_html(&self) -> String {
        match fs::read_to_string(&self.logo_path) {
            Ok(svg) => format!(r#"<div class="logo">{}</div>"#, svg),
            Err(e) => {
                warn!(
                    "Logo asset {:?} unavailable ({}), using text placeholder",
                    self.logo_path, e
                );
                format!(r#"<div class="logo-placeholder">{}</div>"#, self.title)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view<'a>(providers: &'a [String]) -> LoginView<'a> {
        LoginView {
            error: None,
            state: "tok",
            redirect: None,
            providers,
            menu: String::new(),
        }
    }

    #[test]
    fn login_page_renders_primary_widget() {
        let renderer = PageRenderer::new(&BrandingConfig::default());
        let providers = vec!["github".to_string(), "google".to_string()];
        let html = renderer.login_page(&view(&providers));

        assert!(html.contains("auth-widget"));
        assert!(html.contains("/oauth/github"));
        assert!(html.contains(r#"data-state="tok""#));
        assert!(!html.contains("auth-fallback"));
    }

    #[test]
    fn missing_widget_file_degrades_to_fallback() {
        let branding = BrandingConfig {
            widget_path: Some("does/not/exist.hbs".to_string()),
            ..BrandingConfig::default()
        };
        let renderer = PageRenderer::new(&branding);
        let providers = vec!["github".to_string()];
        let html = renderer.login_page(&view(&providers));

        assert!(html.contains("auth-fallback"));
        assert!(html.contains("/oauth/github"));
    }

    #[test]
    fn missing_logo_renders_text_placeholder() {
        let branding = BrandingConfig {
            logo_path: "does/not/exist.svg".to_string(),
            ..BrandingConfig::default()
        };
        let renderer = PageRenderer::new(&branding);
        let providers = vec!["github".to_string()];
        let html = renderer.login_page(&view(&providers));

        assert!(html.contains("logo-placeholder"));
        assert!(html.contains("SaaS Starter Login"));
    }
}
