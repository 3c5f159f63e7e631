// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rendering-host seam.
//!
//! The sidebar navigation and the logout control belong to the hosting
//! application; the portal only calls them. [`StaticChrome`] is the default
//! implementation used by the standalone server and by tests.

/// Navigation chrome supplied by the hosting application.
pub trait ChromeHost: Send + Sync {
    /// Sidebar menu for authenticated visitors.
    fn menu(&self) -> String;

    /// Sidebar menu for unauthenticated visitors.
    fn unauthenticated_menu(&self) -> String;

    /// Logout control widget, posting to the portal's `/logout` route.
    fn logout_control(&self) -> String;
}

/// Static HTML chrome for standalone deployments.
pub struct StaticChrome;

impl ChromeHost for StaticChrome {
    fn menu(&self) -> String {
        r#"<nav class="sidebar-menu">
  <a href="/">Home</a>
  <a href="/account">Account</a>
</nav>"#
            .to_string()
    }

    fn unauthenticated_menu(&self) -> String {
        r#"<nav class="sidebar-menu">
  <a href="/login">Log in</a>
</nav>"#
            .to_string()
    }

    fn logout_control(&self) -> String {
        r#"<form class="logout-control" method="post" action="/logout">
  <button type="submit">Sign out</button>
</form>"#
            .to_string()
    }
}
