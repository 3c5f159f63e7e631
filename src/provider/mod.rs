// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).
//!
//! Identity provider module
//!
//! This module wraps the hosted identity provider's HTTP API: password
//! sign-in, authorization-code exchange, OAuth redirect URL issuance, and
//! logout. All network calls go through [`client::AuthClient`] and every
//! failure is mapped into the [`error::AuthError`] taxonomy.

pub mod client;
pub mod error;

pub use client::AuthClient;
pub use error::AuthError;
