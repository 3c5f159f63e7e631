// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the saas-login-portal project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! SaaS login portal library
//!
//! This library implements a single login page that delegates authentication
//! to a hosted identity provider and keeps the resulting session in a
//! process-wide per-visitor state store.

pub mod config;
pub mod portal;
pub mod provider;
