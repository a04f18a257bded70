// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! User Identity
//!
//! A roster entry and the two rules derived from its raw handle: the
//! filesystem-safe form used for paths and resource names, and whether the
//! user lives outside the organization's email domain.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Handle sanitization and internal/external classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Email domain of users that already exist in the organization's identity system.
pub const DEFAULT_INTERNAL_DOMAIN_SUFFIX: &str = "tudelft.nl";

/// Replace every `@` and `.` in a handle with `_`.
///
/// The result is used anywhere an identifier must be a single path segment or
/// a resource name. Distinct realistic email handles are assumed not to collide.
///
/// ```
/// use pluto_hub_core::domain::user::sanitize;
///
/// assert_eq!(sanitize("eve.smith@x.org"), "eve_smith_x_org");
/// ```
pub fn sanitize(raw_handle: &str) -> String {
    raw_handle.replace(['@', '.'], "_")
}

/// Returns true iff `raw_handle` does not end with `internal_domain_suffix`.
///
/// Case-sensitive exact suffix match.
pub fn classify_external(raw_handle: &str, internal_domain_suffix: &str) -> bool {
    !raw_handle.ends_with(internal_domain_suffix)
}

/// Which identity mechanism a user signs in through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProviderClass {
    /// External user; an account must be created in the hub's identity pool.
    Federated,
    /// Internal user; already known to the organization's identity provider.
    Local,
}

impl IdentityProviderClass {
    pub fn requires_account(&self) -> bool {
        matches!(self, Self::Federated)
    }
}

impl fmt::Display for IdentityProviderClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Federated => write!(f, "federated"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// A user of the hub as it appears in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub raw_handle: String,
    pub sanitized_handle: String,
    pub is_admin: bool,
    pub is_external: bool,
}

impl User {
    pub fn new(raw_handle: impl Into<String>, is_admin: bool, internal_domain_suffix: &str) -> Self {
        let raw_handle = raw_handle.into();
        Self {
            sanitized_handle: sanitize(&raw_handle),
            is_external: classify_external(&raw_handle, internal_domain_suffix),
            raw_handle,
            is_admin,
        }
    }

    pub fn identity_provider_class(&self) -> IdentityProviderClass {
        if self.is_external {
            IdentityProviderClass::Federated
        } else {
            IdentityProviderClass::Local
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw_handle)
    }
}
