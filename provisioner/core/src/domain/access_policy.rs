// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Access Policy
//!
//! Maps every roster user to an [`IsolationDescriptor`]: a private storage
//! subtree, read-only or read-write access to the shared reference subtree,
//! and the identity mechanism the user signs in through.
//!
//! Resolution is total over the roster, deterministic and performs no I/O.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements per-user isolation and admin/non-admin permission split

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::roster::Roster;
use crate::domain::user::{IdentityProviderClass, User};
use crate::domain::volume::{AccessMode, PosixOwnership, DEFAULT_REFERENCE_PATH};

/// Per-user parameters for provisioning storage and compute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolationDescriptor {
    pub user: User,

    /// `"/" + sanitized_handle`, the user's exclusive storage subtree
    pub private_path: PathBuf,

    /// Ownership applied to the private subtree
    pub private_ownership: PosixOwnership,

    /// Shared subtree, identical for every user
    pub reference_path: PathBuf,

    pub reference_access: AccessMode,
    pub identity_provider_class: IdentityProviderClass,
}

/// Policy settings that are fixed for a whole deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    reference_path: PathBuf,
}

impl AccessPolicy {
    pub fn new(reference_path: impl Into<PathBuf>) -> Self {
        Self {
            reference_path: reference_path.into(),
        }
    }

    pub fn reference_path(&self) -> &PathBuf {
        &self.reference_path
    }

    pub fn describe(&self, user: &User) -> IsolationDescriptor {
        let reference_access = if user.is_admin {
            AccessMode::ReadWrite
        } else {
            AccessMode::ReadOnly
        };

        IsolationDescriptor {
            private_path: PathBuf::from(format!("/{}", user.sanitized_handle)),
            private_ownership: PosixOwnership::default(),
            reference_path: self.reference_path.clone(),
            reference_access,
            identity_provider_class: user.identity_provider_class(),
            user: user.clone(),
        }
    }

    /// Derive one descriptor per roster user, keyed by raw handle.
    pub fn resolve(&self, roster: &Roster) -> BTreeMap<String, IsolationDescriptor> {
        roster
            .users()
            .map(|user| (user.raw_handle.clone(), self.describe(user)))
            .collect()
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_PATH)
    }
}

/// [`AccessPolicy::resolve`] with the default reference path.
pub fn resolve(roster: &Roster) -> BTreeMap<String, IsolationDescriptor> {
    AccessPolicy::default().resolve(roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::DEFAULT_INTERNAL_DOMAIN_SUFFIX;

    fn roster() -> Roster {
        Roster::from_handles(
            ["alice@tudelft.nl", "carol@tudelft.nl"],
            ["bob@gmail.com", "carol@tudelft.nl", "eve.smith@x.org"],
            DEFAULT_INTERNAL_DOMAIN_SUFFIX,
        )
    }

    #[test]
    fn test_resolve_is_total() {
        let roster = roster();
        let descriptors = resolve(&roster);
        assert_eq!(descriptors.len(), roster.len());
        for user in roster.users() {
            assert_eq!(descriptors[&user.raw_handle].user, *user);
        }
    }

    #[test]
    fn test_admin_iff_read_write() {
        for descriptor in resolve(&roster()).values() {
            assert_eq!(descriptor.user.is_admin, descriptor.reference_access.is_writable());
        }
    }

    #[test]
    fn test_external_iff_federated() {
        for descriptor in resolve(&roster()).values() {
            assert_eq!(
                descriptor.user.is_external,
                descriptor.identity_provider_class == IdentityProviderClass::Federated
            );
        }
    }

    #[test]
    fn test_private_path_uses_sanitized_handle() {
        let descriptors = resolve(&roster());
        assert_eq!(descriptors["eve.smith@x.org"].private_path, PathBuf::from("/eve_smith_x_org"));
        assert_eq!(descriptors["alice@tudelft.nl"].private_path, PathBuf::from("/alice_tudelft_nl"));
    }

    #[test]
    fn test_reference_path_is_shared() {
        let policy = AccessPolicy::new("/shared/reference");
        let descriptors = policy.resolve(&roster());
        assert!(descriptors
            .values()
            .all(|d| d.reference_path == PathBuf::from("/shared/reference")));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let roster = roster();
        assert_eq!(resolve(&roster), resolve(&roster));
    }
}
