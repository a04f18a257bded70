// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Roster
//!
//! The deduplicated set of users eligible to use the hub, read from the
//! line-oriented `admins` and `allowed_users` files.
//!
//! A missing file contributes nothing. Any other read failure (permissions,
//! invalid UTF-8) is fatal so provisioning never proceeds with a partial roster.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements roster loading and set union with admin precedence

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::user::User;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Failed to read roster source {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which list a roster source contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterKind {
    Admins,
    AllowedUsers,
}

/// A line-oriented text file holding one user handle per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSource {
    pub path: PathBuf,
    pub kind: RosterKind,
}

impl RosterSource {
    pub fn admins(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), kind: RosterKind::Admins }
    }

    pub fn allowed_users(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), kind: RosterKind::AllowedUsers }
    }
}

/// Extract handles from roster file contents.
///
/// Blank lines are skipped and only the first whitespace-delimited token of a
/// line is kept.
pub fn parse_handles(contents: &str) -> impl Iterator<Item = &str> {
    contents.lines().filter_map(|line| line.split_whitespace().next())
}

/// Immutable set of users keyed by raw handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    users: BTreeMap<String, User>,
}

impl Roster {
    /// Build a roster from in-memory handle lists.
    pub fn from_handles<'a, A, U>(admins: A, allowed_users: U, internal_domain_suffix: &str) -> Self
    where
        A: IntoIterator<Item = &'a str>,
        U: IntoIterator<Item = &'a str>,
    {
        let mut builder = RosterBuilder::default();
        builder.extend(RosterKind::Admins, admins);
        builder.extend(RosterKind::AllowedUsers, allowed_users);
        builder.build(internal_domain_suffix)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn get(&self, raw_handle: &str) -> Option<&User> {
        self.users.get(raw_handle)
    }

    pub fn contains(&self, raw_handle: &str) -> bool {
        self.users.contains_key(raw_handle)
    }

    /// Users in ascending raw-handle order.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn admins(&self) -> impl Iterator<Item = &User> {
        self.users.values().filter(|u| u.is_admin)
    }

    pub fn external_users(&self) -> impl Iterator<Item = &User> {
        self.users.values().filter(|u| u.is_external)
    }
}

#[derive(Default)]
struct RosterBuilder {
    // handle -> seen in an admins source
    members: BTreeMap<String, bool>,
}

impl RosterBuilder {
    fn extend<'a>(&mut self, kind: RosterKind, handles: impl IntoIterator<Item = &'a str>) {
        for handle in handles {
            let is_admin = self.members.entry(handle.to_string()).or_insert(false);
            *is_admin |= kind == RosterKind::Admins;
        }
    }

    fn build(self, internal_domain_suffix: &str) -> Roster {
        let users = self
            .members
            .into_iter()
            .map(|(handle, is_admin)| {
                let user = User::new(handle.clone(), is_admin, internal_domain_suffix);
                (handle, user)
            })
            .collect();
        Roster { users }
    }
}

fn read_source(path: &Path) -> Result<Option<String>, RosterError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RosterError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read every source in order and union their handles into a [`Roster`].
pub fn load_roster(sources: &[RosterSource], internal_domain_suffix: &str) -> Result<Roster, RosterError> {
    let mut builder = RosterBuilder::default();

    for source in sources {
        let Some(contents) = read_source(&source.path)? else {
            debug!(path = %source.path.display(), kind = ?source.kind, "Roster source not found, skipping");
            continue;
        };
        builder.extend(source.kind, parse_handles(&contents));
    }

    let roster = builder.build(internal_domain_suffix);
    info!(
        users = roster.len(),
        admins = roster.admins().count(),
        external = roster.external_users().count(),
        "Loaded roster"
    );
    Ok(roster)
}
