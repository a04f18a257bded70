// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Value Objects
// ============================================================================

/// Owner uid of every access point root directory (the notebook image's `jovyan`).
pub const NOTEBOOK_UID: u32 = 1000;
/// Owner gid of every access point root directory (`users`).
pub const NOTEBOOK_GID: u32 = 100;
/// Permissions applied when an access point root directory is created.
pub const ACCESS_POINT_PERMISSIONS: &str = "755";

/// Where the user's private subtree is mounted inside the notebook container.
pub const WORK_DIR: &str = "/home/jovyan/work";
/// Where the shared reference subtree is mounted inside the notebook container.
pub const REFERENCE_DIR: &str = "/home/jovyan/reference";
/// Where the hub container mounts the file system root.
pub const HUB_HOME_DIR: &str = "/home";
/// Default location of the shared reference subtree on the file system.
pub const DEFAULT_REFERENCE_PATH: &str = "/reference";

/// Volume access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    /// Read-only access
    ReadOnly,
    /// Read-write access
    ReadWrite,
}

impl AccessMode {
    pub fn is_writable(&self) -> bool {
        matches!(self, Self::ReadWrite)
    }

    pub fn is_read_only(&self) -> bool {
        !self.is_writable()
    }
}

impl Default for AccessMode {
    fn default() -> Self {
        Self::ReadOnly
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// POSIX identity and creation permissions of an access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosixOwnership {
    pub uid: u32,
    pub gid: u32,
    /// Octal permission string, e.g. "755"
    pub permissions: String,
}

impl Default for PosixOwnership {
    fn default() -> Self {
        Self {
            uid: NOTEBOOK_UID,
            gid: NOTEBOOK_GID,
            permissions: ACCESS_POINT_PERMISSIONS.to_string(),
        }
    }
}

/// Shared file system volume attached to a task definition.
///
/// Volumes entered through an access point always use IAM authorization and
/// transit encryption. A volume without one mounts the file system root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedVolume {
    /// Volume name, referenced by mount points
    pub name: String,

    /// Logical id of the access point request that backs this volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_point: Option<String>,

    pub iam_authorization: bool,
    pub transit_encryption: bool,
}

impl SharedVolume {
    pub fn new(name: impl Into<String>, access_point: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access_point: Some(access_point.into()),
            iam_authorization: true,
            transit_encryption: true,
        }
    }

    /// Volume carrying one user's private subtree.
    pub fn private(sanitized_handle: &str, access_point: impl Into<String>) -> Self {
        Self::new(format!("efs-{}-volume", sanitized_handle), access_point)
    }

    /// Volume carrying the shared reference subtree.
    pub fn reference(access_point: impl Into<String>) -> Self {
        Self::new("efs-reference-volume", access_point)
    }

    /// Whole file system, mounted by the hub itself.
    pub fn hub() -> Self {
        Self {
            name: "efs-hub-volume".to_string(),
            access_point: None,
            iam_authorization: false,
            transit_encryption: false,
        }
    }
}

/// Volume mount specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    /// Name of the [`SharedVolume`] to mount
    pub source_volume: String,

    /// Mount point path inside the container
    pub container_path: PathBuf,

    /// Access mode (read-only or read-write)
    pub access_mode: AccessMode,
}

impl VolumeMount {
    pub fn new(source_volume: impl Into<String>, container_path: impl Into<PathBuf>, access_mode: AccessMode) -> Self {
        Self {
            source_volume: source_volume.into(),
            container_path: container_path.into(),
            access_mode,
        }
    }

    pub fn read_only(&self) -> bool {
        self.access_mode.is_read_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_mode_serde_is_kebab_case() {
        assert_eq!(serde_json::to_string(&AccessMode::ReadWrite).unwrap(), "\"read-write\"");
        assert_eq!(serde_json::to_string(&AccessMode::ReadOnly).unwrap(), "\"read-only\"");
        assert_eq!(AccessMode::ReadWrite.to_string(), "read-write");
    }

    #[test]
    fn test_default_ownership() {
        let owner = PosixOwnership::default();
        assert_eq!(owner.uid, 1000);
        assert_eq!(owner.gid, 100);
        assert_eq!(owner.permissions, "755");
    }

    #[test]
    fn test_volume_names() {
        let private = SharedVolume::private("alice_tudelft_nl", "alice_tudelft_nlAccessPt");
        assert_eq!(private.name, "efs-alice_tudelft_nl-volume");
        assert!(private.iam_authorization && private.transit_encryption);

        let reference = SharedVolume::reference("ReferenceAccessPt");
        assert_eq!(reference.name, "efs-reference-volume");
        assert_eq!(reference.access_point.as_deref(), Some("ReferenceAccessPt"));

        let hub = SharedVolume::hub();
        assert_eq!(hub.name, "efs-hub-volume");
        assert!(hub.access_point.is_none());
    }

    #[test]
    fn test_mount_read_only_follows_access_mode() {
        let mount = VolumeMount::new("efs-reference-volume", REFERENCE_DIR, AccessMode::ReadOnly);
        assert!(mount.read_only());
        let mount = VolumeMount::new("efs-x-volume", WORK_DIR, AccessMode::ReadWrite);
        assert!(!mount.read_only());
    }
}
