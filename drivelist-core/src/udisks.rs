// SPDX-License-Identifier: GPL-3.0-only

//! System volume probe backed by UDisks2 over D-Bus.
//!
//! Enumerates block devices through the UDisks2 manager and maps each
//! mountable one onto a [`ProbedVolume`]: class from the backing drive
//! properties, readiness from the current mount state. Network shares
//! do not appear as block devices on this backend, so the network
//! class only matches the rare network-backed filesystem UDisks2 does
//! report.

use std::collections::HashMap;

use async_trait::async_trait;
use drivelist_types::{ProbedVolume, VolumeClass};
use tracing::debug;
use udisks2::{block::BlockProxy, drive::DriveProxy, filesystem::FilesystemProxy};
use zbus::{
    Connection,
    zvariant::{self, Value},
};
use zbus_macros::proxy;

use crate::error::DriveListError;
use crate::probe::VolumeProbe;

#[proxy(
    default_service = "org.freedesktop.UDisks2",
    default_path = "/org/freedesktop/UDisks2/Manager",
    interface = "org.freedesktop.UDisks2.Manager"
)]
trait UDisks2Manager {
    fn get_block_devices(
        &self,
        options: HashMap<String, Value<'_>>,
    ) -> zbus::Result<Vec<zvariant::OwnedObjectPath>>;
}

/// UDisks2 reports device paths and mount points as NUL-terminated
/// byte strings.
fn decode_c_string_bytes(bytes: &[u8]) -> String {
    let raw = bytes.split(|b| *b == 0).next().unwrap_or(bytes);
    String::from_utf8_lossy(raw).to_string()
}

fn is_network_filesystem(id_type: &str) -> bool {
    matches!(id_type, "nfs" | "nfs4" | "cifs" | "smb" | "smbfs")
}

pub struct UDisksProbe {
    connection: Connection,
}

impl UDisksProbe {
    pub async fn new() -> Result<Self, DriveListError> {
        let connection = Connection::system().await?;
        Ok(Self { connection })
    }

    async fn probe_block(
        &self,
        path: &zvariant::OwnedObjectPath,
    ) -> Result<Option<ProbedVolume>, DriveListError> {
        let block = BlockProxy::builder(&self.connection)
            .path(path)?
            .build()
            .await?;

        let preferred = decode_c_string_bytes(&block.preferred_device().await?);
        let device = if preferred.is_empty() {
            decode_c_string_bytes(&block.device().await?)
        } else {
            preferred
        };
        if device.is_empty() {
            return Ok(None);
        }

        let (has_filesystem, mounted) = match FilesystemProxy::builder(&self.connection)
            .path(path)?
            .build()
            .await
        {
            Ok(fs) => match fs.mount_points().await {
                Ok(mps) => (true, !mps.is_empty()),
                Err(_) => (false, false),
            },
            Err(_) => (false, false),
        };

        let class = self.classify(&block, &device).await?;

        // Only mountable volumes make the list, with the usual optical
        // exemption so an empty tray is still visible.
        if !has_filesystem && class != VolumeClass::Optical {
            return Ok(None);
        }

        let ident = device
            .strip_prefix("/dev/")
            .unwrap_or(device.as_str())
            .to_string();

        Ok(Some(ProbedVolume {
            ident,
            class,
            ready: mounted,
        }))
    }

    async fn classify(
        &self,
        block: &BlockProxy<'_>,
        device: &str,
    ) -> Result<VolumeClass, DriveListError> {
        if device.starts_with("/dev/ram") || device.starts_with("/dev/zram") {
            return Ok(VolumeClass::Ram);
        }

        if let Ok(id_type) = block.id_type().await
            && is_network_filesystem(&id_type)
        {
            return Ok(VolumeClass::Network);
        }

        // "/" is UDisks2's null object path for blocks with no drive
        // (loop devices and friends).
        let drive_path = block.drive().await?;
        if drive_path.as_str() == "/" {
            return Ok(VolumeClass::Unknown);
        }

        let drive = DriveProxy::builder(&self.connection)
            .path(&drive_path)?
            .build()
            .await?;

        if drive.optical().await? {
            return Ok(VolumeClass::Optical);
        }
        if drive.removable().await? || drive.ejectable().await? {
            return Ok(VolumeClass::Removable);
        }
        Ok(VolumeClass::Fixed)
    }
}

#[async_trait]
impl VolumeProbe for UDisksProbe {
    async fn probe(&self) -> Result<Vec<ProbedVolume>, DriveListError> {
        let manager = UDisks2ManagerProxy::new(&self.connection).await?;
        let block_paths = manager.get_block_devices(HashMap::new()).await?;

        let mut volumes = Vec::new();
        for path in block_paths {
            match self.probe_block(&path).await {
                Ok(Some(volume)) => volumes.push(volume),
                Ok(None) => {}
                Err(e) => {
                    debug!(path = %path, error = %e, "skipping block device");
                }
            }
        }
        Ok(volumes)
    }
}
