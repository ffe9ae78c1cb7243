// SPDX-License-Identifier: GPL-3.0-only

//! Volume classes, class filters, and the published inventory snapshot.

use serde::{Deserialize, Serialize};

/// Device class reported by the volume probe.
///
/// This is a closed set; probes map whatever the OS reports onto it and
/// fall back to [`VolumeClass::Unknown`] for anything unclassifiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeClass {
    /// Fixed disk (internal HDD/SSD)
    Fixed,
    /// Removable media (USB sticks, SD cards, ...)
    Removable,
    /// Network share (NFS, CIFS/SMB)
    Network,
    /// Optical drive (CD/DVD/BD)
    Optical,
    /// RAM-backed device
    Ram,
    /// Device with no root directory / no usable filesystem
    NoRoot,
    /// Anything the probe could not classify
    Unknown,
}

impl VolumeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeClass::Fixed => "fixed",
            VolumeClass::Removable => "removable",
            VolumeClass::Network => "network",
            VolumeClass::Optical => "optical",
            VolumeClass::Ram => "ram",
            VolumeClass::NoRoot => "no-root",
            VolumeClass::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for VolumeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which volume classes an owner includes in its published inventory.
///
/// Mutated only by a full configuration reload; the refresh worker
/// operates on a copy taken at refresh start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeClassFilter {
    pub fixed: bool,
    pub removable: bool,
    pub network: bool,
    pub optical: bool,
    pub ram: bool,
    pub no_root: bool,
    pub unknown: bool,
}

impl Default for VolumeClassFilter {
    fn default() -> Self {
        Self {
            fixed: true,
            removable: true,
            network: true,
            optical: false,
            ram: false,
            no_root: false,
            unknown: false,
        }
    }
}

impl VolumeClassFilter {
    pub fn allows(&self, class: VolumeClass) -> bool {
        match class {
            VolumeClass::Fixed => self.fixed,
            VolumeClass::Removable => self.removable,
            VolumeClass::Network => self.network,
            VolumeClass::Optical => self.optical,
            VolumeClass::Ram => self.ram,
            VolumeClass::NoRoot => self.no_root,
            VolumeClass::Unknown => self.unknown,
        }
    }
}

/// A single volume as reported by the OS probe, before filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbedVolume {
    /// Short device identifier (e.g. "sda1", "sr0")
    pub ident: String,

    /// Device class the probe mapped this volume onto
    pub class: VolumeClass,

    /// Whether the volume is currently usable (mounted / media present)
    pub ready: bool,
}

/// A volume that passed the class filter; immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRecord {
    /// Short device identifier carried over from the probe
    pub ident: String,
}

impl VolumeRecord {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.ident
    }
}

impl std::fmt::Display for VolumeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.ident)
    }
}

/// The currently published, ordered sequence of filtered volumes.
///
/// Replaced wholesale on every refresh; `generation` increments on each
/// replacement so readers can tell snapshots apart. Never mutated in
/// place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    records: Vec<VolumeRecord>,
    generation: u64,
}

impl Inventory {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn records(&self) -> &[VolumeRecord] {
        &self.records
    }

    /// Record at `position`, or `None` when the position is out of
    /// bounds (including the -1 empty sentinel).
    pub fn get(&self, position: i32) -> Option<&VolumeRecord> {
        if position < 0 {
            return None;
        }
        self.records.get(position as usize)
    }

    /// Swap in a freshly enumerated sequence, bumping the generation.
    pub fn replace(&mut self, records: Vec<VolumeRecord>) {
        self.records = records;
        self.generation += 1;
    }
}
