// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for the drive inventory engine
//!
//! This crate defines the single source of truth for the types shared
//! across the stack:
//!
//! - **drivelist-core**: operates on these types in its probe, filter,
//!   and measure APIs
//! - **drivelist-app**: deserializes measure configuration into
//!   [`MeasureConfig`] and feeds it to the core
//!
//! No I/O happens here; everything is plain data.

pub mod config;
pub mod volume;

pub use config::{MeasureConfig, NumberKind};
pub use volume::{Inventory, ProbedVolume, VolumeClass, VolumeClassFilter, VolumeRecord};
