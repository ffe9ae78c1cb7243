// SPDX-License-Identifier: GPL-3.0-only

//! Concurrent refresh-and-binding engine for drive inventories.
//!
//! One background-refreshed snapshot of filtered volumes per owner
//! measure, shared with any number of dependent measures that resolve
//! the owner by name through a registry, plus a wrap-around cursor for
//! manual navigation.
//!
//! The foreground-facing API ([`Measure`]) never blocks: queries read
//! whatever inventory is currently published, and refreshes are
//! coalesced single-flight tasks spawned onto a tokio runtime.

pub mod actions;
pub mod cursor;
pub mod enumerate;
pub mod error;
pub mod measure;
pub mod probe;
pub mod refresh;
pub mod registry;
pub mod udisks;

pub use actions::{ActionRunner, ShellActionRunner};
pub use cursor::{Direction, IndexCursor};
pub use enumerate::filter_volumes;
pub use error::DriveListError;
pub use measure::{Measure, MeasureContext, OwnerShared};
pub use probe::VolumeProbe;
pub use refresh::request_refresh;
pub use registry::{OwnerRegistry, ScopeId};
pub use udisks::UDisksProbe;
