// SPDX-License-Identifier: GPL-3.0-only

//! Probe trait over the OS volume query.

use async_trait::async_trait;
use drivelist_types::ProbedVolume;

use crate::error::DriveListError;

/// Source of the live OS volume set.
///
/// A probe call may block for tens to hundreds of milliseconds on
/// non-ready network or optical media, which is why the refresh
/// coordinator only ever runs it on a background task, never on the
/// foreground query path.
#[async_trait]
pub trait VolumeProbe: Send + Sync {
    async fn probe(&self) -> Result<Vec<ProbedVolume>, DriveListError>;
}
