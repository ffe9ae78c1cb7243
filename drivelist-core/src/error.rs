// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the drive inventory engine

use thiserror::Error;

use crate::registry::ScopeId;

#[derive(Error, Debug)]
pub enum DriveListError {
    #[error("invalid command verb {verb:?} in {measure}")]
    UnknownVerb { measure: String, verb: String },

    #[error("parent measure {name:?} not found in scope {scope}")]
    ParentNotFound { scope: ScopeId, name: String },

    #[error("volume probe failed: {0}")]
    ProbeFailed(String),

    #[error("Zbus Error")]
    ZbusError(#[from] zbus::Error),

    #[error("UDisks2 Error")]
    UdisksError(#[from] udisks2::Error),
}
