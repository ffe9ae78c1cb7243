// SPDX-License-Identifier: GPL-3.0-only

//! Finish-action execution after a completed refresh.

use anyhow::Result;
use async_trait::async_trait;

/// External action-execution collaborator. Invoked best-effort by the
/// refresh worker; failures are logged and swallowed there.
#[async_trait]
pub trait ActionRunner: Send + Sync {
    async fn run(&self, action: &str) -> Result<()>;
}

/// Runs finish actions as shell command lines via `sh -c`.
pub struct ShellActionRunner;

#[async_trait]
impl ActionRunner for ShellActionRunner {
    async fn run(&self, action: &str) -> Result<()> {
        let status = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(action)
            .status()
            .await?;
        if !status.success() {
            anyhow::bail!("finish action exited with {status}");
        }
        Ok(())
    }
}
