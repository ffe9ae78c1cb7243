// SPDX-License-Identifier: GPL-3.0-only

//! Single-flight background refresh of an owner's inventory.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::actions::ActionRunner;
use crate::enumerate::filter_volumes;
use crate::measure::OwnerShared;
use crate::probe::VolumeProbe;

/// Clears the in-flight flag on every exit path, including a panicking
/// probe.
struct InFlightGuard(Arc<OwnerShared>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.end_refresh();
    }
}

/// Trigger a refresh of `owner`'s inventory on the given runtime.
///
/// Returns immediately in all cases. If a refresh is already in
/// flight the request is dropped (coalesced, not queued) and `None` is
/// returned; otherwise the spawned task's handle is returned so
/// callers that care (tests, one-shot hosts) can await completion.
///
/// A failing probe publishes an empty inventory rather than keeping
/// the previous one: fail-open to empty, not fail-silent-stale.
pub fn request_refresh(
    owner: &Arc<OwnerShared>,
    probe: Arc<dyn VolumeProbe>,
    actions: Arc<dyn ActionRunner>,
    runtime: &tokio::runtime::Handle,
) -> Option<JoinHandle<()>> {
    if !owner.begin_refresh() {
        trace!("refresh already in flight, coalescing");
        return None;
    }

    let owner = Arc::clone(owner);
    Some(runtime.spawn(async move {
        let guard = InFlightGuard(Arc::clone(&owner));

        let settings = owner.snapshot_settings();

        let records = match probe.probe().await {
            Ok(probed) => {
                let records = filter_volumes(&probed, &settings.filter);
                if records.is_empty() {
                    warn!(probed = probed.len(), "no volumes matched the class filter");
                }
                records
            }
            Err(e) => {
                warn!(error = %e, "volume probe failed, publishing empty inventory");
                Vec::new()
            }
        };

        owner.publish(records);

        if !settings.finish_action.is_empty()
            && let Err(e) = actions.run(&settings.finish_action).await
        {
            warn!(error = %e, action = %settings.finish_action, "finish action failed");
        }

        drop(guard);
    }))
}
