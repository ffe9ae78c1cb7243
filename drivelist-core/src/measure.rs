// SPDX-License-Identifier: GPL-3.0-only

//! Measure API surface and the per-owner shared state.
//!
//! A [`Measure`] is the foreground-facing object the host adapter
//! drives: `configure` on load and every reload, `numeric_value` on
//! every tick, `string_value` on demand, `command` on user action, and
//! `dispose` on teardown. Whether it is an owner (with its own
//! inventory) or a dependent (reading through a resolved owner) is
//! decided per reload by the `parent` key.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use drivelist_types::{Inventory, MeasureConfig, NumberKind, VolumeClassFilter, VolumeRecord};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::actions::ActionRunner;
use crate::cursor::{Direction, IndexCursor};
use crate::error::DriveListError;
use crate::probe::VolumeProbe;
use crate::refresh;
use crate::registry::{OwnerRegistry, ScopeId};

/// Filter, finish action, and fallback string of an owner; read-only
/// between reloads. The refresh worker snapshots this once at start,
/// so a reload arriving mid-refresh only affects the next refresh.
#[derive(Debug, Clone, Default)]
pub struct OwnerSettings {
    pub filter: VolumeClassFilter,
    pub finish_action: String,
    pub fallback: String,
}

/// Published inventory plus the owner's own cursor. One lock for both,
/// since they are nearly always read together.
#[derive(Debug, Default)]
struct OwnerCache {
    inventory: Inventory,
    cursor: IndexCursor,
}

impl OwnerCache {
    fn numeric(&self, kind: NumberKind, position: i32) -> f64 {
        match kind {
            NumberKind::Status => {
                if IndexCursor::at(position).in_bounds(self.inventory.len()) {
                    1.0
                } else {
                    0.0
                }
            }
            NumberKind::Count => self.inventory.len() as f64,
        }
    }

    fn string(&self, position: i32, fallback: &str) -> String {
        match self.inventory.get(position) {
            Some(record) => record.as_str().to_string(),
            None => fallback.to_string(),
        }
    }
}

/// State shared between an owner measure, its dependents, and the
/// background refresh worker.
///
/// Two independent locks: the settings lock is taken only to snapshot
/// or reload configuration, the cache lock only to read or swap the
/// published inventory. The slow OS probe runs with neither held, so
/// foreground reads are never blocked behind it.
#[derive(Default)]
pub struct OwnerShared {
    settings: Mutex<OwnerSettings>,
    cache: Mutex<OwnerCache>,
    in_flight: AtomicBool,
}

impl OwnerShared {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot_settings(&self) -> OwnerSettings {
        self.settings.lock().expect("settings lock poisoned").clone()
    }

    pub fn update_settings(&self, settings: OwnerSettings) {
        *self.settings.lock().expect("settings lock poisoned") = settings;
    }

    /// Swap in a freshly enumerated sequence and re-validate the
    /// cursor against the new count. Atomic from the point of view of
    /// concurrent queries: they see either the old or the new
    /// generation, never a partial one.
    pub fn publish(&self, records: Vec<VolumeRecord>) {
        let mut cache = self.cache.lock().expect("cache lock poisoned");
        cache.inventory.replace(records);
        let count = cache.inventory.len();
        cache.cursor.apply_count(count);
    }

    pub fn count(&self) -> usize {
        self.cache.lock().expect("cache lock poisoned").inventory.len()
    }

    pub fn generation(&self) -> u64 {
        self.cache
            .lock()
            .expect("cache lock poisoned")
            .inventory
            .generation()
    }

    pub fn cursor_position(&self) -> i32 {
        self.cache.lock().expect("cache lock poisoned").cursor.position()
    }

    pub fn set_cursor(&self, position: i32) {
        self.cache
            .lock()
            .expect("cache lock poisoned")
            .cursor
            .set(position);
    }

    /// Step the owner's own cursor against the current inventory.
    pub fn step_cursor(&self, dir: Direction) {
        let mut cache = self.cache.lock().expect("cache lock poisoned");
        let count = cache.inventory.len();
        cache.cursor.step(dir, count);
    }

    /// Step a dependent-held position against the current inventory,
    /// returning the new position.
    pub fn step_position(&self, dir: Direction, position: i32) -> i32 {
        let cache = self.cache.lock().expect("cache lock poisoned");
        let mut cursor = IndexCursor::at(position);
        cursor.step(dir, cache.inventory.len());
        cursor.position()
    }

    /// Numeric value at the owner's own cursor.
    pub fn numeric_value(&self, kind: NumberKind) -> f64 {
        let cache = self.cache.lock().expect("cache lock poisoned");
        let position = cache.cursor.position();
        cache.numeric(kind, position)
    }

    /// Numeric value at a dependent-supplied position.
    pub fn numeric_value_at(&self, kind: NumberKind, position: i32) -> f64 {
        self.cache
            .lock()
            .expect("cache lock poisoned")
            .numeric(kind, position)
    }

    /// String value at the owner's own cursor.
    pub fn string_value(&self, fallback: &str) -> String {
        let cache = self.cache.lock().expect("cache lock poisoned");
        let position = cache.cursor.position();
        cache.string(position, fallback)
    }

    /// String value at a dependent-supplied position.
    pub fn string_value_at(&self, position: i32, fallback: &str) -> String {
        self.cache
            .lock()
            .expect("cache lock poisoned")
            .string(position, fallback)
    }

    /// Claim the single-flight slot. `false` means a refresh is
    /// already running and the caller must coalesce.
    pub(crate) fn begin_refresh(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn end_refresh(&self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Collaborators a measure needs; bundled so hosts and tests construct
/// them once and share them across all measures.
#[derive(Clone)]
pub struct MeasureContext {
    pub registry: Arc<OwnerRegistry>,
    pub probe: Arc<dyn VolumeProbe>,
    pub actions: Arc<dyn ActionRunner>,
    pub runtime: tokio::runtime::Handle,
}

enum Role {
    Unconfigured,
    Owner {
        shared: Arc<OwnerShared>,
        registered_name: String,
    },
    Dependent {
        owner: Option<Weak<OwnerShared>>,
        cursor: IndexCursor,
    },
}

pub struct Measure {
    name: String,
    scope: ScopeId,
    ctx: MeasureContext,
    number_kind: NumberKind,
    fallback: String,
    role: Role,
}

impl Measure {
    pub fn new(scope: ScopeId, ctx: MeasureContext) -> Self {
        Self {
            name: String::new(),
            scope,
            ctx,
            number_kind: NumberKind::Status,
            fallback: String::new(),
            role: Role::Unconfigured,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_owner(&self) -> bool {
        matches!(self.role, Role::Owner { .. })
    }

    /// Apply a configuration snapshot; called on load and every
    /// reload. Invalid values degrade with a warning, never fail.
    pub fn configure(&mut self, config: &MeasureConfig) {
        self.name = config.name.clone();

        self.number_kind = match NumberKind::parse(&config.number_type) {
            Some(kind) => kind,
            None => {
                warn!(
                    "'NumberType={}' invalid in {}, using status",
                    config.number_type, self.name
                );
                NumberKind::Status
            }
        };

        // Anything below the empty sentinel is a configuration mistake;
        // degrade to unset rather than carrying a bogus position.
        let index = if config.index < IndexCursor::EMPTY {
            warn!(
                "'Index={}' invalid in {}, treating as unset",
                config.index, self.name
            );
            IndexCursor::EMPTY
        } else {
            config.index
        };

        if config.is_owner() {
            self.configure_owner(config, index);
        } else {
            self.configure_dependent(config, index);
        }
    }

    fn configure_owner(&mut self, config: &MeasureConfig, index: i32) {
        self.fallback = config.default_string.clone().unwrap_or_default();

        // Keep the existing shared state across reloads so dependents
        // stay bound and the published inventory survives.
        let shared = match &self.role {
            Role::Owner { shared, .. } => Arc::clone(shared),
            _ => Arc::new(OwnerShared::new()),
        };

        shared.update_settings(OwnerSettings {
            filter: config.filter(),
            finish_action: config.finish_action.clone(),
            fallback: self.fallback.clone(),
        });
        shared.set_cursor(index);

        // Re-register under the new name if it changed (or if this
        // measure just became an owner).
        let needs_registration = match &self.role {
            Role::Owner {
                registered_name, ..
            } => *registered_name != self.name,
            _ => true,
        };
        if needs_registration {
            self.unbind_owner();
            self.ctx.registry.register(self.scope, &self.name, &shared);
        }

        self.role = Role::Owner {
            shared,
            registered_name: self.name.clone(),
        };
    }

    fn configure_dependent(&mut self, config: &MeasureConfig, index: i32) {
        self.unbind_owner();

        // Never carried across reloads: a parent name that stops
        // resolving must fall back to defaults immediately.
        let resolved = self.ctx.registry.find(self.scope, &config.parent);
        if resolved.is_none() {
            error!(
                measure = %self.name,
                "{}",
                DriveListError::ParentNotFound {
                    scope: self.scope,
                    name: config.parent.clone(),
                }
            );
        }

        // A dependent without its own fallback inherits the owner's.
        self.fallback = match &config.default_string {
            Some(s) => s.clone(),
            None => resolved
                .as_ref()
                .map(|owner| owner.snapshot_settings().fallback)
                .unwrap_or_default(),
        };

        self.role = Role::Dependent {
            owner: resolved.as_ref().map(Arc::downgrade),
            cursor: IndexCursor::at(index),
        };
    }

    /// If this measure was a registered owner, remove it from the
    /// registry.
    fn unbind_owner(&mut self) {
        if let Role::Owner {
            shared,
            registered_name,
        } = &self.role
        {
            self.ctx
                .registry
                .unregister(self.scope, registered_name, shared);
        }
    }

    fn bound_owner(&self) -> Option<Arc<OwnerShared>> {
        match &self.role {
            Role::Dependent {
                owner: Some(weak), ..
            } => weak.upgrade(),
            _ => None,
        }
    }

    /// Kick off a background refresh for an owner measure. Returns the
    /// spawned task handle, or `None` when the call coalesced into an
    /// already-running refresh (or this measure owns no inventory).
    pub fn refresh(&self) -> Option<JoinHandle<()>> {
        match &self.role {
            Role::Owner { shared, .. } => refresh::request_refresh(
                shared,
                Arc::clone(&self.ctx.probe),
                Arc::clone(&self.ctx.actions),
                &self.ctx.runtime,
            ),
            _ => None,
        }
    }

    /// Per-tick entry point, mirroring the host's update cycle: kick
    /// off the (coalesced, non-blocking) refresh for owners, then
    /// report the current numeric value.
    pub fn update(&self) -> f64 {
        self.refresh();
        self.numeric_value()
    }

    /// Numeric value from whatever inventory is currently published.
    /// Never blocks and never triggers I/O.
    pub fn numeric_value(&self) -> f64 {
        match &self.role {
            Role::Owner { shared, .. } => shared.numeric_value(self.number_kind),
            Role::Dependent {
                owner: Some(weak),
                cursor,
            } => match weak.upgrade() {
                Some(shared) => shared.numeric_value_at(self.number_kind, cursor.position()),
                None => 0.0,
            },
            _ => 0.0,
        }
    }

    pub fn string_value(&self) -> String {
        match &self.role {
            Role::Owner { shared, .. } => shared.string_value(&self.fallback),
            Role::Dependent {
                owner: Some(weak),
                cursor,
            } => match weak.upgrade() {
                Some(shared) => shared.string_value_at(cursor.position(), &self.fallback),
                None => self.fallback.clone(),
            },
            _ => self.fallback.clone(),
        }
    }

    /// Handle a navigation command. Unknown verbs leave the state
    /// unchanged and are reported as errors.
    pub fn command(&mut self, verb: &str) {
        if let Err(e) = self.try_command(verb) {
            error!("{e}");
        }
    }

    /// Fallible command handling for hosts that surface errors
    /// themselves.
    pub fn try_command(&mut self, verb: &str) -> Result<(), DriveListError> {
        let Some(dir) = Direction::parse(verb) else {
            return Err(DriveListError::UnknownVerb {
                measure: self.name.clone(),
                verb: verb.to_string(),
            });
        };

        match &mut self.role {
            Role::Owner { shared, .. } => shared.step_cursor(dir),
            Role::Dependent { owner, cursor } => {
                let count = owner
                    .as_ref()
                    .and_then(Weak::upgrade)
                    .map(|shared| shared.count())
                    .unwrap_or(0);
                cursor.step(dir, count);
            }
            Role::Unconfigured => {
                debug!("command {:?} before configuration in {}", verb, self.name);
            }
        }
        Ok(())
    }

    /// Teardown: an owner removes itself from the registry before its
    /// memory goes away.
    pub fn dispose(&mut self) {
        self.unbind_owner();
        self.role = Role::Unconfigured;
    }
}

impl Drop for Measure {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(idents: &[&str]) -> Vec<VolumeRecord> {
        idents.iter().copied().map(VolumeRecord::new).collect()
    }

    #[test]
    fn publish_clamps_cursor_on_shrink() {
        let shared = OwnerShared::new();
        shared.set_cursor(4);
        shared.publish(records(&["a", "b", "c", "d", "e"]));
        assert_eq!(shared.cursor_position(), 4);

        shared.publish(records(&["a", "b", "c"]));
        assert_eq!(shared.cursor_position(), 2);

        shared.publish(Vec::new());
        assert_eq!(shared.cursor_position(), IndexCursor::EMPTY);
    }

    #[test]
    fn publish_bumps_generation_each_time() {
        let shared = OwnerShared::new();
        shared.publish(records(&["a"]));
        shared.publish(records(&["a"]));
        assert_eq!(shared.generation(), 2);
    }

    #[test]
    fn status_reflects_bounds_count_reflects_size() {
        let shared = OwnerShared::new();
        shared.publish(records(&["a", "b"]));

        assert_eq!(shared.numeric_value_at(NumberKind::Status, 1), 1.0);
        assert_eq!(shared.numeric_value_at(NumberKind::Status, 2), 0.0);
        assert_eq!(shared.numeric_value_at(NumberKind::Status, -1), 0.0);
        assert_eq!(shared.numeric_value_at(NumberKind::Count, -1), 2.0);
    }

    #[test]
    fn string_value_falls_back_out_of_bounds() {
        let shared = OwnerShared::new();
        shared.publish(records(&["a", "b"]));

        assert_eq!(shared.string_value_at(0, "_"), "a");
        assert_eq!(shared.string_value_at(5, "_"), "_");
        assert_eq!(shared.string_value_at(-1, "_"), "_");
    }

    #[test]
    fn step_position_wraps_against_current_count() {
        let shared = OwnerShared::new();
        shared.publish(records(&["a", "b", "c"]));

        assert_eq!(shared.step_position(Direction::Forward, 2), 0);
        assert_eq!(shared.step_position(Direction::Backward, 0), 2);

        shared.publish(Vec::new());
        assert_eq!(shared.step_position(Direction::Forward, 0), IndexCursor::EMPTY);
    }
}
