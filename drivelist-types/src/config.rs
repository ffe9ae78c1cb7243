// SPDX-License-Identifier: GPL-3.0-only

//! Measure configuration as handed over by the host.
//!
//! The host adapter (or the CLI's TOML loader) produces one
//! [`MeasureConfig`] per measure on load and on every reload. Every key
//! has a default, so a minimal owner needs nothing but a name.

use serde::{Deserialize, Serialize};

use crate::volume::VolumeClassFilter;

/// Semantics of a measure's numeric value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberKind {
    /// 1.0 when the measure's position is within the current inventory
    /// bounds, 0.0 otherwise.
    #[default]
    Status,
    /// Current inventory size.
    Count,
}

impl NumberKind {
    /// Case-insensitive parse of the `NumberType` key. `None` for
    /// anything outside {"status", "count"}; the caller decides how to
    /// report that.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("status") {
            Some(NumberKind::Status)
        } else if raw.eq_ignore_ascii_case("count") {
            Some(NumberKind::Count)
        } else {
            None
        }
    }
}

/// One measure's configuration, reloaded wholesale on every
/// configuration pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    /// User-visible measure name; used for diagnostics and for
    /// dependent-to-owner binding.
    pub name: String,

    /// Position into the owner's inventory. -1 means "unset": queries
    /// report out-of-bounds until a command or a reload moves it.
    pub index: i32,

    /// Returned by the string query when the position is out of bounds.
    /// A dependent that leaves this unset inherits its owner's value.
    pub default_string: Option<String>,

    /// Empty: this measure is an owner with its own inventory.
    /// Non-empty: this measure is a dependent reading through the named
    /// owner in the same scope.
    pub parent: String,

    /// Per-class filter toggles; meaningful for owners only.
    pub fixed: bool,
    pub removable: bool,
    pub network: bool,
    pub optical: bool,
    pub ram: bool,

    /// Opaque command line handed to the action runner after each
    /// refresh. Empty disables the hook.
    pub finish_action: String,

    /// Raw `NumberType` value; parsed leniently by the core, falling
    /// back to "status" with a warning.
    pub number_type: String,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            index: -1,
            default_string: None,
            parent: String::new(),
            fixed: true,
            removable: true,
            network: true,
            optical: false,
            ram: false,
            finish_action: String::new(),
            number_type: "status".to_string(),
        }
    }
}

impl MeasureConfig {
    /// The class filter encoded by this configuration. The `no-root`
    /// and `unknown` classes are not host-configurable and stay off.
    pub fn filter(&self) -> VolumeClassFilter {
        VolumeClassFilter {
            fixed: self.fixed,
            removable: self.removable,
            network: self.network,
            optical: self.optical,
            ram: self.ram,
            no_root: false,
            unknown: false,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.parent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_kind_parse_is_case_insensitive() {
        assert_eq!(NumberKind::parse("status"), Some(NumberKind::Status));
        assert_eq!(NumberKind::parse("Count"), Some(NumberKind::Count));
        assert_eq!(NumberKind::parse("COUNT"), Some(NumberKind::Count));
        assert_eq!(NumberKind::parse("percent"), None);
        assert_eq!(NumberKind::parse(""), None);
    }

    #[test]
    fn minimal_toml_gets_defaults() {
        let cfg: MeasureConfig = toml::from_str("name = \"drives\"").unwrap();
        assert_eq!(cfg.name, "drives");
        assert_eq!(cfg.index, -1);
        assert_eq!(cfg.default_string, None);
        assert!(cfg.is_owner());
        assert_eq!(cfg.filter(), VolumeClassFilter::default());
        assert!(cfg.finish_action.is_empty());
        assert_eq!(NumberKind::parse(&cfg.number_type), Some(NumberKind::Status));
    }

    #[test]
    fn dependent_toml_round_trip() {
        let cfg: MeasureConfig = toml::from_str(
            "name = \"drive0\"\nparent = \"drives\"\nindex = 0\ndefault_string = \"-\"",
        )
        .unwrap();
        assert!(!cfg.is_owner());
        assert_eq!(cfg.parent, "drives");
        assert_eq!(cfg.index, 0);
        assert_eq!(cfg.default_string.as_deref(), Some("-"));
    }

    #[test]
    fn filter_never_enables_unconfigurable_classes() {
        let cfg: MeasureConfig = toml::from_str(
            "name = \"drives\"\nfixed = false\noptical = true\nram = true",
        )
        .unwrap();
        let filter = cfg.filter();
        assert!(!filter.fixed);
        assert!(filter.optical);
        assert!(filter.ram);
        assert!(!filter.no_root);
        assert!(!filter.unknown);
    }
}
