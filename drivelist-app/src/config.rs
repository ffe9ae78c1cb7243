// SPDX-License-Identifier: GPL-3.0-only

//! TOML measure configuration for the CLI host.

use std::path::Path;

use anyhow::{Context, Result};
use drivelist_types::MeasureConfig;
use serde::Deserialize;

/// One `[[measure]]` table per measure; owners and dependents mixed
/// freely, matched by name within the file's single scope.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub measure: Vec<MeasureConfig>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_owner_and_dependent_measures() {
        let config: AppConfig = toml::from_str(
            r#"
            [[measure]]
            name = "drives"
            optical = true
            number_type = "count"
            finish_action = "notify-send 'drive list updated'"

            [[measure]]
            name = "drive0"
            parent = "drives"
            index = 0
            default_string = "-"
            "#,
        )
        .unwrap();

        assert_eq!(config.measure.len(), 2);
        assert!(config.measure[0].is_owner());
        assert!(config.measure[0].optical);
        assert!(!config.measure[1].is_owner());
        assert_eq!(config.measure[1].parent, "drives");
    }

    #[test]
    fn empty_file_yields_no_measures() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.measure.is_empty());
    }
}
