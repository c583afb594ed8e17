//! Startup configuration surface.
//!
//! A single JSON document declares every region (keyed by name), the
//! breakpoint table and the monitor's debounce settings. It is read once and
//! turned into validated engine types by [`LayoutConfig::build`].

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::breakpoint::{BreakpointTable, BreakpointTier, Threshold};
use crate::error::Result;
use crate::geometry::Anchor;
use crate::monitor::{DEFAULT_DEBOUNCE, MonitorConfig};
use crate::registry::{RegionOverride, RegionRegistry, RegionSpec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionDecl {
    pub anchor: Anchor,
    pub z_index: i32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub min_spacing: u32,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<BreakpointTier, RegionOverride>,
}

fn enabled_by_default() -> bool {
    true
}

impl RegionDecl {
    fn into_spec(self, name: String) -> RegionSpec {
        RegionSpec {
            name,
            anchor: self.anchor,
            z_index: self.z_index,
            size: self.size,
            min_spacing: self.min_spacing,
            enabled: self.enabled,
            overrides: self.overrides,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointConfig {
    pub thresholds: Vec<Threshold>,
    pub fallback: BreakpointTier,
}

impl Default for BreakpointConfig {
    fn default() -> Self {
        let table = BreakpointTable::default();
        Self {
            thresholds: table.thresholds().to_vec(),
            fallback: table.fallback().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub debounce_ms: u64,
    pub immediate_on_focus: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            immediate_on_focus: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub breakpoints: BreakpointConfig,
    #[serde(default)]
    pub monitor: MonitorSettings,
    pub regions: BTreeMap<String, RegionDecl>,
}

/// Validated engine inputs produced from a [`LayoutConfig`].
#[derive(Debug, Clone)]
pub struct EngineParts {
    pub registry: RegionRegistry,
    pub table: BreakpointTable,
    pub monitor: MonitorConfig,
}

impl LayoutConfig {
    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate and build the registry, breakpoint table and monitor settings.
    pub fn build(&self) -> Result<EngineParts> {
        let table = BreakpointTable::new(
            self.breakpoints.thresholds.clone(),
            self.breakpoints.fallback.clone(),
        )?;
        let registry = RegionRegistry::from_specs(
            self.regions
                .iter()
                .map(|(name, decl)| decl.clone().into_spec(name.clone())),
        )?;
        let monitor = MonitorConfig {
            debounce: Duration::from_millis(self.monitor.debounce_ms),
            immediate_on_focus: self.monitor.immediate_on_focus,
        };
        Ok(EngineParts {
            registry,
            table,
            monitor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LayoutError, RegionConflict};

    const MOBILE: &str = r#"{
        "breakpoints": {
            "thresholds": [
                { "max_width": 480, "tier": "compact" },
                { "max_width": 1024, "tier": "regular" }
            ],
            "fallback": "wide"
        },
        "monitor": { "debounce_ms": 120 },
        "regions": {
            "header": { "anchor": "top", "z_index": 10, "size": 56, "min_spacing": 8,
                        "overrides": { "wide": { "size": 72 } } },
            "coin":   { "anchor": "bottom", "z_index": 5, "size": 48, "min_spacing": 16,
                        "overrides": { "wide": { "enabled": false } } },
            "footer": { "anchor": "bottom", "z_index": 7, "size": 64 }
        }
    }"#;

    #[test]
    fn builds_engine_parts_from_json() {
        let parts = LayoutConfig::from_json_str(MOBILE).unwrap().build().unwrap();

        assert_eq!(parts.registry.len(), 3);
        assert_eq!(parts.monitor.debounce, Duration::from_millis(120));
        assert!(parts.monitor.immediate_on_focus);
        assert_eq!(parts.table.classify(1440), BreakpointTier::WIDE);

        let wide = parts.registry.resolve_for_tier(&BreakpointTier::WIDE);
        assert_eq!(wide[0].name, "header");
        assert_eq!(wide[0].size, 72);
        assert!(!wide.iter().find(|r| r.name == "coin").unwrap().enabled);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = LayoutConfig::from_json_str(
            r#"{ "regions": { "header": { "anchor": "top", "z_index": 1 } } }"#,
        )
        .unwrap();
        assert_eq!(config.monitor, MonitorSettings::default());

        let parts = config.build().unwrap();
        assert_eq!(parts.table, BreakpointTable::default());
        let header = parts.registry.get("header").unwrap();
        assert!(header.enabled);
        assert_eq!((header.size, header.min_spacing), (0, 0));
    }

    #[test]
    fn duplicate_z_index_aborts_build() {
        let config = LayoutConfig::from_json_str(
            r#"{ "regions": {
                "header": { "anchor": "top", "z_index": 3 },
                "footer": { "anchor": "bottom", "z_index": 3 }
            } }"#,
        )
        .unwrap();
        let err = config.build().unwrap_err();
        assert!(matches!(
            err,
            LayoutError::DuplicateRegion {
                conflict: RegionConflict::ZIndex { z_index: 3, .. },
                ..
            }
        ));
    }

    #[test]
    fn unordered_thresholds_abort_build() {
        let mut config = LayoutConfig::from_json_str(MOBILE).unwrap();
        config.breakpoints.thresholds.reverse();
        assert!(matches!(
            config.build().unwrap_err(),
            LayoutError::InvalidThreshold { position: 1, .. }
        ));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = LayoutConfig::from_json_str(r#"{ "regions": { "x": { "anchor": "left", "z_index": 1 } } }"#)
            .unwrap_err();
        assert!(matches!(err, LayoutError::Config(_)));
    }

    #[test]
    fn pretty_json_round_trips() {
        let config = LayoutConfig::from_json_str(MOBILE).unwrap();
        let text = config.to_json_pretty().unwrap();
        assert_eq!(LayoutConfig::from_json_str(&text).unwrap(), config);
    }
}
