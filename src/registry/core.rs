use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::breakpoint::BreakpointTier;
use crate::error::{LayoutError, Result};
use crate::geometry::Anchor;

pub type RegionName = String;

/// Fields a breakpoint tier may replace on a region. Unset fields inherit the base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_spacing: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl RegionOverride {
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn min_spacing(mut self, spacing: u32) -> Self {
        self.min_spacing = Some(spacing);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }
}

/// Static declaration of a layout region.
///
/// `anchor` and `z_index` are fixed for the life of the region; tier overrides
/// can only touch the fields in [`RegionOverride`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSpec {
    pub name: RegionName,
    pub anchor: Anchor,
    pub z_index: i32,
    pub size: u32,
    pub min_spacing: u32,
    pub enabled: bool,
    pub overrides: BTreeMap<BreakpointTier, RegionOverride>,
}

impl RegionSpec {
    pub fn new(name: impl Into<RegionName>, anchor: Anchor, z_index: i32) -> Self {
        Self {
            name: name.into(),
            anchor,
            z_index,
            size: 0,
            min_spacing: 0,
            enabled: true,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_min_spacing(mut self, spacing: u32) -> Self {
        self.min_spacing = spacing;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_override(mut self, tier: BreakpointTier, patch: RegionOverride) -> Self {
        self.overrides.insert(tier, patch);
        self
    }

    fn for_tier(&self, tier: &BreakpointTier) -> TierRegion {
        let patch = self.overrides.get(tier);
        TierRegion {
            name: self.name.clone(),
            anchor: self.anchor,
            z_index: self.z_index,
            size: patch.and_then(|p| p.size).unwrap_or(self.size),
            min_spacing: patch.and_then(|p| p.min_spacing).unwrap_or(self.min_spacing),
            enabled: patch.and_then(|p| p.enabled).unwrap_or(self.enabled),
        }
    }
}

/// A region spec with the overrides for one tier already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierRegion {
    pub name: RegionName,
    pub anchor: Anchor,
    pub z_index: i32,
    pub size: u32,
    pub min_spacing: u32,
    pub enabled: bool,
}

impl TierRegion {
    /// Vertical extent the region reserves when visible.
    pub fn band(&self) -> u32 {
        self.size.saturating_add(self.min_spacing)
    }
}

/// Validated set of region declarations, kept in descending z-index order.
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: Vec<RegionSpec>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs(specs: impl IntoIterator<Item = RegionSpec>) -> Result<Self> {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, spec: RegionSpec) -> Result<()> {
        for existing in &self.regions {
            if existing.name == spec.name {
                return Err(LayoutError::duplicate_name(spec.name));
            }
            if existing.z_index == spec.z_index {
                return Err(LayoutError::duplicate_z_index(
                    spec.name,
                    existing.name.clone(),
                    spec.z_index,
                ));
            }
        }

        let at = self
            .regions
            .iter()
            .position(|existing| existing.z_index < spec.z_index)
            .unwrap_or(self.regions.len());
        self.regions.insert(at, spec);
        Ok(())
    }

    /// Merge every region with its overrides for `tier`, highest z-index first.
    pub fn resolve_for_tier(&self, tier: &BreakpointTier) -> Vec<TierRegion> {
        self.regions.iter().map(|spec| spec.for_tier(tier)).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RegionSpec> {
        self.regions.iter().find(|spec| spec.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionSpec> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
