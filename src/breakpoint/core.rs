use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

/// Discrete responsive classification of a viewport width.
///
/// The set is open: `COMPACT`, `REGULAR` and `WIDE` are provided, but any name
/// may appear in a breakpoint table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreakpointTier(Cow<'static, str>);

impl BreakpointTier {
    pub const COMPACT: BreakpointTier = BreakpointTier(Cow::Borrowed("compact"));
    pub const REGULAR: BreakpointTier = BreakpointTier(Cow::Borrowed("regular"));
    pub const WIDE: BreakpointTier = BreakpointTier(Cow::Borrowed("wide"));

    pub fn named(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BreakpointTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upper width bound (inclusive) for a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
    pub max_width: u32,
    pub tier: BreakpointTier,
}

impl Threshold {
    pub fn new(max_width: u32, tier: BreakpointTier) -> Self {
        Self { max_width, tier }
    }
}

/// Validated, smallest-first breakpoint table with an unbounded fallback tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointTable {
    thresholds: Vec<Threshold>,
    fallback: BreakpointTier,
}

impl BreakpointTable {
    /// Build a table, rejecting thresholds that are not strictly increasing or
    /// that reuse a tier name.
    pub fn new(thresholds: Vec<Threshold>, fallback: BreakpointTier) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut previous: Option<u32> = None;

        for (position, threshold) in thresholds.iter().enumerate() {
            if let Some(prev) = previous {
                if threshold.max_width <= prev {
                    return Err(LayoutError::invalid_threshold(
                        position,
                        format!(
                            "max_width {} does not exceed previous {}",
                            threshold.max_width, prev
                        ),
                    ));
                }
            }
            if !seen.insert(threshold.tier.clone()) {
                return Err(LayoutError::invalid_threshold(
                    position,
                    format!("tier `{}` appears more than once", threshold.tier),
                ));
            }
            previous = Some(threshold.max_width);
        }

        if seen.contains(&fallback) {
            return Err(LayoutError::invalid_threshold(
                thresholds.len(),
                format!("fallback tier `{fallback}` is also bounded"),
            ));
        }

        Ok(Self {
            thresholds,
            fallback,
        })
    }

    pub fn thresholds(&self) -> &[Threshold] {
        &self.thresholds
    }

    pub fn fallback(&self) -> &BreakpointTier {
        &self.fallback
    }

    pub fn classify(&self, width: u32) -> BreakpointTier {
        self.thresholds
            .iter()
            .find(|threshold| threshold.max_width >= width)
            .map(|threshold| threshold.tier.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// Position of `tier` in ascending width order, fallback last.
    pub fn rank(&self, tier: &BreakpointTier) -> Option<usize> {
        if tier == &self.fallback {
            return Some(self.thresholds.len());
        }
        self.thresholds.iter().position(|t| &t.tier == tier)
    }

    /// Every tier in ascending width order.
    pub fn tiers(&self) -> impl Iterator<Item = &BreakpointTier> {
        self.thresholds
            .iter()
            .map(|t| &t.tier)
            .chain(std::iter::once(&self.fallback))
    }
}

impl Default for BreakpointTable {
    fn default() -> Self {
        Self {
            thresholds: vec![
                Threshold::new(480, BreakpointTier::COMPACT),
                Threshold::new(1024, BreakpointTier::REGULAR),
            ],
            fallback: BreakpointTier::WIDE,
        }
    }
}

/// Map `width` to a tier using `table`.
pub fn classify(width: u32, table: &BreakpointTable) -> BreakpointTier {
    table.classify(width)
}
