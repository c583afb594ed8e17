use serde::{Deserialize, Serialize};

/// Edge of the viewport a region is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Bottom,
}

impl Anchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::Top => "top",
            Anchor::Bottom => "bottom",
        }
    }
}

/// Snapshot of the viewport measured in CSS pixels.
///
/// `effective_height` is the height left once the on-screen keyboard and safe
/// area are subtracted; `inset_bottom` is that subtracted amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ViewportMetrics {
    pub width: u32,
    pub height: u32,
    pub effective_height: u32,
    pub inset_bottom: u32,
}

impl ViewportMetrics {
    pub const fn new(width: u32, height: u32, effective_height: u32, inset_bottom: u32) -> Self {
        Self {
            width,
            height,
            effective_height,
            inset_bottom,
        }
    }

    /// Metrics for a viewport with no keyboard or safe-area reduction.
    pub const fn unobstructed(width: u32, height: u32) -> Self {
        Self::new(width, height, height, 0)
    }

    /// Vertical budget the resolver may hand out to regions.
    ///
    /// Never larger than what remains of `height` once the bottom inset is
    /// removed, even if a host reports an inconsistent `effective_height`.
    pub fn usable_height(&self) -> u32 {
        self.effective_height
            .min(self.height.saturating_sub(self.inset_bottom))
    }
}

/// Half-open vertical interval `[start, end)` in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn intersects(&self, other: &Span) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }
}
