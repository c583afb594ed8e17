use serde::Serialize;

use crate::breakpoint::BreakpointTier;
use crate::geometry::{Anchor, Span, ViewportMetrics};
use crate::registry::{RegionName, RegionRegistry, TierRegion};

/// Concrete placement of one region for one viewport snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedGeometry {
    pub name: RegionName,
    pub anchor: Anchor,
    pub z_index: i32,
    /// Distance from the anchor edge to the near side of the region's box.
    pub offset: u32,
    pub size: u32,
    /// Extent from the anchor edge through this region's band.
    pub reserved_spacing: u32,
    pub visible: bool,
}

impl ResolvedGeometry {
    fn hidden(region: &TierRegion) -> Self {
        Self {
            name: region.name.clone(),
            anchor: region.anchor,
            z_index: region.z_index,
            offset: 0,
            size: region.size,
            reserved_spacing: 0,
            visible: false,
        }
    }

    /// Screen-space interval covered by the region's box, `None` when hidden.
    pub fn occupied(&self, viewport_height: u32) -> Option<Span> {
        if !self.visible {
            return None;
        }
        Some(match self.anchor {
            Anchor::Top => Span::new(self.offset, self.offset.saturating_add(self.size)),
            Anchor::Bottom => {
                let end = viewport_height.saturating_sub(self.offset);
                Span::new(end.saturating_sub(self.size), end)
            }
        })
    }
}

/// Output of one resolve pass: every registered region exactly once, in
/// descending z-index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLayout {
    pub metrics: ViewportMetrics,
    pub tier: BreakpointTier,
    pub geometries: Vec<ResolvedGeometry>,
}

impl ResolvedLayout {
    pub fn get(&self, name: &str) -> Option<&ResolvedGeometry> {
        self.geometries.iter().find(|geometry| geometry.name == name)
    }

    pub fn visible(&self) -> impl Iterator<Item = &ResolvedGeometry> {
        self.geometries.iter().filter(|geometry| geometry.visible)
    }

    pub fn hidden_count(&self) -> usize {
        self.geometries.iter().filter(|g| !g.visible).count()
    }

    /// Padding page content needs at the top edge.
    pub fn reserved_top(&self) -> u32 {
        self.reserved_for(Anchor::Top)
    }

    /// Padding page content needs at the bottom edge, inset included.
    pub fn reserved_bottom(&self) -> u32 {
        self.reserved_for(Anchor::Bottom)
    }

    fn reserved_for(&self, anchor: Anchor) -> u32 {
        self.visible()
            .filter(|geometry| geometry.anchor == anchor)
            .map(|geometry| geometry.reserved_spacing)
            .max()
            .unwrap_or(0)
    }

    /// Content hash over tier, metrics and every geometry field.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.tier.as_str().as_bytes());
        hasher.update(&[0]);
        for value in [
            self.metrics.width,
            self.metrics.height,
            self.metrics.effective_height,
            self.metrics.inset_bottom,
        ] {
            hasher.update(&value.to_le_bytes());
        }
        for geometry in &self.geometries {
            hasher.update(geometry.name.as_bytes());
            hasher.update(&[0, geometry.anchor as u8, geometry.visible as u8]);
            hasher.update(&geometry.z_index.to_le_bytes());
            hasher.update(&geometry.offset.to_le_bytes());
            hasher.update(&geometry.size.to_le_bytes());
            hasher.update(&geometry.reserved_spacing.to_le_bytes());
        }
        hasher.finalize()
    }
}

/// Resolve every region in `registry` for `tier` against `metrics`.
pub fn resolve(
    registry: &RegionRegistry,
    tier: &BreakpointTier,
    metrics: &ViewportMetrics,
) -> ResolvedLayout {
    let regions = registry.resolve_for_tier(tier);
    ResolvedLayout {
        metrics: *metrics,
        tier: tier.clone(),
        geometries: place(&regions, metrics),
    }
}

/// Place tier-resolved regions (descending z-index) without overlap.
///
/// Enabled regions are kept in priority order while their bands, summed
/// across both anchor groups, fit the usable height. The first region that
/// does not fit is hidden together with every lower-priority region.
pub fn place(regions: &[TierRegion], metrics: &ViewportMetrics) -> Vec<ResolvedGeometry> {
    let budget = u64::from(metrics.usable_height());

    let mut occupied: u64 = 0;
    let mut overflowed = false;
    let visible: Vec<bool> = regions
        .iter()
        .map(|region| {
            if !region.enabled || overflowed {
                return false;
            }
            let next = occupied + u64::from(region.band());
            if next > budget {
                overflowed = true;
                return false;
            }
            occupied = next;
            true
        })
        .collect();

    let mut top_cursor: u32 = 0;
    let mut bottom_cursor: u32 = metrics.inset_bottom;

    regions
        .iter()
        .zip(visible)
        .map(|(region, shown)| {
            if !shown {
                return ResolvedGeometry::hidden(region);
            }
            let (offset, reserved) = match region.anchor {
                Anchor::Top => {
                    let offset = top_cursor;
                    top_cursor = top_cursor.saturating_add(region.band());
                    (offset, top_cursor)
                }
                Anchor::Bottom => {
                    let offset = bottom_cursor.saturating_add(region.min_spacing);
                    bottom_cursor = bottom_cursor.saturating_add(region.band());
                    (offset, bottom_cursor)
                }
            };
            ResolvedGeometry {
                name: region.name.clone(),
                anchor: region.anchor,
                z_index: region.z_index,
                offset,
                size: region.size,
                reserved_spacing: reserved,
                visible: true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RegionOverride, RegionSpec};

    fn header_and_coin() -> RegionRegistry {
        RegionRegistry::from_specs([
            RegionSpec::new("header", Anchor::Top, 10)
                .with_size(20)
                .with_min_spacing(10),
            RegionSpec::new("coin", Anchor::Bottom, 5)
                .with_size(40)
                .with_min_spacing(20),
        ])
        .unwrap()
    }

    fn mobile_stack() -> RegionRegistry {
        RegionRegistry::from_specs([
            RegionSpec::new("header", Anchor::Top, 100)
                .with_size(56)
                .with_min_spacing(8),
            RegionSpec::new("subnav", Anchor::Top, 40)
                .with_size(44)
                .with_min_spacing(4),
            RegionSpec::new("footer", Anchor::Bottom, 90)
                .with_size(64)
                .with_min_spacing(0),
            RegionSpec::new("coin", Anchor::Bottom, 50)
                .with_size(48)
                .with_min_spacing(16),
            RegionSpec::new("banner", Anchor::Bottom, 10)
                .with_size(80)
                .with_min_spacing(12),
        ])
        .unwrap()
    }

    fn assert_no_overlap(layout: &ResolvedLayout) {
        let height = layout.metrics.height;
        let spans: Vec<_> = layout
            .visible()
            .filter_map(|g| g.occupied(height).map(|span| (g.name.as_str(), span)))
            .collect();
        for (i, (a_name, a)) in spans.iter().enumerate() {
            for (b_name, b) in &spans[i + 1..] {
                assert!(
                    !a.intersects(b),
                    "{a_name} {a:?} overlaps {b_name} {b:?} at {:?}",
                    layout.metrics
                );
            }
        }
    }

    #[test]
    fn header_and_coin_fit_in_tall_viewport() {
        let metrics = ViewportMetrics::new(390, 300, 300, 0);
        let layout = resolve(&header_and_coin(), &BreakpointTier::COMPACT, &metrics);

        let header = layout.get("header").unwrap();
        let coin = layout.get("coin").unwrap();
        assert!(header.visible && coin.visible);
        assert_eq!(header.offset, 0);
        assert_eq!(coin.offset, 20);
        assert_eq!(layout.reserved_top(), 30);
        assert_eq!(layout.reserved_bottom(), 60);
    }

    #[test]
    fn keyboard_squeeze_hides_lower_priority_coin() {
        let metrics = ViewportMetrics::new(390, 300, 30, 0);
        let layout = resolve(&header_and_coin(), &BreakpointTier::COMPACT, &metrics);

        assert!(layout.get("header").unwrap().visible);
        let coin = layout.get("coin").unwrap();
        assert!(!coin.visible);
        assert_eq!((coin.offset, coin.reserved_spacing), (0, 0));
    }

    #[test]
    fn bottom_group_sits_above_inset() {
        let metrics = ViewportMetrics::new(390, 800, 500, 300);
        let layout = resolve(&mobile_stack(), &BreakpointTier::COMPACT, &metrics);

        let footer = layout.get("footer").unwrap();
        let coin = layout.get("coin").unwrap();
        assert_eq!(footer.offset, 300);
        assert_eq!(coin.offset, 300 + 64 + 16);
        assert_eq!(coin.reserved_spacing, 300 + 64 + 64);
        assert_no_overlap(&layout);
    }

    #[test]
    fn every_region_reported_once_in_canonical_order() {
        let registry = mobile_stack();
        for effective in (0..=900).step_by(25) {
            let metrics = ViewportMetrics::new(390, 900, effective, 900 - effective);
            let layout = resolve(&registry, &BreakpointTier::COMPACT, &metrics);
            let names: Vec<_> = layout.geometries.iter().map(|g| g.name.as_str()).collect();
            assert_eq!(names, ["header", "footer", "coin", "subnav", "banner"]);
        }
    }

    #[test]
    fn visible_regions_never_overlap() {
        let registry = mobile_stack();
        for height in (0..=1000).step_by(13) {
            for inset in [0, 34, 120, 336] {
                let metrics =
                    ViewportMetrics::new(390, height, height.saturating_sub(inset), inset);
                let layout = resolve(&registry, &BreakpointTier::COMPACT, &metrics);
                assert_no_overlap(&layout);
                assert!(
                    layout.reserved_top() + layout.reserved_bottom() <= height,
                    "reserved bands exceed viewport at {metrics:?}"
                );
            }
        }
    }

    #[test]
    fn hiding_is_monotonic_in_effective_height() {
        let registry = mobile_stack();
        let mut previously_visible: Option<Vec<bool>> = None;
        for effective in (0..=600).rev() {
            let metrics = ViewportMetrics::new(390, 600, effective, 600 - effective);
            let layout = resolve(&registry, &BreakpointTier::COMPACT, &metrics);
            let visible: Vec<bool> = layout.geometries.iter().map(|g| g.visible).collect();
            if let Some(prev) = &previously_visible {
                for (idx, (was, is)) in prev.iter().zip(&visible).enumerate() {
                    assert!(
                        *was || !*is,
                        "{} reappeared at effective height {effective}",
                        layout.geometries[idx].name
                    );
                }
            }
            previously_visible = Some(visible);
        }
    }

    #[test]
    fn lower_priority_hidden_before_higher() {
        let registry = mobile_stack();
        for effective in 0..=400 {
            let metrics = ViewportMetrics::new(390, 400, effective, 400 - effective);
            let layout = resolve(&registry, &BreakpointTier::COMPACT, &metrics);
            // Visibility is a prefix of the z-ordered list.
            if let Some(cut) = layout.geometries.iter().position(|g| !g.visible) {
                assert!(
                    layout.geometries[cut..].iter().all(|g| !g.visible),
                    "{} visible below hidden {} at effective height {effective}",
                    layout.geometries[cut..]
                        .iter()
                        .find(|g| g.visible)
                        .map(|g| g.name.as_str())
                        .unwrap_or_default(),
                    layout.geometries[cut].name
                );
            }
        }
    }

    #[test]
    fn large_high_priority_region_never_yields_to_small_lower_one() {
        let registry = RegionRegistry::from_specs([
            RegionSpec::new("hero", Anchor::Top, 10).with_size(60),
            RegionSpec::new("coin", Anchor::Bottom, 5).with_size(50),
        ])
        .unwrap();

        let mut coin_hidden_at = None;
        for effective in (0..=200).rev() {
            let metrics = ViewportMetrics::new(390, 200, effective, 0);
            let layout = resolve(&registry, &BreakpointTier::COMPACT, &metrics);
            let hero = layout.get("hero").unwrap().visible;
            let coin = layout.get("coin").unwrap().visible;

            assert!(hero || !coin, "coin outlived hero at effective height {effective}");
            if let Some(at) = coin_hidden_at {
                assert!(!coin, "coin hidden at {at} but visible at {effective}");
            } else if !coin {
                coin_hidden_at = Some(effective);
            }
            assert_eq!(hero, effective >= 60);
        }
        assert_eq!(coin_hidden_at, Some(109));
    }

    #[test]
    fn oversized_region_hides_everything_below_it() {
        let registry = RegionRegistry::from_specs([
            RegionSpec::new("header", Anchor::Top, 120).with_size(40),
            RegionSpec::new("hero", Anchor::Top, 99).with_min_spacing(500),
            RegionSpec::new("footer", Anchor::Bottom, 1).with_size(40),
        ])
        .unwrap();
        let metrics = ViewportMetrics::unobstructed(390, 300);
        let layout = resolve(&registry, &BreakpointTier::COMPACT, &metrics);

        assert!(layout.get("header").unwrap().visible);
        let hero = layout.get("hero").unwrap();
        assert!(!hero.visible);
        assert_eq!((hero.offset, hero.reserved_spacing), (0, 0));
        assert!(!layout.get("footer").unwrap().visible);
        assert_eq!(layout.reserved_top(), 40);
        assert_eq!(layout.reserved_bottom(), 0);
    }

    #[test]
    fn disabled_region_does_not_cut_the_priority_prefix() {
        let registry = RegionRegistry::from_specs([
            RegionSpec::new("header", Anchor::Top, 10).with_size(40),
            RegionSpec::new("promo", Anchor::Top, 8)
                .with_size(30)
                .with_enabled(false),
            RegionSpec::new("footer", Anchor::Bottom, 5).with_size(40),
        ])
        .unwrap();
        let layout = resolve(
            &registry,
            &BreakpointTier::COMPACT,
            &ViewportMetrics::unobstructed(390, 80),
        );

        assert!(layout.get("header").unwrap().visible);
        assert!(!layout.get("promo").unwrap().visible);
        assert!(layout.get("footer").unwrap().visible);
    }

    #[test]
    fn disabled_tier_override_hides_region() {
        let registry = RegionRegistry::from_specs([RegionSpec::new("coin", Anchor::Bottom, 5)
            .with_size(40)
            .with_override(
                BreakpointTier::WIDE,
                RegionOverride::default().enabled(false),
            )])
        .unwrap();
        let metrics = ViewportMetrics::unobstructed(1440, 900);

        assert!(!resolve(&registry, &BreakpointTier::WIDE, &metrics).geometries[0].visible);
        assert!(resolve(&registry, &BreakpointTier::REGULAR, &metrics).geometries[0].visible);
    }

    #[test]
    fn empty_registry_yields_empty_layout() {
        let layout = resolve(
            &RegionRegistry::new(),
            &BreakpointTier::REGULAR,
            &ViewportMetrics::unobstructed(800, 600),
        );
        assert!(layout.geometries.is_empty());
        assert_eq!(layout.reserved_top(), 0);
    }

    #[test]
    fn resolve_is_idempotent() {
        let registry = mobile_stack();
        let metrics = ViewportMetrics::new(390, 700, 380, 320);
        let first = resolve(&registry, &BreakpointTier::COMPACT, &metrics);
        let second = resolve(&registry, &BreakpointTier::COMPACT, &metrics);
        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());

        let other = resolve(
            &registry,
            &BreakpointTier::COMPACT,
            &ViewportMetrics::new(390, 700, 381, 319),
        );
        assert_ne!(first.fingerprint(), other.fingerprint());
    }
}
