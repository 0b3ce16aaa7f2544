//! Image presets and their placeholder renders.
//!
//! Each preset carries a default ratio and an ordered list of placeholder
//! image URLs. Simulated renders pick placeholders by index, so the same
//! preset and count always produce the same result set.

use serde::Serialize;

use crate::generation::Ratio;

/// A selectable image preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub ratio: Ratio,
}

/// Preset used when a lookup misses.
pub const DEFAULT_PRESET_ID: &str = "ioh_sunset";

/// Built-in presets, in display order.
pub const PRESETS: &[Preset] = &[
    Preset {
        id: "ioh_sunset",
        name: "IOH Sunset Poster",
        description: "Warm gradient / promo",
        ratio: Ratio::Portrait,
    },
    Preset {
        id: "promo_card",
        name: "Promo Card",
        description: "Square product highlight",
        ratio: Ratio::Square,
    },
    Preset {
        id: "banner_land",
        name: "Landing Banner",
        description: "Wide campaign banner",
        ratio: Ratio::Wide,
    },
];

const SUNSET_PLACEHOLDERS: &[&str] = &[
    "https://images.unsplash.com/photo-1500530855697-b586d89ba3ee?q=80&w=1080&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1500534314209-a25ddb2bd429?q=80&w=1080&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1472214103451-9374bd1c798e?q=80&w=1080&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1470770841072-f978cf4d019e?q=80&w=1080&auto=format&fit=crop",
];

const PROMO_PLACEHOLDERS: &[&str] = &[
    "https://images.unsplash.com/photo-1510557880182-3d4d3cba35a5?q=80&w=1080&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1517336714731-489689fd1ca8?q=80&w=1080&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1498050108023-c5249f4df085?q=80&w=1080&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1523275335684-37898b6baf30?q=80&w=1080&auto=format&fit=crop",
];

const BANNER_PLACEHOLDERS: &[&str] = &[
    "https://images.unsplash.com/photo-1507525428034-b723cf961d3e?q=80&w=1080&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1526779259212-939e64788e3c?q=80&w=1080&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1500534314209-a25ddb2bd429?q=80&w=1080&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1496386261271-4f0d1dcd9b46?q=80&w=1080&auto=format&fit=crop",
];

/// Generic placeholders used for copy jobs (one image per job).
pub const COPY_PLACEHOLDERS: &[&str] = &[
    "https://images.unsplash.com/photo-1500530855697-b586d89ba3ee?q=80&w=1080&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1507525428034-b723cf961d3e?q=80&w=1080&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1510557880182-3d4d3cba35a5?q=80&w=1080&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1517336714731-489689fd1ca8?q=80&w=1080&auto=format&fit=crop",
];

/// Look up a preset by id.
pub fn find_preset(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// Placeholder URLs for a preset id, falling back to the default preset.
pub fn placeholders_for(preset_id: &str) -> &'static [&'static str] {
    match preset_id {
        "promo_card" => PROMO_PLACEHOLDERS,
        "banner_land" => BANNER_PLACEHOLDERS,
        _ => SUNSET_PLACEHOLDERS,
    }
}

/// The first `count` placeholders for a preset.
///
/// Every catalogue holds [`crate::generation::MAX_COUNT`] entries, so any
/// clamped count is satisfiable.
pub fn pick_placeholders(preset_id: &str, count: u8) -> Vec<String> {
    placeholders_for(preset_id)
        .iter()
        .take(usize::from(count))
        .map(|s| s.to_string())
        .collect()
}

/// A copy placeholder chosen by `index` (wrapping).
pub fn copy_placeholder(index: usize) -> String {
    COPY_PLACEHOLDERS[index % COPY_PLACEHOLDERS.len()].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::MAX_COUNT;

    #[test]
    fn every_preset_has_a_full_catalogue() {
        for preset in PRESETS {
            assert_eq!(
                placeholders_for(preset.id).len(),
                usize::from(MAX_COUNT),
                "preset {}",
                preset.id
            );
        }
    }

    #[test]
    fn pick_is_deterministic_by_index() {
        let a = pick_placeholders("promo_card", 2);
        let b = pick_placeholders("promo_card", 2);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0], PROMO_PLACEHOLDERS[0]);
    }

    #[test]
    fn unknown_preset_falls_back_to_default() {
        assert_eq!(placeholders_for("nope"), placeholders_for(DEFAULT_PRESET_ID));
        assert!(find_preset("nope").is_none());
    }

    #[test]
    fn presets_carry_ratios() {
        assert_eq!(find_preset("banner_land").map(|p| p.ratio), Some(Ratio::Wide));
        assert_eq!(find_preset("promo_card").map(|p| p.ratio), Some(Ratio::Square));
    }

    #[test]
    fn copy_placeholder_wraps() {
        assert_eq!(copy_placeholder(0), copy_placeholder(COPY_PLACEHOLDERS.len()));
    }
}
