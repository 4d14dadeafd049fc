//! Estimated Shannon entropy per signal category.

/// Bits of entropy a signal category is assumed to carry. Order matters:
/// partial matches resolve to the first key that overlaps.
pub const SIGNAL_ENTROPY: &[(&str, f64)] = &[
    ("webgl_renderer", 12.5),
    ("webgl_vendor", 8.2),
    ("canvas_text", 15.3),
    ("canvas_geometry", 14.8),
    ("canvas_gradient", 13.2),
    ("audio_hash", 11.4),
    ("fonts_list", 10.7),
    ("fpjs_visitor_id", 33.0),
    ("screen_resolution", 6.5),
    ("timezone", 5.8),
    ("languages", 4.2),
    ("user_agent", 9.5),
    ("platform", 3.8),
    ("hardware_concurrency", 4.1),
    ("device_memory", 3.5),
    ("color_depth", 2.1),
    ("pixel_ratio", 3.2),
    ("do_not_track", 0.8),
    ("cookie_enabled", 0.3),
    ("local_storage", 0.2),
    ("session_storage", 0.2),
    ("indexed_db", 0.2),
    ("touch_support", 2.8),
    ("max_touch_points", 2.5),
    ("webdriver", 0.1),
    ("color_scheme", 1.0),
    ("reduced_motion", 0.5),
];

pub const DEFAULT_ENTROPY: f64 = 5.0;

/// Roughly log2 of the world population; a fingerprint carrying this many
/// bits is unique among everyone.
pub const FULL_UNIQUENESS_BITS: f64 = 33.0;

fn normalize(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_ascii_lowercase() || c == '_' { c } else { '_' })
        .collect()
}

/// Entropy estimate for a signal category. Never fails: exact match, then
/// first overlapping key, then [`DEFAULT_ENTROPY`].
pub fn estimate_entropy(name: &str) -> f64 {
    let normalized = normalize(name);
    if let Some((_, bits)) = SIGNAL_ENTROPY.iter().find(|(key, _)| *key == normalized) {
        return *bits;
    }
    SIGNAL_ENTROPY
        .iter()
        .find(|(key, _)| normalized.contains(key) || key.contains(normalized.as_str()))
        .map(|(_, bits)| *bits)
        .unwrap_or(DEFAULT_ENTROPY)
}

/// Map total bits onto 0..=100, saturating at [`FULL_UNIQUENESS_BITS`].
pub fn entropy_to_score(bits: f64) -> u8 {
    let ratio = (bits.max(0.0) / FULL_UNIQUENESS_BITS).min(1.0);
    (ratio * 100.0).round() as u8
}

/// Population size in which a fingerprint with `bits` of entropy is expected
/// to be unique.
pub fn estimate_population_size(bits: f64) -> f64 {
    2f64.powf(bits)
}
