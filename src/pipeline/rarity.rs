//! Illustrative population frequencies for common signal values.
//!
//! These are fixed constants, not telemetry. Anything missing from a table
//! is treated as rare.

pub const UNSEEN_FREQUENCY: f64 = 0.01;

pub const POPULAR_VALUES: &[(&str, &[(&str, f64)])] = &[
    (
        "screen_resolution",
        &[
            ("1920x1080", 0.23),
            ("1366x768", 0.15),
            ("1536x864", 0.08),
            ("2560x1440", 0.07),
            ("1440x900", 0.05),
            ("1280x720", 0.04),
            ("3840x2160", 0.03),
        ],
    ),
    (
        "hardware_concurrency",
        &[
            ("8", 0.28),
            ("4", 0.25),
            ("16", 0.15),
            ("12", 0.10),
            ("6", 0.08),
            ("2", 0.05),
        ],
    ),
    (
        "device_memory",
        &[
            ("8", 0.35),
            ("16", 0.25),
            ("4", 0.20),
            ("32", 0.10),
            ("2", 0.05),
        ],
    ),
    (
        "timezone",
        &[
            ("Europe/Moscow", 0.04),
            ("America/New_York", 0.08),
            ("Europe/London", 0.05),
            ("America/Los_Angeles", 0.04),
            ("Asia/Tokyo", 0.03),
            ("Europe/Paris", 0.02),
            ("Asia/Shanghai", 0.05),
        ],
    ),
    (
        "platform",
        &[
            ("Win32", 0.70),
            ("MacIntel", 0.15),
            ("Linux x86_64", 0.08),
            ("iPhone", 0.04),
            ("Android", 0.02),
        ],
    ),
    (
        "language",
        &[
            ("en-US", 0.35),
            ("ru-RU", 0.04),
            ("de-DE", 0.03),
            ("fr-FR", 0.02),
            ("zh-CN", 0.10),
            ("es-ES", 0.04),
            ("ja", 0.03),
        ],
    ),
    ("color_depth", &[("24", 0.85), ("30", 0.08), ("32", 0.05)]),
    (
        "pixel_ratio",
        &[
            ("1", 0.45),
            ("1.25", 0.15),
            ("1.5", 0.10),
            ("2", 0.25),
            ("1.75", 0.03),
        ],
    ),
];

/// Estimated share of the population reporting `value` for `category`.
/// Exact, case-sensitive match; unknown categories and values are rare.
pub fn frequency_of(category: &str, value: &str) -> f64 {
    POPULAR_VALUES
        .iter()
        .find(|(name, _)| *name == category)
        .and_then(|(_, values)| values.iter().find(|(known, _)| *known == value))
        .map(|(_, freq)| *freq)
        .unwrap_or(UNSEEN_FREQUENCY)
}

/// 0 for a value everyone shares, 100 for one nobody does.
pub fn rarity_of(frequency: f64) -> u8 {
    ((1.0 - frequency) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Rarity of `value` within `category`.
pub fn value_rarity(category: &str, value: &str) -> u8 {
    rarity_of(frequency_of(category, value))
}

/// Render a number the way the collector stringifies it (`8`, `1.25`).
pub fn number_key(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values_use_table_frequency() {
        assert_eq!(frequency_of("screen_resolution", "1920x1080"), 0.23);
        assert_eq!(frequency_of("platform", "Win32"), 0.70);
        assert_eq!(value_rarity("color_depth", "24"), 15);
    }

    #[test]
    fn misses_default_to_rare() {
        assert_eq!(frequency_of("platform", "win32"), UNSEEN_FREQUENCY);
        assert_eq!(frequency_of("webgl_renderer", "anything"), UNSEEN_FREQUENCY);
        assert_eq!(value_rarity("timezone", "Pacific/Chatham"), 99);
    }

    #[test]
    fn rarity_is_strictly_decreasing() {
        assert_eq!(rarity_of(1.0), 0);
        assert_eq!(rarity_of(0.0), 100);
        let mut last = rarity_of(0.0);
        for step in 1..=100 {
            let r = rarity_of(step as f64 / 100.0);
            assert!(r < last, "rarity did not fall at {step}");
            last = r;
        }
    }

    #[test]
    fn every_table_frequency_is_a_share() {
        for (_, values) in POPULAR_VALUES {
            for (_, freq) in *values {
                assert!((0.0..=1.0).contains(freq));
            }
        }
    }

    #[test]
    fn numbers_render_like_the_collector() {
        assert_eq!(number_key(8.0), "8");
        assert_eq!(number_key(1.25), "1.25");
        assert_eq!(value_rarity("pixel_ratio", &number_key(1.0)), 55);
    }
}
