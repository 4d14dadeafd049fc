use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::core::bundle::SignalBundle;
use crate::core::types::{Level, RankedSignal, SignalObservation, UniquenessAnalysis, UniquenessBand};
use crate::pipeline::entropy::{entropy_to_score, estimate_entropy};
use crate::pipeline::rarity::{number_key, value_rarity};

const RANKED_LEN: usize = 5;

/// Signal groups reported in `categoryScores`.
pub const CATEGORY_GROUPS: &[(&str, &[&str])] = &[
    ("canvas", &["canvas_text", "canvas_geometry", "canvas_gradient"]),
    ("webgl", &["webgl_vendor", "webgl_renderer", "webgl_extensions"]),
    (
        "hardware",
        &[
            "screen_resolution",
            "hardware_concurrency",
            "device_memory",
            "pixel_ratio",
            "color_depth",
        ],
    ),
    (
        "browser",
        &["platform", "language", "browser_name", "browser_version"],
    ),
    ("network", &["timezone", "webrtc_local_ips"]),
];

fn observe(signal: &str, value: Value, entropy: f64, rarity: u8) -> SignalObservation {
    SignalObservation {
        signal: signal.to_string(),
        value,
        entropy,
        rarity,
    }
}

/// Every signal the uniqueness score is built from, in a fixed order.
pub fn collect_observations(bundle: &SignalBundle) -> Vec<SignalObservation> {
    let hw = &bundle.hardware;
    let screen = &hw.screen;
    let nav = &bundle.navigator;
    let browser = &bundle.parsed_ua.browser;
    let mut obs = Vec::with_capacity(24);

    // Canvas renders are close to unique per device.
    obs.push(observe(
        "canvas_text",
        json!(bundle.canvas.text_hash),
        estimate_entropy("canvas_text"),
        90,
    ));
    obs.push(observe(
        "canvas_geometry",
        json!(bundle.canvas.geometry_hash),
        estimate_entropy("canvas_geometry"),
        88,
    ));
    obs.push(observe(
        "canvas_gradient",
        json!(bundle.canvas.gradient_hash),
        estimate_entropy("canvas_gradient"),
        85,
    ));

    obs.push(observe(
        "webgl_vendor",
        json!(bundle.webgl.vendor),
        estimate_entropy("webgl_vendor"),
        75,
    ));
    obs.push(observe(
        "webgl_renderer",
        json!(bundle.webgl.renderer),
        estimate_entropy("webgl_renderer"),
        value_rarity("webgl_renderer", &bundle.webgl.renderer),
    ));
    obs.push(observe(
        "webgl_extensions",
        json!(bundle.webgl.extensions.len()),
        6.5,
        50,
    ));

    obs.push(observe(
        "audio_hash",
        json!(bundle.audio.hash),
        estimate_entropy("audio_hash"),
        80,
    ));

    let fonts_rarity = match bundle.fonts.count {
        c if c > 100 => 30,
        c if c > 50 => 50,
        _ => 70,
    };
    obs.push(observe(
        "fonts_count",
        json!(bundle.fonts.count),
        estimate_entropy("fonts_list"),
        fonts_rarity,
    ));

    let resolution = screen.resolution();
    obs.push(observe(
        "screen_resolution",
        json!(resolution),
        estimate_entropy("screen_resolution"),
        value_rarity("screen_resolution", &resolution),
    ));
    obs.push(observe(
        "hardware_concurrency",
        json!(hw.cpu_cores),
        estimate_entropy("hardware_concurrency"),
        value_rarity("hardware_concurrency", &hw.cpu_cores.to_string()),
    ));
    if let Some(memory) = hw.memory.filter(|m| *m != 0.0) {
        obs.push(observe(
            "device_memory",
            json!(memory),
            estimate_entropy("device_memory"),
            value_rarity("device_memory", &number_key(memory)),
        ));
    }
    obs.push(observe(
        "pixel_ratio",
        json!(screen.pixel_ratio),
        estimate_entropy("pixel_ratio"),
        value_rarity("pixel_ratio", &number_key(screen.pixel_ratio)),
    ));
    obs.push(observe(
        "color_depth",
        json!(screen.color_depth),
        estimate_entropy("color_depth"),
        value_rarity("color_depth", &screen.color_depth.to_string()),
    ));

    obs.push(observe(
        "platform",
        json!(nav.platform),
        estimate_entropy("platform"),
        value_rarity("platform", &nav.platform),
    ));
    obs.push(observe(
        "language",
        json!(nav.language),
        estimate_entropy("language"),
        value_rarity("language", &nav.language),
    ));
    obs.push(observe(
        "timezone",
        json!(bundle.misc.timezone),
        estimate_entropy("timezone"),
        value_rarity("timezone", &bundle.misc.timezone),
    ));

    obs.push(observe(
        "browser_name",
        json!(browser.name),
        3.5,
        if browser.name == "Chrome" { 20 } else { 60 },
    ));
    obs.push(observe("browser_version", json!(browser.version), 4.0, 50));

    obs.push(observe(
        "max_touch_points",
        json!(hw.max_touch_points),
        estimate_entropy("max_touch_points"),
        if hw.max_touch_points > 0 { 30 } else { 50 },
    ));

    let local_ips = bundle.webrtc.local_ips.len();
    obs.push(observe(
        "webrtc_local_ips",
        json!(local_ips),
        4.5,
        if local_ips > 0 { 40 } else { 60 },
    ));

    let cameras = bundle.media_devices.cameras;
    obs.push(observe(
        "cameras",
        json!(cameras),
        3.0,
        if cameras == 1 { 20 } else { 50 },
    ));

    if let Some(fpjs) = &bundle.fpjs {
        obs.push(observe("fpjs_visitor_id", json!(fpjs.visitor_id), 33.0, 100));
    }

    obs
}

fn ranked(obs: &SignalObservation) -> RankedSignal {
    RankedSignal {
        signal: obs.signal.clone(),
        rarity: obs.rarity,
        value: obs.value.clone(),
    }
}

fn category_scores(observations: &[SignalObservation]) -> BTreeMap<String, f64> {
    let mut scores = BTreeMap::new();
    for (category, members) in CATEGORY_GROUPS {
        let rarities: Vec<f64> = observations
            .iter()
            .filter(|o| members.contains(&o.signal.as_str()))
            .map(|o| f64::from(o.rarity))
            .collect();
        let mean = rarities.iter().sum::<f64>() / members.len() as f64;
        scores.insert(category.to_string(), mean);
    }
    scores
}

pub fn analyze_uniqueness(bundle: &SignalBundle) -> UniquenessAnalysis {
    let observations = collect_observations(bundle);

    let total_entropy: f64 = observations.iter().map(|o| o.entropy).sum();
    let avg_rarity = if observations.is_empty() {
        0.0
    } else {
        observations.iter().map(|o| f64::from(o.rarity)).sum::<f64>() / observations.len() as f64
    };
    let blended = (f64::from(entropy_to_score(total_entropy)) + avg_rarity) / 2.0;
    let overall_score = blended.round().clamp(0.0, 100.0) as u8;

    // sort_by is stable, so ties keep observation order
    let mut by_rarity: Vec<&SignalObservation> = observations.iter().collect();
    by_rarity.sort_by(|a, b| b.rarity.cmp(&a.rarity));

    let rarest_signals = by_rarity.iter().take(RANKED_LEN).map(|o| ranked(o)).collect();
    let common_signals = by_rarity
        .iter()
        .rev()
        .take(RANKED_LEN)
        .map(|o| ranked(o))
        .collect();

    tracing::debug!(
        signals = observations.len(),
        total_entropy,
        overall_score,
        "uniqueness scored"
    );

    UniquenessAnalysis {
        overall_score,
        entropy: total_entropy,
        bits_of_entropy: total_entropy,
        rarest_signals,
        common_signals,
        category_scores: category_scores(&observations),
    }
}

pub fn interpret_uniqueness_score(score: u8) -> UniquenessBand {
    let (level, description, trackability) = match score {
        90.. => (
            "Extremely unique",
            "Your device has a very rare combination of characteristics. It can be singled out among millions of users.",
            Level::VeryHigh,
        ),
        75..=89 => (
            "Very unique",
            "Your fingerprint contains many rare signals. You are easy to track.",
            Level::High,
        ),
        50..=74 => (
            "Moderately unique",
            "Your device has an average level of uniqueness. Some characteristics make you recognizable.",
            Level::Medium,
        ),
        25..=49 => (
            "Slightly unique",
            "Your characteristics are fairly common. Tracking you is harder, but still possible.",
            Level::Low,
        ),
        _ => (
            "Mass-market device",
            "Your device looks like millions of others. That is good for privacy, but can also point to anti-fingerprinting tools.",
            Level::VeryLow,
        ),
    };
    UniquenessBand {
        level: level.to_string(),
        description: description.to_string(),
        trackability,
    }
}
