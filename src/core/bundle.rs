use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::ScanError;

/// Every signal the collectors gathered during one scan.
///
/// The engine treats a bundle as read-only: nullable fields stay `None`,
/// sentinel strings such as `"unknown"` or `"error"` stay as they are, and
/// rules inspect them like any other value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignalBundle {
    pub canvas: CanvasFingerprint,
    pub webgl: WebGlFingerprint,
    pub audio: AudioFingerprint,
    pub fonts: FontsInfo,
    pub webrtc: WebRtcLeak,
    pub media_devices: MediaDevicesInfo,
    pub hardware: HardwareInfo,
    pub navigator: NavigatorInfo,
    #[serde(rename = "parsedUA")]
    pub parsed_ua: ParsedUserAgent,
    pub sensors: SensorsInfo,
    pub battery: BatteryInfo,
    pub media_queries: MediaQueriesInfo,
    pub storage: StorageInfo,
    pub performance: PerformanceInfo,
    pub misc: MiscInfo,
    #[serde(default)]
    pub fpjs: Option<FingerprintJsResult>,
    pub timestamp: DateTime<Utc>,
    pub scan_duration: f64,
    pub total_signals: u32,
}

impl SignalBundle {
    pub fn from_json(data: &str) -> Result<Self, ScanError> {
        serde_json::from_str(data).map_err(|e| ScanError::Bundle(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ScanError> {
        serde_json::to_string(self).map_err(ScanError::from)
    }

    /// Lowercased user agent, which most cross-checks compare against.
    pub fn ua_lower(&self) -> String {
        self.navigator.user_agent.to_lowercase()
    }
}

pub fn load_bundle(path: &Path) -> Result<SignalBundle, ScanError> {
    let data = std::fs::read_to_string(path)?;
    SignalBundle::from_json(&data)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanvasFingerprint {
    pub text_hash: String,
    pub geometry_hash: String,
    pub gradient_hash: String,
    pub emoji_hash: String,
    #[serde(rename = "rawDataURL", default)]
    pub raw_data_url: String,
    pub supported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShaderPrecision {
    pub range_min: i32,
    pub range_max: i32,
    pub precision: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebGlFingerprint {
    pub vendor: String,
    pub renderer: String,
    pub extensions: Vec<String>,
    pub max_texture_size: u32,
    pub max_viewport_dims: [u32; 2],
    pub max_anisotropy: Option<f64>,
    pub vertex_shader_precision: Option<ShaderPrecision>,
    pub fragment_shader_precision: Option<ShaderPrecision>,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    pub rendered_hash: String,
    pub supported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioFingerprint {
    pub hash: String,
    pub sample_rate: u32,
    pub max_channel_count: u32,
    pub channel_count: u32,
    pub supported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FontsInfo {
    pub available: Vec<String>,
    pub count: u32,
    pub default_fonts: Vec<String>,
    pub detection_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebRtcLeak {
    #[serde(rename = "localIPs")]
    pub local_ips: Vec<String>,
    #[serde(rename = "publicIP")]
    pub public_ip: Option<String>,
    pub enabled: bool,
    pub stun_server: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaDevicesInfo {
    pub cameras: u32,
    pub microphones: u32,
    pub speakers: u32,
    pub device_labels: Vec<String>,
    pub has_permission: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
    pub avail_width: u32,
    pub avail_height: u32,
    pub color_depth: u32,
    pub pixel_ratio: f64,
    pub orientation: Option<String>,
}

impl ScreenInfo {
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    pub fn shorter_side(&self) -> u32 {
        self.width.min(self.height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpuInfo {
    pub vendor: String,
    pub renderer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HardwareInfo {
    pub cpu_cores: u32,
    /// `navigator.deviceMemory` in GiB, absent on browsers that hide it.
    pub memory: Option<f64>,
    pub screen: ScreenInfo,
    pub max_touch_points: u32,
    pub gpu: GpuInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrandVersion {
    pub brand: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HighEntropyHints {
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub bitness: Option<String>,
    #[serde(default)]
    pub full_version_list: Option<Vec<BrandVersion>>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub platform_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserAgentData {
    pub mobile: bool,
    pub platform: String,
    pub brands: Vec<BrandVersion>,
    pub high_entropy: Option<HighEntropyHints>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavigatorInfo {
    pub user_agent: String,
    pub platform: String,
    pub vendor: String,
    pub language: String,
    pub languages: Vec<String>,
    pub cookie_enabled: bool,
    pub do_not_track: Option<String>,
    pub webdriver: bool,
    pub user_agent_data: Option<UserAgentData>,
    /// Whether `window.chrome` existed on the scanned page.
    #[serde(default = "default_true")]
    pub has_window_chrome: bool,
    /// Names of suspicious globals the collector found on `window`.
    #[serde(default)]
    pub window_globals: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserInfo {
    pub name: String,
    pub version: String,
    pub major: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NameVersion {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceInfo {
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedUserAgent {
    pub browser: BrowserInfo,
    pub os: NameVersion,
    pub device: DeviceInfo,
    pub engine: NameVersion,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorsInfo {
    pub accelerometer: bool,
    pub gyroscope: bool,
    pub device_orientation: bool,
    pub device_motion: bool,
    pub ambient_light: bool,
}

impl SensorsInfo {
    pub fn any_motion_sensor(&self) -> bool {
        self.accelerometer || self.gyroscope || self.device_orientation || self.device_motion
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatteryInfo {
    pub level: f64,
    pub charging: bool,
    pub charging_time: Option<f64>,
    pub discharging_time: Option<f64>,
    pub supported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaQueriesInfo {
    pub prefers_color_scheme: String,
    pub prefers_reduced_motion: bool,
    pub prefers_contrast: String,
    pub color_gamut: String,
    pub forced_colors: bool,
    pub hover: String,
    pub pointer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub local_storage: bool,
    pub session_storage: bool,
    #[serde(rename = "indexedDB")]
    pub indexed_db: bool,
    pub service_worker: bool,
    pub cookies_enabled: bool,
    pub storage_quota: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeapMemory {
    #[serde(rename = "usedJSHeapSize")]
    pub used_js_heap_size: f64,
    #[serde(rename = "totalJSHeapSize")]
    pub total_js_heap_size: f64,
    #[serde(rename = "jsHeapSizeLimit")]
    pub js_heap_size_limit: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInfo {
    pub dom_content_loaded: Option<f64>,
    pub load_complete: Option<f64>,
    pub dom_interactive: Option<f64>,
    pub memory: Option<HeapMemory>,
    pub timing_anomaly: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeechVoice {
    pub lang: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub effective_type: String,
    pub downlink: f64,
    pub rtt: f64,
    pub save_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MiscInfo {
    pub timezone: String,
    /// Minutes, as returned by `Date#getTimezoneOffset`.
    pub timezone_offset: i32,
    pub speech_voices: Vec<SpeechVoice>,
    pub connection: Option<ConnectionInfo>,
    pub plugins: Vec<String>,
    pub pdf_viewer_enabled: bool,
    pub java_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintJsResult {
    pub visitor_id: String,
    #[serde(default)]
    pub components: BTreeMap<String, serde_json::Value>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_round_trips_camel_case_keys() {
        let bundle = fixtures::windows_chrome();
        assert_eq!(bundle.hardware.screen.resolution(), "1920x1080");
        assert_eq!(bundle.parsed_ua.device.device_type, DeviceType::Desktop);
        let json = bundle.to_json().unwrap();
        assert!(json.contains("\"localIPs\""));
        assert!(json.contains("\"parsedUA\""));
        assert!(json.contains("\"rawDataURL\""));
        assert_eq!(SignalBundle::from_json(&json).unwrap(), bundle);
    }

    #[test]
    fn automation_probe_fields_default_when_absent() {
        let mut value: serde_json::Value =
            serde_json::from_str(fixtures::WINDOWS_CHROME).unwrap();
        let nav = value["navigator"].as_object_mut().unwrap();
        nav.remove("hasWindowChrome");
        nav.remove("windowGlobals");
        let bundle: SignalBundle = serde_json::from_value(value).unwrap();
        assert!(bundle.navigator.has_window_chrome);
        assert!(bundle.navigator.window_globals.is_empty());
    }

    #[test]
    fn malformed_json_is_a_bundle_error() {
        let err = SignalBundle::from_json("{\"canvas\": 1}").unwrap_err();
        assert!(matches!(err, ScanError::Bundle(_)));
    }

    #[test]
    fn load_bundle_reads_fixture_from_disk() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/bundles/windows_chrome.json");
        let bundle = load_bundle(&path).unwrap();
        assert_eq!(bundle, fixtures::windows_chrome());
        assert!(matches!(
            load_bundle(Path::new("fixtures/missing.json")),
            Err(ScanError::Io(_))
        ));
    }
}
