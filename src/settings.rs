use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::fs::File;

use crate::constants::{
    DEFAULT_CENTER_LAT, DEFAULT_CENTER_LNG, DEFAULT_MAX_DISTANCE_KM, DEFAULT_PORT, GEOCODE_URL,
    SEED_MARKER_COUNT,
};
use crate::geo::LatLng;

pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub port: u16,
    pub api_key: String,
    pub geocode_url: String,
    pub center_lat: f64,
    pub center_lng: f64,
    pub seed_markers: usize,
    pub max_distance_km: f64,
    pub auto_open_browser: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_key: String::new(),
            geocode_url: GEOCODE_URL.to_string(),
            center_lat: DEFAULT_CENTER_LAT,
            center_lng: DEFAULT_CENTER_LNG,
            seed_markers: SEED_MARKER_COUNT,
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            auto_open_browser: false,
        }
    }
}

impl Settings {
    /// Loads `estate_map.ini` next to the executable, then applies the
    /// `GOOGLE_MAPS_API_KEY` override.
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::config_path())?;
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                settings.api_key = key.trim().to_string();
            }
        }
        Ok(settings)
    }

    /// Reads `key = value` lines. Missing file or unparsable values keep defaults.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut settings = Settings::default();
        if !config_path.exists() {
            return Ok(settings);
        }

        let file = File::open(config_path).context("Failed to open config file")?;
        let reader = BufReader::new(file);
        let mut config_map = HashMap::new();

        for line in reader.lines() {
            let line = line.context("Failed to read line from config")?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config_map.insert(key.trim().to_string(), value.trim().trim_matches('"').to_string());
            }
        }

        if let Some(port) = config_map.get("port").and_then(|v| v.parse::<u16>().ok()) {
            settings.port = port;
        }
        if let Some(api_key) = config_map.get("api_key") {
            settings.api_key = api_key.clone();
        }
        if let Some(url) = config_map.get("geocode_url").filter(|v| !v.is_empty()) {
            settings.geocode_url = url.clone();
        }
        if let Some(lat) = config_map.get("center_lat").and_then(|v| v.parse::<f64>().ok()) {
            settings.center_lat = lat;
        }
        if let Some(lng) = config_map.get("center_lng").and_then(|v| v.parse::<f64>().ok()) {
            settings.center_lng = lng;
        }
        if let Some(count) = config_map.get("seed_markers").and_then(|v| v.parse::<usize>().ok()) {
            settings.seed_markers = count;
        }
        if let Some(km) = config_map
            .get("max_distance_km")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|km| km.is_finite() && *km >= 0.0)
        {
            settings.max_distance_km = km;
        }
        if let Some(auto_open) = config_map.get("auto_open_browser").and_then(|v| v.parse::<bool>().ok()) {
            settings.auto_open_browser = auto_open;
        }

        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Creating config directory")?;
        }

        let mut content = String::new();
        content.push_str("# EstateMap Configuration File\n");
        content.push_str(&format!("port = {}\n", self.port));
        content.push_str(&format!("api_key = \"{}\"\n", self.api_key));
        content.push_str(&format!("geocode_url = \"{}\"\n", self.geocode_url));
        content.push_str(&format!("center_lat = {}\n", self.center_lat));
        content.push_str(&format!("center_lng = {}\n", self.center_lng));
        content.push_str(&format!("seed_markers = {}\n", self.seed_markers));
        content.push_str(&format!("max_distance_km = {}\n", self.max_distance_km));
        content.push_str(&format!("auto_open_browser = {}\n", self.auto_open_browser));

        std::fs::write(config_path, content).context("Failed to write to config file")?;
        Ok(())
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(self.center_lat, self.center_lng)
    }

    pub fn config_path() -> PathBuf {
        let mut path = std::env::current_exe()
            .unwrap_or_default()
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .to_path_buf();

        if path.ends_with("target/debug") || path.ends_with("target/release") {
            path.pop();
            path.pop();
        }
        path.push("estate_map.ini");
        path
    }
}
