use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

const CONFIG_PATH: &str = "phiplay.ini";

// --- Minimal INI reader ---
#[derive(Debug, Default)]
pub struct SimpleIni {
    sections: HashMap<String, HashMap<String, String>>,
}

impl SimpleIni {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        self.sections.clear();

        let mut current_section: Option<String> = None;

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            // Section header: [SectionName]
            if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
                let name = &line[1..line.len() - 1];
                let section = name.trim().to_string();
                current_section = Some(section.clone());
                self.sections.entry(section).or_default();
                continue;
            }

            // Key/value pair: key=value
            if let Some(eq_idx) = line.find('=') {
                let (key_raw, value_raw) = line.split_at(eq_idx);
                let key = key_raw.trim();
                if key.is_empty() {
                    continue;
                }
                // Skip '=' and trim whitespace from the value.
                let value = value_raw[1..].trim().to_string();
                let section = current_section.clone().unwrap_or_default();
                self.sections
                    .entry(section)
                    .or_default()
                    .insert(key.to_string(), value);
            }
        }

        Ok(())
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section).and_then(|s| s.get(key)).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub display_width: u32,
    pub display_height: u32,
    pub chart_path: String,
    pub illustration_path: String,
    pub assets_dir: String,
    /// User multiplier on top of per-note and per-line scroll speed.
    pub scroll_scale: f32,
    /// Hold re-trigger interval numerator; the interval is this over bpm,
    /// in seconds.
    pub hold_tick_factor: f32,
    /// Lifetime of one click effect, in seconds.
    pub effect_duration: f32,
    /// Gaussian radius applied to the background illustration, in pixels.
    pub background_blur: u32,
    pub show_overlay: bool,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_width: 1280,
            display_height: 720,
            chart_path: "chart.json".to_string(),
            illustration_path: "illustration.png".to_string(),
            assets_dir: "respack".to_string(),
            scroll_scale: 1.0,
            hold_tick_factor: 30.0,
            effect_duration: 0.5,
            background_blur: 40,
            show_overlay: false,
            log_level: LogLevel::Info,
        }
    }
}

// Global, mutable configuration instance.
static CONFIG: std::sync::LazyLock<Mutex<Config>> =
    std::sync::LazyLock::new(|| Mutex::new(Config::default()));

// --- File I/O ---

fn create_default_config_file() -> Result<(), std::io::Error> {
    info!("'{CONFIG_PATH}' not found, creating with default values.");
    let default = Config::default();

    let mut content = String::new();

    content.push_str("[Options]\n");
    content.push_str(&format!("AssetsDir={}\n", default.assets_dir));
    content.push_str(&format!("BackgroundBlur={}\n", default.background_blur));
    content.push_str(&format!("ChartPath={}\n", default.chart_path));
    content.push_str(&format!("DisplayHeight={}\n", default.display_height));
    content.push_str(&format!("DisplayWidth={}\n", default.display_width));
    content.push_str(&format!("EffectDuration={}\n", default.effect_duration));
    content.push_str(&format!("HoldTickFactor={}\n", default.hold_tick_factor));
    content.push_str(&format!(
        "IllustrationPath={}\n",
        default.illustration_path
    ));
    content.push_str(&format!("LogLevel={}\n", default.log_level.as_str()));
    content.push_str(&format!("ScrollScale={}\n", default.scroll_scale));
    content.push_str(&format!(
        "ShowOverlay={}\n",
        if default.show_overlay { "1" } else { "0" }
    ));

    std::fs::write(CONFIG_PATH, content)
}

pub fn load() {
    if !std::path::Path::new(CONFIG_PATH).exists()
        && let Err(e) = create_default_config_file()
    {
        warn!("Failed to create default config file: {e}");
    }

    let mut conf = SimpleIni::new();
    match conf.load(CONFIG_PATH) {
        Ok(()) => {
            // Populate the global CONFIG struct from the file, using default
            // values for any missing keys.
            let mut cfg = CONFIG.lock().unwrap();
            let default = Config::default();

            cfg.display_width = conf
                .get("Options", "DisplayWidth")
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|&v| v > 0)
                .unwrap_or(default.display_width);
            cfg.display_height = conf
                .get("Options", "DisplayHeight")
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|&v| v > 0)
                .unwrap_or(default.display_height);
            cfg.chart_path = conf
                .get("Options", "ChartPath")
                .filter(|v| !v.is_empty())
                .unwrap_or(default.chart_path);
            cfg.illustration_path = conf
                .get("Options", "IllustrationPath")
                .filter(|v| !v.is_empty())
                .unwrap_or(default.illustration_path);
            cfg.assets_dir = conf
                .get("Options", "AssetsDir")
                .filter(|v| !v.is_empty())
                .unwrap_or(default.assets_dir);
            cfg.scroll_scale = conf
                .get("Options", "ScrollScale")
                .and_then(|v| v.parse::<f32>().ok())
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(default.scroll_scale);
            cfg.hold_tick_factor = conf
                .get("Options", "HoldTickFactor")
                .and_then(|v| v.parse::<f32>().ok())
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(default.hold_tick_factor);
            cfg.effect_duration = conf
                .get("Options", "EffectDuration")
                .and_then(|v| v.parse::<f32>().ok())
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(default.effect_duration);
            cfg.background_blur = conf
                .get("Options", "BackgroundBlur")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(default.background_blur);
            cfg.show_overlay = conf
                .get("Options", "ShowOverlay")
                .and_then(|v| v.parse::<u8>().ok())
                .map_or(default.show_overlay, |v| v != 0);
            cfg.log_level = conf
                .get("Options", "LogLevel")
                .and_then(|v| LogLevel::from_str(&v).ok())
                .unwrap_or(default.log_level);
        }
        Err(e) => {
            warn!("Failed to read '{CONFIG_PATH}': {e}. Using default configuration.");
        }
    }
}

pub fn get() -> Config {
    CONFIG.lock().unwrap().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ini_reader_handles_sections_comments_and_whitespace() {
        let dir = std::env::temp_dir().join("phiplay_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("basic.ini");
        std::fs::write(
            &path,
            "; comment\n[Options]\n  DisplayWidth = 1920 \n# another\nScrollScale=1.5\n",
        )
        .unwrap();

        let mut ini = SimpleIni::new();
        ini.load(&path).unwrap();
        assert_eq!(ini.get("Options", "DisplayWidth").as_deref(), Some("1920"));
        assert_eq!(ini.get("Options", "ScrollScale").as_deref(), Some("1.5"));
        assert_eq!(ini.get("Options", "Missing"), None);
        assert_eq!(ini.get("Nope", "DisplayWidth"), None);
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!(LogLevel::from_str("DEBUG"), Ok(LogLevel::Debug));
        assert_eq!(LogLevel::from_str(" trace "), Ok(LogLevel::Trace));
        assert!(LogLevel::from_str("verbose").is_err());
    }

    #[test]
    fn level_filter_mapping_is_exhaustive() {
        assert_eq!(LogLevel::Off.as_level_filter(), log::LevelFilter::Off);
        assert_eq!(LogLevel::Info.as_level_filter(), log::LevelFilter::Info);
        assert_eq!(LogLevel::Trace.as_level_filter(), log::LevelFilter::Trace);
    }
}
