/// Application configuration and constants.
use std::fs;
use std::io;
use std::path::PathBuf;

pub struct Config {
    /// Main loop tick rate in milliseconds (target 60 FPS = ~16ms)
    pub tick_rate_ms: u64,

    /// How many ticks to show status messages (180 = ~3s at 60fps)
    pub status_timeout_ticks: u64,

    /// Lines to scroll per key press
    pub scroll_step: usize,

    /// Width of the sidebar in characters
    pub sidebar_width: u16,

    /// Backend base path for chat endpoints
    pub api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_ms: 16,
            status_timeout_ticks: 180,
            scroll_step: 3,
            sidebar_width: 30,
            api_base: crate::api::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Global commands list
pub const COMMANDS: &[(&str, &str)] = &[
    ("/general", "Switch to general chat"),
    ("/price", "Switch to price comparison"),
    ("/nearby", "Switch to nearby stores"),
    ("/locate", "Set location (no arg = auto-detect)"),
    ("/range", "Set distance range: /range <min> <max>"),
    ("/key", "Show or set the API key"),
    ("/clear", "Clear the chat"),
    ("/help", "Show available commands"),
    ("/quit", "Exit pricechat"),
];

/// Map an IANA timezone name to the country code used for price localization.
/// Same heuristic the price backend expects: Indian timezones get "IN",
/// everything else falls back to "US".
pub fn country_for_timezone(timezone: &str) -> &'static str {
    if timezone.contains("Calcutta") || timezone.contains("Kolkata") || timezone.contains("India") {
        "IN"
    } else {
        "US"
    }
}

pub fn detect_country() -> &'static str {
    match iana_time_zone::get_timezone() {
        Ok(tz) => country_for_timezone(&tz),
        Err(_) => "US",
    }
}

/// Single persisted key/value entry holding the optional backend API key.
/// Read once on startup, written whenever the user changes it.
pub struct ApiKeyStore {
    path: PathBuf,
}

impl ApiKeyStore {
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self { path: base.join("pricechat").join("api_key") }
    }

    #[cfg(test)]
    fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Option<String> {
        let key = fs::read_to_string(&self.path).ok()?;
        let key = key.trim().to_string();
        if key.is_empty() { None } else { Some(key) }
    }

    pub fn save(&self, key: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, key.trim())
    }
}
