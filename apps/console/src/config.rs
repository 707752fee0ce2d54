use std::{collections::HashMap, fs};

/// Where to find the control backend. The default port is the backend's
/// own default listen port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub host: String,
    pub port: Option<u16>,
    pub secure: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: Some(8181),
            secure: false,
        }
    }
}

/// Layering: compiled defaults, then `console.toml` in the working
/// directory, then `LIVE2D_*` environment variables.
pub fn load_settings() -> ConsoleSettings {
    let mut settings = ConsoleSettings::default();

    if let Ok(raw) = fs::read_to_string("console.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            for (key, value) in &file_cfg {
                apply_entry(&mut settings, key, value);
            }
        }
    }

    for key in ["host", "port", "secure"] {
        if let Ok(value) = std::env::var(format!("LIVE2D_{}", key.to_ascii_uppercase())) {
            apply_entry(&mut settings, key, &value);
        }
    }

    settings
}

fn apply_entry(settings: &mut ConsoleSettings, key: &str, value: &str) {
    match key {
        "host" => settings.host = value.trim().to_string(),
        "port" => {
            let value = value.trim();
            if value.eq_ignore_ascii_case("none") {
                settings.port = None;
            } else if let Ok(parsed) = value.parse::<u16>() {
                settings.port = Some(parsed);
            }
        }
        "secure" => {
            if let Some(flag) = parse_flag(value) {
                settings.secure = flag;
            }
        }
        _ => {}
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
