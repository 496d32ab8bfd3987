// Application settings
// Loaded from ~/.config/streamgrid/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Grid geometry
    #[serde(rename = "grid.rowHeight")]
    pub row_height: u32,

    #[serde(rename = "grid.headerHeight")]
    pub header_height: u32,

    #[serde(rename = "grid.overscan")]
    pub overscan: usize,

    #[serde(rename = "grid.defaultColumnWidth")]
    pub default_column_width: u32,

    // Export
    #[serde(rename = "export.delimiter")]
    pub export_delimiter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            row_height: 24,
            header_height: 32,
            overscan: 5,
            default_column_width: 120,
            export_delimiter: ",".to_string(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("streamgrid");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file();
            return settings;
        }

        match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) => {
                eprintln!("Error reading settings.json: {}", e);
                Self::default()
            }
        }
    }

    /// Parse settings text, tolerating `//` comment lines.
    fn parse(contents: &str) -> Self {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        match serde_json::from_str(&cleaned) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Error parsing settings.json: {}", e);
                eprintln!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path();

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(&path, json).map_err(|e| e.to_string())
    }

    /// The export delimiter as a single byte, falling back to a comma for
    /// multi-character or empty strings.
    pub fn export_delimiter_byte(&self) -> u8 {
        let bytes = self.export_delimiter.as_bytes();
        if bytes.len() == 1 {
            bytes[0]
        } else if self.export_delimiter == "\\t" {
            b'\t'
        } else {
            b','
        }
    }

    /// Create default settings file with comments
    fn create_default_file(&self) {
        let path = Self::config_path();

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Grid geometry (pixels)
    "grid.rowHeight": 24,
    "grid.headerHeight": 32,
    "grid.overscan": 5,
    "grid.defaultColumnWidth": 120,

    // Export ("," ";" "|" or "\t")
    "export.delimiter": ","
}
"#;

        if let Err(e) = fs::write(&path, default_config) {
            eprintln!("Error writing default settings.json: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_comment_lines() {
        let contents = r#"{
    // grid geometry
    "grid.rowHeight": 40,
    "export.delimiter": ";"
}"#;
        let settings = Settings::parse(contents);
        assert_eq!(settings.row_height, 40);
        assert_eq!(settings.export_delimiter, ";");
        // untouched keys keep defaults
        assert_eq!(settings.overscan, 5);
    }

    #[test]
    fn test_parse_garbage_falls_back_to_defaults() {
        let settings = Settings::parse("not json at all");
        assert_eq!(settings.row_height, Settings::default().row_height);
    }

    #[test]
    fn test_delimiter_byte() {
        let mut settings = Settings::default();
        assert_eq!(settings.export_delimiter_byte(), b',');
        settings.export_delimiter = "\\t".to_string();
        assert_eq!(settings.export_delimiter_byte(), b'\t');
        settings.export_delimiter = "||".to_string();
        assert_eq!(settings.export_delimiter_byte(), b',', "multi-char falls back");
    }
}
