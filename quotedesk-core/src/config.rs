//! Configuration management for quotedesk

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub image: ImageStyle,
    pub upload: UploadConfig,
    pub editor: EditorConfig,
}

/// Display constraints applied to every rendered image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageStyle {
    pub max_width_px: u32,
    pub max_height_px: u32,
    pub object_fit: String,
    pub border_radius_px: u32,
    pub margin_px: u32,
    pub border: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub bucket: String,
    pub max_bytes: u64,
    /// Content types must start with this prefix
    pub accept_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub placeholder: String,
    pub rows: u16,
    pub palette: Vec<String>,
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            max_width_px: 120,
            max_height_px: 80,
            object_fit: "cover".to_string(),
            border_radius_px: 6,
            margin_px: 4,
            border: "1px solid #e5e7eb".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            bucket: "quote-item-images".to_string(),
            max_bytes: 5 * 1024 * 1024,
            accept_prefix: "image/".to_string(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            placeholder: "Enter description...".to_string(),
            rows: 6,
            palette: [
                "#000000", "#374151", "#6B7280", "#DC2626", "#EA580C", "#D97706", "#65A30D",
                "#059669", "#0891B2", "#2563EB", "#7C3AED", "#C026D3",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

impl ImageStyle {
    /// Inline CSS for an `<img>` element
    pub fn css(&self) -> String {
        format!(
            "max-width: {}px; max-height: {}px; object-fit: {}; border-radius: {}px; margin: {}px; border: {};",
            self.max_width_px,
            self.max_height_px,
            self.object_fit,
            self.border_radius_px,
            self.margin_px,
            self.border
        )
    }
}

impl UploadConfig {
    /// Human-readable size limit, e.g. "5MB" or "5.5MB"
    pub fn max_size_label(&self) -> String {
        const KIB: u64 = 1024;
        const MIB: u64 = 1024 * KIB;

        let (unit, suffix) = if self.max_bytes >= MIB {
            (MIB, "MB")
        } else {
            (KIB, "KB")
        };
        if self.max_bytes % unit == 0 {
            format!("{}{}", self.max_bytes / unit, suffix)
        } else {
            format!("{:.1}{}", self.max_bytes as f64 / unit as f64, suffix)
        }
    }
}

impl Config {
    /// Get the platform-specific config file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "quotedesk")
            .map(|proj_dirs| proj_dirs.config_dir().join("quotedesk.toml"))
    }

    /// Load configuration from the platform config file, falling back to defaults if missing
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        // Check config file permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat config file: {}", path.display()))?;
            if metadata.permissions().mode() & 0o002 != 0 {
                anyhow::bail!(
                    "Config file {} is world-writable (insecure permissions)",
                    path.display()
                );
            }
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.upload.bucket.is_empty(), "upload.bucket must not be empty");
        anyhow::ensure!(self.upload.max_bytes > 0, "upload.max_bytes must be positive");
        anyhow::ensure!(self.editor.rows > 0, "editor.rows must be positive");
        Ok(())
    }
}
