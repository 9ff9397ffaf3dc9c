//! Uploader configuration

use crate::error::{Result, UplinkError};
use crate::linkmap::RuleSet;
use crate::types::FileKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Uplink home directory: `UPLINK_HOME` if set, else `~/.uplink`.
pub fn uplink_home() -> PathBuf {
    if let Ok(dir) = std::env::var("UPLINK_HOME") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".uplink")
}

/// Log directory under [`uplink_home`].
pub fn logs_dir() -> PathBuf {
    uplink_home().join("logs")
}

/// Create the log directory if needed and return it.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let dir = logs_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Persisted uploader preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UplinkConfig {
    /// Link map text, one `EntityType: pattern` rule per line
    #[serde(default = "default_link_map")]
    pub link_map: String,

    /// Tags applied to newly added files
    #[serde(default = "default_tags")]
    pub default_tags: String,

    /// Attachment field that receives the uploaded file's source path
    #[serde(default = "default_path_field")]
    pub path_field: String,

    /// Per-lookup timeout for directory clients
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,

    /// Thumbnail command for still images
    #[serde(default = "default_image_command")]
    pub image_command: String,

    /// Thumbnail command for movies
    #[serde(default = "default_movie_command")]
    pub movie_command: String,
}

fn default_link_map() -> String {
    "Asset: /job_root/*/assets/$sg_asset_type/${code}\n\
     Task: /job_root/*/shots/$entity.Shot.code/${content}\n"
        .to_string()
}

fn default_tags() -> String {
    "to_be_filed".to_string()
}

fn default_path_field() -> String {
    "sg_path_to_file".to_string()
}

fn default_lookup_timeout() -> u64 {
    30
}

fn default_image_command() -> String {
    "convert $in $out".to_string()
}

fn default_movie_command() -> String {
    "ffmpeg -y -i $in -f mjpeg -ss $offset -vframes 1 -s svga -an $out".to_string()
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            link_map: default_link_map(),
            default_tags: default_tags(),
            path_field: default_path_field(),
            lookup_timeout_secs: default_lookup_timeout(),
            image_command: default_image_command(),
            movie_command: default_movie_command(),
        }
    }
}

impl UplinkConfig {
    /// `config.toml` in [`uplink_home`].
    pub fn default_path() -> PathBuf {
        uplink_home().join("config.toml")
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: UplinkConfig =
            toml::from_str(&content).map_err(|e| UplinkError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| UplinkError::Config(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Compile the link map. Bad lines become warnings on the result.
    pub fn rules(&self) -> RuleSet {
        RuleSet::parse(&self.link_map)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

impl FileKind {
    /// Thumbnail command template for this kind; `None` for files that get
    /// no thumbnail.
    pub fn thumbnail_command<'c>(&self, config: &'c UplinkConfig) -> Option<&'c str> {
        match self {
            FileKind::Image => Some(config.image_command.as_str()),
            FileKind::Motion => Some(config.movie_command.as_str()),
            FileKind::Other => None,
        }
    }
}

/// Fill in `$in`, `$out` and `$offset`, each wrapped in double quotes.
pub fn expand_thumbnail_command(template: &str, input: &str, output: &str, offset: &str) -> String {
    template
        .replace("$in", &format!("\"{}\"", input))
        .replace("$out", &format!("\"{}\"", output))
        .replace("$offset", &format!("\"{}\"", offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = UplinkConfig::default();
        assert_eq!(config.default_tags, "to_be_filed");
        assert_eq!(config.path_field, "sg_path_to_file");
        assert_eq!(config.lookup_timeout(), Duration::from_secs(30));

        let rules = config.rules();
        assert_eq!(rules.len(), 2);
        assert!(rules.warnings().is_empty());
        assert_eq!(rules.entity_types(), vec!["Asset", "Task"]);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: UplinkConfig = toml::from_str("default_tags = \"review\"\n").unwrap();
        assert_eq!(config.default_tags, "review");
        assert_eq!(config.movie_command, default_movie_command());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = UplinkConfig {
            link_map: "Shot: /shows/*/$code\n".to_string(),
            lookup_timeout_secs: 5,
            ..UplinkConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = UplinkConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let loaded = UplinkConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, UplinkConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "lookup_timeout_secs = \"soon\"").unwrap();
        assert!(matches!(
            UplinkConfig::load(&path),
            Err(UplinkError::Config(_))
        ));
    }

    #[test]
    fn test_home_override_drives_paths() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("uplink-home");
        std::env::set_var("UPLINK_HOME", &home);

        assert_eq!(UplinkConfig::default_path(), home.join("config.toml"));
        let logs = ensure_logs_dir().unwrap();
        assert_eq!(logs, home.join("logs"));
        assert!(logs.is_dir());

        std::env::remove_var("UPLINK_HOME");
    }

    #[test]
    fn test_thumbnail_command_expansion() {
        let config = UplinkConfig::default();
        let template = FileKind::Motion.thumbnail_command(&config).unwrap();
        let cmd = expand_thumbnail_command(template, "/a/take one.mov", "/tmp/t.jpg", "12");
        assert_eq!(
            cmd,
            "ffmpeg -y -i \"/a/take one.mov\" -f mjpeg -ss \"12\" -vframes 1 -s svga -an \"/tmp/t.jpg\""
        );
        assert_eq!(
            FileKind::Image.thumbnail_command(&config),
            Some("convert $in $out")
        );
        assert!(FileKind::Other.thumbnail_command(&config).is_none());
    }
}
