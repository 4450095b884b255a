// src/config.rs
use crate::errors::ShelfScanError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub redis_url: String,
    pub bind_addr: String,
    pub analysis_model: String,
    pub enhance_model: String,
    pub max_batch_images: usize,
    pub download_delay: Duration,
    pub session_ttl: Duration,
    pub export_dir: PathBuf,
    pub settings_path: PathBuf,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Reads the process environment, after loading `.env` when present.
    pub fn from_env() -> Result<Self, ShelfScanError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ShelfScanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ShelfScanError::Config("GEMINI_API_KEY must be set".to_string()))?;

        let max_batch_images: usize = parse("MAX_BATCH_IMAGES", &get("MAX_BATCH_IMAGES", "10"))?;
        if max_batch_images == 0 {
            return Err(ShelfScanError::Config(
                "MAX_BATCH_IMAGES must be at least 1".to_string(),
            ));
        }
        let delay_ms: u64 = parse("DOWNLOAD_DELAY_MS", &get("DOWNLOAD_DELAY_MS", "300"))?;
        let session_ttl_secs: u64 = parse("SESSION_TTL_SECS", &get("SESSION_TTL_SECS", "3600"))?;

        Ok(Self {
            gemini_api_key,
            redis_url: get("REDIS_URL", "redis://127.0.0.1:6379"),
            bind_addr: get("BIND_ADDR", "0.0.0.0:8080"),
            analysis_model: get("ANALYSIS_MODEL", "gemini-2.5-flash"),
            enhance_model: get("ENHANCE_MODEL", "gemini-2.5-flash-image"),
            max_batch_images,
            download_delay: Duration::from_millis(delay_ms),
            session_ttl: Duration::from_secs(session_ttl_secs),
            export_dir: PathBuf::from(get("EXPORT_DIR", "exports")),
            settings_path: PathBuf::from(get("SETTINGS_PATH", "reminder_settings.json")),
            static_dir: lookup("STATIC_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, ShelfScanError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ShelfScanError::Config(format!("{} has invalid value '{}': {}", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ShelfScanError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[("GEMINI_API_KEY", "k")]).unwrap();
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.max_batch_images, 10);
        assert_eq!(config.download_delay, Duration::from_millis(300));
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert_eq!(config.analysis_model, "gemini-2.5-flash");
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn api_key_is_required() {
        assert!(matches!(config_from(&[]), Err(ShelfScanError::Config(_))));
        assert!(config_from(&[("GEMINI_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "k"),
            ("MAX_BATCH_IMAGES", "4"),
            ("DOWNLOAD_DELAY_MS", "0"),
            ("SESSION_TTL_SECS", "120"),
            ("STATIC_DIR", "dist"),
        ])
        .unwrap();
        assert_eq!(config.max_batch_images, 4);
        assert_eq!(config.download_delay, Duration::ZERO);
        assert_eq!(config.session_ttl, Duration::from_secs(120));
        assert_eq!(config.static_dir, Some(PathBuf::from("dist")));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = config_from(&[("GEMINI_API_KEY", "k"), ("MAX_BATCH_IMAGES", "ten")]).unwrap_err();
        assert!(err.to_string().contains("MAX_BATCH_IMAGES"));
        assert!(config_from(&[("GEMINI_API_KEY", "k"), ("MAX_BATCH_IMAGES", "0")]).is_err());
    }
}
