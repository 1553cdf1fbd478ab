//! Configuration loading from environment variables.
//!
//! All values are loaded from `SWAPCORE_*` environment variables with
//! sensible defaults. Invalid values fall back to defaults without
//! crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `SWAPCORE_SWAP_DIR` | `.` | Directory for training-mode swap files |
//! | `SWAPCORE_BACKING` | `mapped`* | Byte movement: `mapped` or `buffered` |
//! | `SWAPCORE_PIN_PRELOAD` | `true` | Pin preload windows while copying |
//! | `SWAPCORE_LOG` | `info` | Log level filter |
//! | `SWAPCORE_LOG_FORMAT` | `json` | Log output: `json` or `pretty` |
//!
//! *`buffered` on platforms without memory mapping.

use std::path::{Path, PathBuf};

use crate::swap::{BackingKind, SwapConfig};
use crate::telemetry::{LogConfig, LogFormat};

/// Effective configuration summary of all loaded values.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub swap_dir: PathBuf,
    pub backing: BackingKind,
    pub pin_preload: bool,
    pub log_level: String,
    pub log_format: LogFormat,
}

/// All configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub swap_dir: PathBuf,
    pub swap: SwapConfig,
    pub log: LogConfig,
}

/// Parse a boolean env var, returning `default` on missing or invalid.
fn parse_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Load the swap device tuning from environment.
fn load_swap_config() -> SwapConfig {
    let backing = match std::env::var("SWAPCORE_BACKING") {
        Ok(val) => match val.to_ascii_lowercase().as_str() {
            "mapped" => BackingKind::Mapped,
            "buffered" => BackingKind::Buffered,
            _ => BackingKind::default(),
        },
        Err(_) => BackingKind::default(),
    };
    let pin_preload = parse_bool("SWAPCORE_PIN_PRELOAD", true);
    SwapConfig { backing, pin_preload }
}

/// Load the logging configuration from environment.
fn load_log_config() -> LogConfig {
    let level = std::env::var("SWAPCORE_LOG").unwrap_or_else(|_| "info".to_string());
    let format = match std::env::var("SWAPCORE_LOG_FORMAT") {
        Ok(val) => match val.to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        },
        Err(_) => LogFormat::Json,
    };
    LogConfig { format, level }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without
/// panicking.
pub fn load() -> EnvConfig {
    let swap_dir = std::env::var("SWAPCORE_SWAP_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));

    EnvConfig {
        swap_dir,
        swap: load_swap_config(),
        log: load_log_config(),
    }
}

impl EnvConfig {
    /// Path for a named swap file inside the configured directory.
    pub fn swap_file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.swap_dir.join(name)
    }

    /// Return a summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            swap_dir: self.swap_dir.clone(),
            backing: self.swap.backing,
            pin_preload: self.swap.pin_preload,
            log_level: self.log.level.clone(),
            log_format: self.log.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid cross-test pollution.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "SWAPCORE_SWAP_DIR",
        "SWAPCORE_BACKING",
        "SWAPCORE_PIN_PRELOAD",
        "SWAPCORE_LOG",
        "SWAPCORE_LOG_FORMAT",
    ];

    fn clear_env_vars() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn test_defaults_are_sensible() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let cfg = load();
        assert_eq!(cfg.swap_dir, PathBuf::from("."));
        assert_eq!(cfg.swap.backing, BackingKind::default());
        assert!(cfg.swap.pin_preload);
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.log.format, LogFormat::Json);
    }

    #[test]
    fn test_env_vars_override_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("SWAPCORE_SWAP_DIR", "/tmp/swaps");
        std::env::set_var("SWAPCORE_BACKING", "buffered");
        std::env::set_var("SWAPCORE_PIN_PRELOAD", "off");
        std::env::set_var("SWAPCORE_LOG", "swapcore=trace");
        std::env::set_var("SWAPCORE_LOG_FORMAT", "pretty");
        let cfg = load();
        assert_eq!(cfg.swap_dir, PathBuf::from("/tmp/swaps"));
        assert_eq!(cfg.swap.backing, BackingKind::Buffered);
        assert!(!cfg.swap.pin_preload);
        assert_eq!(cfg.log.level, "swapcore=trace");
        assert_eq!(cfg.log.format, LogFormat::Pretty);
        clear_env_vars();
    }

    #[test]
    fn test_invalid_env_falls_back_to_default() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("SWAPCORE_BACKING", "telepathic");
        std::env::set_var("SWAPCORE_PIN_PRELOAD", "maybe");
        std::env::set_var("SWAPCORE_LOG_FORMAT", "xml");
        let cfg = load();
        assert_eq!(cfg.swap.backing, BackingKind::default());
        assert!(cfg.swap.pin_preload);
        assert_eq!(cfg.log.format, LogFormat::Json);
        clear_env_vars();
    }

    #[test]
    fn test_backing_values_are_case_insensitive() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("SWAPCORE_BACKING", "Buffered");
        let cfg = load();
        assert_eq!(cfg.swap.backing, BackingKind::Buffered);
        clear_env_vars();
    }

    #[test]
    fn test_swap_file_joins_the_configured_dir() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("SWAPCORE_SWAP_DIR", "/var/cache/model");
        let cfg = load();
        assert_eq!(
            cfg.swap_file("step0.swap"),
            PathBuf::from("/var/cache/model/step0.swap")
        );
        clear_env_vars();
    }

    #[test]
    fn test_effective_config_reflects_loaded_values() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let cfg = load();
        let eff = cfg.effective_config();
        assert_eq!(eff.swap_dir, cfg.swap_dir);
        assert_eq!(eff.backing, cfg.swap.backing);
        assert_eq!(eff.pin_preload, cfg.swap.pin_preload);
        assert_eq!(eff.log_level, cfg.log.level);
        assert_eq!(eff.log_format, cfg.log.format);
    }
}
