/// Application configuration module
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub cache_ttls: CacheTtls,
    pub cache_cleanup_seconds: u64,
    pub evening: EveningWindow,
    pub equipment_file: Option<PathBuf>,
}

/// Lifetime of cached results per calculation kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheTtls {
    pub sun_seconds: u64,
    pub moon_seconds: u64,
    pub planet_seconds: u64,
    pub sun_path_seconds: u64,
}

impl CacheTtls {
    pub fn sun(&self) -> Duration {
        Duration::from_secs(self.sun_seconds)
    }

    pub fn moon(&self) -> Duration {
        Duration::from_secs(self.moon_seconds)
    }

    pub fn planet(&self) -> Duration {
        Duration::from_secs(self.planet_seconds)
    }

    pub fn sun_path(&self) -> Duration {
        Duration::from_secs(self.sun_path_seconds)
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            sun_seconds: 1800,
            moon_seconds: 900,
            planet_seconds: 600,
            sun_path_seconds: 1800,
        }
    }
}

/// Which clock the evening hour is read on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EveningClock {
    Utc,
    /// Standard offset of the resolved timezone
    Local,
}

/// Instant at which evening events are ranked, and how long the night lasts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EveningWindow {
    pub hour: u32,
    pub clock: EveningClock,
    pub night_hours: i64,
}

impl Default for EveningWindow {
    fn default() -> Self {
        Self {
            hour: 20,
            clock: EveningClock::Utc,
            night_hours: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let defaults = CacheTtls::default();
        let cache_ttls = CacheTtls {
            sun_seconds: env_u64("SUN_CACHE_TTL_SECONDS", defaults.sun_seconds),
            moon_seconds: env_u64("MOON_CACHE_TTL_SECONDS", defaults.moon_seconds),
            planet_seconds: env_u64("PLANET_CACHE_TTL_SECONDS", defaults.planet_seconds),
            sun_path_seconds: env_u64("SUN_PATH_CACHE_TTL_SECONDS", defaults.sun_path_seconds),
        };

        let hour = env_u64("EVENING_HOUR", 20);
        if hour > 23 {
            anyhow::bail!("EVENING_HOUR must be 0-23, got {}", hour);
        }
        let clock = match env::var("EVENING_CLOCK").as_deref() {
            Ok("local") => EveningClock::Local,
            Ok("utc") | Err(_) => EveningClock::Utc,
            Ok(other) => anyhow::bail!("EVENING_CLOCK must be 'utc' or 'local', got '{}'", other),
        };
        let evening = EveningWindow {
            hour: hour as u32,
            clock,
            night_hours: env_u64("NIGHT_WINDOW_HOURS", 10).clamp(1, 24) as i64,
        };

        let equipment_file = env::var("EQUIPMENT_FILE").ok().map(PathBuf::from);

        Ok(Self {
            bind_addr,
            cache_ttls,
            cache_cleanup_seconds: env_u64("CACHE_CLEANUP_SECONDS", 300).max(1),
            evening,
            equipment_file,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_u64_falls_back_on_garbage() {
        assert_eq!(env_u64("ASTRO_TEST_UNSET_KEY", 42), 42);
    }

    #[test]
    fn test_default_ttls() {
        let ttls = CacheTtls::default();
        assert_eq!(ttls.moon(), Duration::from_secs(900));
        assert!(ttls.planet() < ttls.sun());
    }
}
