use crate::core::ConfigError;
use crate::fetchers::http_fetcher::DEFAULT_USER_AGENT;
use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

/// Tunables for the fetch-scrape pipeline.
///
/// `rate_limit_calls == 0` or a zero `rate_limit_period` disables rate
/// limiting entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub rate_limit_calls: usize,
    pub rate_limit_period: Duration,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub max_concurrency: usize,
    pub single_flight: bool,
    pub strict_cache: bool,
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
    pub cache_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rate_limit_calls: 1,
            rate_limit_period: Duration::from_secs(1),
            cache_ttl: Duration::from_secs(300),
            fetch_timeout: Duration::from_millis(30_000),
            max_concurrency: 4,
            single_flight: false,
            strict_cache: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
            cache_dir: None,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate_limit(mut self, calls: usize, period: Duration) -> Self {
        self.rate_limit_calls = calls;
        self.rate_limit_period = period;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn with_strict_cache(mut self, strict: bool) -> Self {
        self.strict_cache = strict;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "fetch_timeout must be greater than zero".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("user_agent must not be blank".to_string()));
        }
        Ok(())
    }

    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_vars()
    }

    /// Reads the process environment without touching `.env` files.
    pub fn from_env_vars() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let defaults = Self::default();

        let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason,
        };

        let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
            match lookup(var) {
                Ok(raw) => raw.trim().parse::<u64>().map_err(|e| invalid(var, e.to_string())),
                Err(_) => Ok(default),
            }
        };

        let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
            match lookup(var) {
                Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => Ok(true),
                    "0" | "false" | "no" | "off" => Ok(false),
                    other => Err(invalid(var, format!("`{}` is not a boolean", other))),
                },
                Err(_) => Ok(default),
            }
        };

        let rate_limit_calls =
            parse_u64("RATE_LIMIT_CALLS", defaults.rate_limit_calls as u64)? as usize;

        let rate_limit_period = match lookup("RATE_LIMIT_PERIOD") {
            Ok(raw) => {
                let secs = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| invalid("RATE_LIMIT_PERIOD", e.to_string()))?;
                Duration::try_from_secs_f64(secs)
                    .map_err(|e| invalid("RATE_LIMIT_PERIOD", e.to_string()))?
            }
            Err(_) => defaults.rate_limit_period,
        };

        let cache_ttl = Duration::from_secs(parse_u64(
            "CACHE_EXPIRATION",
            defaults.cache_ttl.as_secs(),
        )?);
        let fetch_timeout = Duration::from_millis(parse_u64(
            "SCRAPE_TIMEOUT",
            defaults.fetch_timeout.as_millis() as u64,
        )?);
        let max_concurrency =
            parse_u64("SCRAPE_MAX_CONCURRENCY", defaults.max_concurrency as u64)? as usize;
        let single_flight = parse_bool("SCRAPE_SINGLE_FLIGHT", defaults.single_flight)?;
        let strict_cache = parse_bool("CACHE_STRICT", defaults.strict_cache)?;
        let user_agent = lookup("SCRAPE_USER_AGENT").unwrap_or(defaults.user_agent);
        let cache_dir = lookup("CACHE_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let config = Self {
            rate_limit_calls,
            rate_limit_period,
            cache_ttl,
            fetch_timeout,
            max_concurrency,
            single_flight,
            strict_cache,
            user_agent,
            headers: defaults.headers,
            cache_dir,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn test_empty_env_gives_defaults() {
        let map = HashMap::new();
        let config = PipelineConfig::from_lookup(lookup_from_map(&map)).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.rate_limit_calls, 1);
        assert_eq!(config.rate_limit_period, Duration::from_secs(1));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.fetch_timeout, Duration::from_millis(30_000));
    }

    #[test]
    fn test_overrides() {
        let map = HashMap::from([
            ("RATE_LIMIT_CALLS", "5"),
            ("RATE_LIMIT_PERIOD", "0.5"),
            ("CACHE_EXPIRATION", "60"),
            ("SCRAPE_TIMEOUT", "1500"),
            ("SCRAPE_MAX_CONCURRENCY", "8"),
            ("SCRAPE_SINGLE_FLIGHT", "true"),
            ("CACHE_STRICT", "1"),
            ("SCRAPE_USER_AGENT", "shelfscraper-test"),
            ("CACHE_DIR", "/tmp/shelf-cache"),
        ]);
        let config = PipelineConfig::from_lookup(lookup_from_map(&map)).unwrap();

        assert_eq!(config.rate_limit_calls, 5);
        assert_eq!(config.rate_limit_period, Duration::from_millis(500));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.fetch_timeout, Duration::from_millis(1500));
        assert_eq!(config.max_concurrency, 8);
        assert!(config.single_flight);
        assert!(config.strict_cache);
        assert_eq!(config.user_agent, "shelfscraper-test");
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/shelf-cache")));
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        for (var, value) in [
            ("RATE_LIMIT_CALLS", "many"),
            ("RATE_LIMIT_PERIOD", "-1"),
            ("SCRAPE_TIMEOUT", "soon"),
            ("CACHE_STRICT", "maybe"),
        ] {
            let map = HashMap::from([(var, value)]);
            let result = PipelineConfig::from_lookup(lookup_from_map(&map));
            assert!(
                matches!(result, Err(ConfigError::InvalidEnvVar { var: ref v, .. }) if v == var),
                "expected InvalidEnvVar({var}), got: {result:?}"
            );
        }
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let map = HashMap::from([("SCRAPE_MAX_CONCURRENCY", "0")]);
        let result = PipelineConfig::from_lookup(lookup_from_map(&map));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_rate_limit_is_allowed() {
        let map = HashMap::from([("RATE_LIMIT_CALLS", "0"), ("RATE_LIMIT_PERIOD", "0")]);
        let config = PipelineConfig::from_lookup(lookup_from_map(&map)).unwrap();
        assert_eq!(config.rate_limit_calls, 0);
        assert!(config.rate_limit_period.is_zero());
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::new()
            .with_rate_limit(2, Duration::from_secs(3))
            .with_single_flight(true)
            .with_header("Accept-Language", "es-CR");
        assert_eq!(config.rate_limit_calls, 2);
        assert!(config.single_flight);
        assert_eq!(config.headers.len(), 1);
        assert!(config.validate().is_ok());
    }
}
