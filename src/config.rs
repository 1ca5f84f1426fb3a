use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// Seconds between scheduler ticks. Hourly in production.
    pub job_interval_secs: u64,
    pub on_unsupported_target: UnsupportedTargetPolicy,
}

/// What the scheduled-change executor does with a change that has no
/// concrete target (the unimplemented "global" case).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedTargetPolicy {
    /// Consume the record without applying anything (legacy behavior).
    MarkExecutedNoop,
    /// Leave the record pending for manual handling.
    LeavePending,
    /// Count the record as an execution error, leave it pending.
    Error,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let job_interval_secs = env_map
            .get("JOB_INTERVAL_SECS")
            .map(|s| s.as_str())
            .unwrap_or("3600")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "JOB_INTERVAL_SECS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let on_unsupported_target = match env_map
            .get("ON_UNSUPPORTED_TARGET")
            .map(|s| s.as_str())
            .unwrap_or("mark-executed-noop")
        {
            "mark-executed-noop" => UnsupportedTargetPolicy::MarkExecutedNoop,
            "leave-pending" => UnsupportedTargetPolicy::LeavePending,
            "error" => UnsupportedTargetPolicy::Error,
            other => {
                return Err(ConfigError::InvalidValue(
                    "ON_UNSUPPORTED_TARGET".to_string(),
                    format!(
                        "must be mark-executed-noop, leave-pending, or error, got {}",
                        other
                    ),
                ))
            }
        };

        Ok(Config {
            port,
            database_path,
            job_interval_secs,
            on_unsupported_target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_env() -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("DATABASE_PATH".to_string(), "/tmp/corredora.db".to_string());
        env
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(base_env()).expect("config failed");
        assert_eq!(config.port, 8080);
        assert_eq!(config.job_interval_secs, 3600);
        assert_eq!(
            config.on_unsupported_target,
            UnsupportedTargetPolicy::MarkExecutedNoop
        );
    }

    #[test]
    fn test_missing_database_path_is_error() {
        let err = Config::from_env_map(HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(_)));
    }

    #[test]
    fn test_policy_parsing() {
        let mut env = base_env();
        env.insert(
            "ON_UNSUPPORTED_TARGET".to_string(),
            "leave-pending".to_string(),
        );
        let config = Config::from_env_map(env).expect("config failed");
        assert_eq!(
            config.on_unsupported_target,
            UnsupportedTargetPolicy::LeavePending
        );
    }

    #[test]
    fn test_invalid_policy_is_error() {
        let mut env = base_env();
        env.insert("ON_UNSUPPORTED_TARGET".to_string(), "explode".to_string());
        assert!(matches!(
            Config::from_env_map(env),
            Err(ConfigError::InvalidValue(_, _))
        ));
    }

    #[test]
    fn test_invalid_port_is_error() {
        let mut env = base_env();
        env.insert("PORT".to_string(), "eighty".to_string());
        assert!(matches!(
            Config::from_env_map(env),
            Err(ConfigError::InvalidValue(_, _))
        ));
    }
}
