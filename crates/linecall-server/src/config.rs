//! Server configuration from environment variables.

use std::time::Duration;

use linecall_game::Rules;

/// A configuration value was missing or unparseable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Full server configuration.
///
/// `store_url` and `admin_token` are required and fail startup when
/// absent; everything else has a default. Game rule overrides are
/// clamped by [`Rules::validated`] rather than rejected.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Websocket bind address.
    pub ws_addr: String,
    /// HTTP sidecar bind address.
    pub http_addr: String,
    /// `development` or `production`; controls log verbosity defaults.
    pub environment: String,
    /// Redis URL for the persistence mirror.
    pub store_url: String,
    /// Bearer token guarding the operator room listing.
    pub admin_token: String,
    pub rules: Rules,
    /// Rooms idle longer than this are destroyed.
    pub room_ttl: Duration,
    /// How often the idle sweep runs.
    pub sweep_interval: Duration,
}

impl ServerConfig {
    /// Loads configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any name→value lookup. Split out from
    /// [`from_env`](Self::from_env) so tests don't mutate process env.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Rules::default();
        let rules = Rules {
            grid_size: parse_or(&lookup, "LINECALL_GRID_SIZE", defaults.grid_size)?,
            turn_seconds: parse_or(&lookup, "LINECALL_TURN_SECS", defaults.turn_seconds)?,
            win_lines: parse_or(&lookup, "LINECALL_WIN_LINES", defaults.win_lines)?,
            min_players: defaults.min_players,
            max_players: parse_or(&lookup, "LINECALL_MAX_PLAYERS", defaults.max_players)?,
        }
        .validated();

        Ok(Self {
            ws_addr: lookup("LINECALL_WS_ADDR").unwrap_or_else(|| "0.0.0.0:8080".into()),
            http_addr: lookup("LINECALL_HTTP_ADDR").unwrap_or_else(|| "0.0.0.0:3001".into()),
            environment: lookup("LINECALL_ENV").unwrap_or_else(|| "development".into()),
            store_url: lookup("LINECALL_STORE_URL")
                .ok_or(ConfigError::Missing("LINECALL_STORE_URL"))?,
            admin_token: lookup("LINECALL_ADMIN_TOKEN")
                .ok_or(ConfigError::Missing("LINECALL_ADMIN_TOKEN"))?,
            rules,
            room_ttl: Duration::from_secs(parse_or(
                &lookup,
                "LINECALL_ROOM_TTL_SECS",
                600u64,
            )?),
            sweep_interval: Duration::from_secs(parse_or(
                &lookup,
                "LINECALL_SWEEP_SECS",
                60u64,
            )?),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("LINECALL_STORE_URL", "redis://localhost:6379"),
        ("LINECALL_ADMIN_TOKEN", "secret"),
    ];

    #[test]
    fn test_defaults_with_required_vars() {
        let config = ServerConfig::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert_eq!(config.ws_addr, "0.0.0.0:8080");
        assert_eq!(config.http_addr, "0.0.0.0:3001");
        assert_eq!(config.environment, "development");
        assert!(!config.is_production());
        assert_eq!(config.rules.grid_size, 5);
        assert_eq!(config.room_ttl, Duration::from_secs(600));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_missing_store_url_is_fatal() {
        let err = ServerConfig::from_lookup(lookup_from(&[(
            "LINECALL_ADMIN_TOKEN",
            "secret",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("LINECALL_STORE_URL")));
    }

    #[test]
    fn test_missing_admin_token_is_fatal() {
        let err = ServerConfig::from_lookup(lookup_from(&[(
            "LINECALL_STORE_URL",
            "redis://localhost",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("LINECALL_ADMIN_TOKEN")));
    }

    #[test]
    fn test_rule_overrides_parsed_and_clamped() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LINECALL_GRID_SIZE", "6"));
        pairs.push(("LINECALL_TURN_SECS", "30"));
        pairs.push(("LINECALL_MAX_PLAYERS", "1"));
        let config = ServerConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.rules.grid_size, 6);
        assert_eq!(config.rules.turn_seconds, 30);
        // Clamped up to min_players.
        assert_eq!(config.rules.max_players, 2);
    }

    #[test]
    fn test_unparseable_value_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LINECALL_TURN_SECS", "soon"));
        let err = ServerConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { name: "LINECALL_TURN_SECS", .. }
        ));
    }
}
