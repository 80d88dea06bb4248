use std::net::SocketAddr;

use tripwise_relay::context::DEFAULT_MAX_CONTEXT_CHARS;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Where agent runs come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// An external agent runtime reached over HTTP.
    Remote,
    /// The built-in scripted demo run.
    Demo,
}

/// Server settings read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// SQLite file, or `:memory:` for a non-persistent store.
    pub database_path: String,
    pub pipeline_url: String,
    pub pipeline_mode: PipelineMode,
    pub tool_server_url: String,
    /// Allowed CORS origins; a single `*` allows any.
    pub cors_origins: Vec<String>,
    pub context_max_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            database_path: "tripwise.db".into(),
            pipeline_url: "http://agent-runtime:8080".into(),
            pipeline_mode: PipelineMode::Remote,
            tool_server_url: "http://tool-server:8090".into(),
            cors_origins: vec!["http://localhost:3000".into()],
            context_max_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(host) = lookup("API_HOST") {
            settings.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            settings.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "API_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            settings.database_path = path;
        }
        if let Some(url) = lookup("PIPELINE_URL") {
            settings.pipeline_url = url;
        }
        if let Some(mode) = lookup("PIPELINE_MODE") {
            settings.pipeline_mode = match mode.trim().to_ascii_lowercase().as_str() {
                "remote" => PipelineMode::Remote,
                "demo" => PipelineMode::Demo,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "PIPELINE_MODE",
                        value: mode,
                    });
                }
            };
        }
        if let Some(url) = lookup("TOOL_SERVER_URL") {
            settings.tool_server_url = url;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            settings.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(max) = lookup("CONTEXT_MAX_CHARS") {
            settings.context_max_chars =
                max.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "CONTEXT_MAX_CHARS",
                    value: max.clone(),
                })?;
        }

        Ok(settings)
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                key: "API_HOST",
                value: self.host.clone(),
            })
    }

    /// Whether `DATABASE_PATH` selects the in-memory store.
    pub fn in_memory_store(&self) -> bool {
        self.database_path == ":memory:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let s = settings(&[]).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.addr().unwrap().port(), 8000);
        assert!(!s.in_memory_store());
    }

    #[test]
    fn reads_overrides() {
        let s = settings(&[
            ("API_PORT", "9000"),
            ("DATABASE_PATH", ":memory:"),
            ("PIPELINE_MODE", "Demo"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("CONTEXT_MAX_CHARS", "200"),
        ])
        .unwrap();
        assert_eq!(s.port, 9000);
        assert!(s.in_memory_store());
        assert_eq!(s.pipeline_mode, PipelineMode::Demo);
        assert_eq!(s.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(s.context_max_chars, 200);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            settings(&[("API_PORT", "eighty")]).unwrap_err(),
            ConfigError::Invalid {
                key: "API_PORT",
                value: "eighty".into()
            }
        );
        assert!(settings(&[("PIPELINE_MODE", "local")]).is_err());
        assert!(settings(&[("CONTEXT_MAX_CHARS", "-1")]).is_err());
    }

    #[test]
    fn bad_host_is_reported_at_bind_time() {
        let s = settings(&[("API_HOST", "not a host")]).unwrap();
        assert!(s.addr().is_err());
    }
}
