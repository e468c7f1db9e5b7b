use super::error::{PgDaoError, PgResult};

/// Runtime configuration describing how to connect to PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgConfig {
    pub url: String,
    pub max_connections: u32,
}

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

impl PgConfig {
    /// Construct a configuration from an explicit connection URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Override the connection pool size.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> PgResult<Self> {
        let url = std::env::var("DATABASE_URL").map_err(|_| PgDaoError::MissingEnvVar {
            var: "DATABASE_URL",
        })?;

        let mut config = Self::new(url);

        if let Some(max_connections) = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
        {
            config = config.with_max_connections(max_connections);
        }

        Ok(config)
    }
}
