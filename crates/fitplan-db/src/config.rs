use std::env;

/// Connection settings for the fitplan database.
///
/// `FITPLAN_DATABASE_URL` selects the server and database;
/// `FITPLAN_DB_MAX_CONNECTIONS` optionally sizes the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/fitplan";
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

    /// Read the configuration from the process environment.
    ///
    /// An unparsable pool size falls back to the default rather than failing.
    pub fn from_env() -> Self {
        let database_url = env::var("FITPLAN_DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_URL.to_owned());
        let max_connections = env::var("FITPLAN_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(Self::DEFAULT_MAX_CONNECTIONS);
        Self {
            database_url,
            max_connections,
        }
    }

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// The path segment of the URL, without any `?sslmode=...` style suffix.
    pub fn database_name(&self) -> Option<&str> {
        let without_query = self
            .database_url
            .split_once('?')
            .map_or(self.database_url.as_str(), |(base, _)| base);
        let (authority, name) = without_query.rsplit_once('/')?;
        if authority.ends_with('/') || name.is_empty() {
            return None;
        }
        Some(name)
    }

    /// Same server, `postgres` database. Used for `CREATE DATABASE`.
    pub fn maintenance_url(&self) -> String {
        match self.database_name() {
            Some(name) => {
                let start = self
                    .database_url
                    .rfind(&format!("/{name}"))
                    .unwrap_or(self.database_url.len());
                let (base, rest) = self.database_url.split_at(start);
                let suffix = &rest[(1 + name.len()).min(rest.len())..];
                format!("{base}/postgres{suffix}")
            }
            None => self.database_url.clone(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
