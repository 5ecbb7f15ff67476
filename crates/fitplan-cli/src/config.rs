//! `fitplan` settings: the TOML file written by `fitplan init` and the
//! resolution of each setting from CLI flag, environment, file and default.
//!
//! The file lives at `$FITPLAN_CONFIG` when set, otherwise
//! `$XDG_CONFIG_HOME/fitplan/config.toml` or `~/.config/fitplan/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use fitplan_core::nutrition::{self, FoodCache, UsdaConfig};
use fitplan_core::token::TokenConfig;
use fitplan_db::config::DbConfig;

pub const DEFAULT_TOKEN_TTL_HOURS: u64 = 24 * 7;
pub const DEFAULT_USDA_BASE_URL: &str = nutrition::DEFAULT_BASE_URL;
pub const DEFAULT_CACHE_CAPACITY: usize = nutrition::DEFAULT_CAPACITY;
pub const DEFAULT_CACHE_TTL_SECS: u64 = nutrition::DEFAULT_TTL.as_secs();

const DATABASE_URL_VAR: &str = "FITPLAN_DATABASE_URL";
const TOKEN_SECRET_VAR: &str = "FITPLAN_TOKEN_SECRET";
const USDA_KEY_VAR: &str = "FITPLAN_USDA_KEY";
const CONFIG_PATH_VAR: &str = "FITPLAN_CONFIG";

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub auth: AuthSection,
    #[serde(default)]
    pub nutrition: NutritionSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSection {
    /// 32 bytes, hex encoded.
    pub token_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NutritionSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for NutritionSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_token_ttl_hours() -> u64 {
    DEFAULT_TOKEN_TTL_HOURS
}

fn default_base_url() -> String {
    DEFAULT_USDA_BASE_URL.to_owned()
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

impl ConfigFile {
    /// A fresh config for `fitplan init`, with a newly generated token secret.
    pub fn new(db_url: &str, usda_key: Option<String>) -> Self {
        Self {
            database: DatabaseSection {
                url: db_url.to_owned(),
            },
            auth: AuthSection {
                token_secret: generate_token_secret(),
                token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            },
            nutrition: NutritionSection {
                api_key: usda_key,
                ..Default::default()
            },
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file at {}", path.display()))
    }

    /// Write the file, creating its directory. On Unix the file is 0600
    /// since it holds the token secret.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create config directory {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write config file at {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("failed to set permissions on {}", path.display()))?;
        }
        Ok(())
    }
}

/// Where `init` writes and `resolve` reads the config file.
pub fn config_path() -> PathBuf {
    if let Some(path) = env_var(CONFIG_PATH_VAR) {
        return PathBuf::from(path);
    }
    let base = env_var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("fitplan").join("config.toml")
}

/// 32 random bytes as 64 hex chars.
pub fn generate_token_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Empty variables count as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Nutrition provider and cache settings after resolution.
#[derive(Debug, Clone)]
pub struct NutritionSettings {
    pub usda: UsdaConfig,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
}

impl NutritionSettings {
    /// `FITPLAN_USDA_KEY` wins over `[nutrition].api_key`.
    fn resolve(section: NutritionSection) -> Self {
        Self {
            usda: UsdaConfig {
                api_key: env_var(USDA_KEY_VAR).or(section.api_key),
                base_url: section.base_url,
            },
            cache_capacity: section.cache_capacity,
            cache_ttl: Duration::from_secs(section.cache_ttl_secs),
        }
    }

    pub fn build_cache(&self) -> FoodCache {
        FoodCache::new(self.cache_capacity, self.cache_ttl)
    }
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct FitplanConfig {
    pub db_config: DbConfig,
    pub token_config: TokenConfig,
    pub nutrition: NutritionSettings,
}

impl FitplanConfig {
    /// Resolve every setting. A missing config file is not an error, but a
    /// present one that fails to parse is.
    ///
    /// - DB URL: `cli_db_url` > `FITPLAN_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Token secret: `FITPLAN_TOKEN_SECRET` > `auth.token_secret` > error
    /// - USDA key: `FITPLAN_USDA_KEY` > `nutrition.api_key` > none
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let path = config_path();
        let file = if path.exists() {
            Some(ConfigFile::read(&path)?)
        } else {
            None
        };

        Ok(Self {
            db_config: DbConfig::new(database_url(cli_db_url, file.as_ref())),
            token_config: token_config(file.as_ref())?,
            nutrition: NutritionSettings::resolve(
                file.map(|f| f.nutrition).unwrap_or_default(),
            ),
        })
    }
}

fn database_url(cli_db_url: Option<&str>, file: Option<&ConfigFile>) -> String {
    cli_db_url
        .map(str::to_owned)
        .or_else(|| env_var(DATABASE_URL_VAR))
        .or_else(|| file.map(|f| f.database.url.clone()))
        .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_owned())
}

/// The TTL always comes from the file; only the secret can be overridden.
fn token_config(file: Option<&ConfigFile>) -> Result<TokenConfig> {
    let config = match (env_var(TOKEN_SECRET_VAR), file) {
        (Some(hex), _) => TokenConfig::from_hex(&hex)
            .with_context(|| format!("{TOKEN_SECRET_VAR} is not a valid hex secret"))?,
        (None, Some(f)) => TokenConfig::from_hex(&f.auth.token_secret)
            .context("invalid hex in config file token_secret")?,
        (None, None) => {
            return Err(anyhow!(
                "token secret not found; set {TOKEN_SECRET_VAR} or run `fitplan init` to create a config file"
            ));
        }
    };
    let hours = file.map_or(DEFAULT_TOKEN_TTL_HOURS, |f| f.auth.token_ttl_hours);
    Ok(config.with_ttl(Duration::from_secs(hours * 60 * 60)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{EnvGuard, lock_env};

    const SECRET: &str = "aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55";

    fn file_with(url: &str, ttl_hours: u64) -> ConfigFile {
        let mut cfg = ConfigFile::new(url, None);
        cfg.auth.token_secret = SECRET.into();
        cfg.auth.token_ttl_hours = ttl_hours;
        cfg
    }

    #[test]
    fn generate_token_secret_is_64_hex_chars() {
        let secret = generate_token_secret();
        assert_eq!(secret.len(), 64);
        assert!(
            secret.chars().all(|c| c.is_ascii_hexdigit()),
            "expected all hex digits, got: {secret}"
        );
        assert_ne!(secret, generate_token_secret());
    }

    #[test]
    fn new_config_has_fresh_secret_and_defaults() {
        let a = ConfigFile::new("postgresql://db:5432/fitplan", Some("KEY".into()));
        let b = ConfigFile::new("postgresql://db:5432/fitplan", None);
        assert_ne!(a.auth.token_secret, b.auth.token_secret);
        assert!(TokenConfig::from_hex(&a.auth.token_secret).is_ok());
        assert_eq!(a.auth.token_ttl_hours, DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(a.nutrition.api_key.as_deref(), Some("KEY"));
        assert_eq!(b.nutrition.base_url, DEFAULT_USDA_BASE_URL);
    }

    #[test]
    fn minimal_file_gets_defaults() {
        let cfg: ConfigFile = toml::from_str(
            r#"
[database]
url = "postgresql://db:5432/fitplan"

[auth]
token_secret = "abcd"
"#,
        )
        .unwrap();
        assert_eq!(cfg.auth.token_ttl_hours, DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(cfg.nutrition.base_url, DEFAULT_USDA_BASE_URL);
        assert_eq!(cfg.nutrition.cache_capacity, 100);
        assert_eq!(cfg.nutrition.cache_ttl_secs, 604_800);
        assert!(cfg.nutrition.api_key.is_none());
    }

    #[test]
    fn config_path_prefers_override_then_xdg() {
        let _lock = lock_env();
        let _env = EnvGuard::set(&[
            ("FITPLAN_CONFIG", Some("/etc/fitplan.toml")),
            ("XDG_CONFIG_HOME", Some("/xdg")),
        ]);
        assert_eq!(config_path(), PathBuf::from("/etc/fitplan.toml"));

        let _unset = EnvGuard::set(&[("FITPLAN_CONFIG", Some(""))]);
        assert_eq!(config_path(), PathBuf::from("/xdg/fitplan/config.toml"));
    }

    #[cfg(unix)]
    #[test]
    fn write_creates_owner_only_file() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/config.toml");
        let mut original = file_with("postgresql://testhost:5432/testdb", 1);
        original.nutrition.api_key = Some("DEMO_KEY".into());
        original.write(&path).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);

        let loaded = ConfigFile::read(&path).unwrap();
        assert_eq!(loaded.database.url, original.database.url);
        assert_eq!(loaded.auth.token_ttl_hours, 1);
        assert_eq!(loaded.nutrition.api_key.as_deref(), Some("DEMO_KEY"));
    }

    #[test]
    fn database_url_precedence() {
        let _lock = lock_env();
        let file = file_with("postgresql://file:5432/filedb", 1);

        let _env = EnvGuard::set(&[("FITPLAN_DATABASE_URL", Some("postgresql://env:5432/envdb"))]);
        assert_eq!(
            database_url(Some("postgresql://cli:5432/clidb"), Some(&file)),
            "postgresql://cli:5432/clidb"
        );
        assert_eq!(database_url(None, Some(&file)), "postgresql://env:5432/envdb");

        let _unset = EnvGuard::set(&[("FITPLAN_DATABASE_URL", None)]);
        assert_eq!(database_url(None, Some(&file)), "postgresql://file:5432/filedb");
        assert_eq!(database_url(None, None), DbConfig::DEFAULT_URL);
    }

    #[test]
    fn env_secret_keeps_file_ttl() {
        let _lock = lock_env();
        let _env = EnvGuard::set(&[("FITPLAN_TOKEN_SECRET", Some(SECRET))]);
        let mut file = file_with("postgresql://db/fitplan", 3);
        file.auth.token_secret = "not hex".into();

        let config = token_config(Some(&file)).unwrap();
        assert_eq!(config.ttl, Duration::from_secs(3 * 60 * 60));
    }

    #[test]
    fn resolve_env_overrides_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        let _env = EnvGuard::set(&[
            ("FITPLAN_CONFIG", Some(path.to_str().unwrap())),
            ("FITPLAN_DATABASE_URL", Some("postgresql://env:5432/envdb")),
            ("FITPLAN_TOKEN_SECRET", None),
            ("FITPLAN_USDA_KEY", Some("ENV_KEY")),
        ]);
        let mut file = file_with("postgresql://file:5432/filedb", 2);
        file.nutrition.api_key = Some("FILE_KEY".into());
        file.nutrition.cache_capacity = 7;
        file.write(&path).unwrap();

        let config = FitplanConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
        assert_eq!(config.token_config.ttl, Duration::from_secs(2 * 60 * 60));
        assert_eq!(config.nutrition.usda.api_key.as_deref(), Some("ENV_KEY"));
        assert_eq!(config.nutrition.cache_capacity, 7);
    }

    #[test]
    fn resolve_defaults_when_only_secret_is_set() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = EnvGuard::set(&[
            ("FITPLAN_CONFIG", None),
            ("XDG_CONFIG_HOME", Some(tmp.path().to_str().unwrap())),
            ("FITPLAN_DATABASE_URL", None),
            ("FITPLAN_USDA_KEY", None),
            ("FITPLAN_TOKEN_SECRET", Some(SECRET)),
        ]);

        let config = FitplanConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(
            config.token_config.ttl,
            Duration::from_secs(DEFAULT_TOKEN_TTL_HOURS * 3600)
        );
        assert!(config.nutrition.usda.api_key.is_none());
        assert_eq!(config.nutrition.usda.base_url, DEFAULT_USDA_BASE_URL);
        assert_eq!(config.nutrition.cache_ttl, Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
    }

    #[test]
    fn resolve_errors_when_no_token_secret() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = EnvGuard::set(&[
            ("FITPLAN_CONFIG", Some(tmp.path().join("missing.toml").to_str().unwrap())),
            ("FITPLAN_TOKEN_SECRET", None),
        ]);

        let msg = FitplanConfig::resolve(Some("postgresql://localhost:5432/fitplan"))
            .unwrap_err()
            .to_string();
        assert!(msg.contains("token secret not found"), "unexpected error: {msg}");
    }

    #[test]
    fn resolve_rejects_unparseable_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[database\nurl = 1").unwrap();
        let _env = EnvGuard::set(&[
            ("FITPLAN_CONFIG", Some(path.to_str().unwrap())),
            ("FITPLAN_TOKEN_SECRET", Some(SECRET)),
        ]);

        let msg = format!("{:#}", FitplanConfig::resolve(None).unwrap_err());
        assert!(msg.contains("failed to parse config file"), "unexpected error: {msg}");
    }
}
