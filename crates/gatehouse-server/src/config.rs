use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Signing key used when `SECRET_KEY` is not provided. Not safe for deployment.
pub const INSECURE_DEFAULT_SECRET_KEY: &str = "your-default-secret-key";
/// Password pepper used when `SECURITY_PASSWORD_SALT` is not provided.
pub const INSECURE_DEFAULT_PASSWORD_SALT: &str = "your-default-salt";

fn default_listen() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_db_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_access_token_ttl() -> i64 {
    900
}

fn default_refresh_token_ttl_days() -> i64 {
    30
}

fn default_secret_key() -> String {
    INSECURE_DEFAULT_SECRET_KEY.to_string()
}

fn default_password_salt() -> String {
    INSECURE_DEFAULT_PASSWORD_SALT.to_string()
}

fn default_seed_user() -> Option<SeedUserConfig> {
    Some(SeedUserConfig::default())
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(default = "default_db_url")]
    pub url: String,
    /// How long a handler waits for a pooled connection (default: 5)
    #[serde(default = "default_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            acquire_timeout_secs: default_timeout_secs(),
        }
    }
}

impl DbConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// Account created on startup when no user with this email exists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUserConfig {
    pub email: String,
    pub password: String,
    /// Role names to create and assign to the seed account
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Default for SeedUserConfig {
    fn default() -> Self {
        Self {
            email: "test@me.com".to_string(),
            password: "password".to_string(),
            roles: Vec::new(),
        }
    }
}

/// Auth configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT signing key (`SECRET_KEY`)
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    /// argon2 pepper mixed into every password hash (`SECURITY_PASSWORD_SALT`)
    #[serde(default = "default_password_salt")]
    pub password_salt: String,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
    #[serde(default = "default_seed_user")]
    pub seed_user: Option<SeedUserConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
            password_salt: default_password_salt(),
            access_token_ttl_secs: default_access_token_ttl(),
            refresh_token_ttl_days: default_refresh_token_ttl_days(),
            seed_user: default_seed_user(),
        }
    }
}

impl AuthConfig {
    /// Names of the secrets that are empty or still set to their built-in defaults.
    pub fn insecure_settings(&self) -> Vec<&'static str> {
        let mut insecure = Vec::new();
        if self.secret_key.is_empty() || self.secret_key == INSECURE_DEFAULT_SECRET_KEY {
            insecure.push("SECRET_KEY");
        }
        if self.password_salt.is_empty() || self.password_salt == INSECURE_DEFAULT_PASSWORD_SALT {
            insecure.push("SECURITY_PASSWORD_SALT");
        }
        insecure
    }
}

/// Server configuration - defaults, then YAML, then environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Upper bound on a single request, in seconds (default: 5)
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            db: DbConfig::default(),
            auth: AuthConfig::default(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Load server config from an optional YAML file with GATEHOUSE__ env var
/// overrides. `SECRET_KEY` and `SECURITY_PASSWORD_SALT` win over both.
pub fn load_config(path: &str) -> anyhow::Result<ServerConfig> {
    load_config_with_env(path, std::env::vars().collect())
}

/// Same as [`load_config`] but reads variables from `env` instead of the
/// process environment.
pub fn load_config_with_env(
    path: &str,
    env: HashMap<String, String>,
) -> anyhow::Result<ServerConfig> {
    use anyhow::Context;
    let secret_key = env.get("SECRET_KEY").cloned();
    let password_salt = env.get("SECURITY_PASSWORD_SALT").cloned();

    let config: ServerConfig = config::Config::builder()
        .add_source(config::File::new(path, config::FileFormat::Yaml).required(false))
        .add_source(
            config::Environment::with_prefix("GATEHOUSE")
                .prefix_separator("__")
                .separator("__")
                .source(Some(env)),
        )
        .set_override_option("auth.secret_key", secret_key)?
        .set_override_option("auth.password_salt", password_salt)?
        .build()
        .with_context(|| format!("Failed to build config from: {}", path))?
        .try_deserialize()
        .with_context(|| format!("Failed to deserialize config from: {}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
listen: "0.0.0.0:8080"
db:
  url: "sqlite://data/gatehouse.db"
  acquire_timeout_secs: 2
auth:
  secret_key: "jwt-secret"
  password_salt: "pepper"
  access_token_ttl_secs: 60
  refresh_token_ttl_days: 7
  seed_user:
    email: "admin@example.com"
    password: "hunter2"
    roles: ["admin"]
request_timeout_secs: 10
"#;
        let config: ServerConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.db.url, "sqlite://data/gatehouse.db");
        assert_eq!(config.db.acquire_timeout(), Duration::from_secs(2));
        assert_eq!(config.auth.secret_key, "jwt-secret");
        assert_eq!(config.auth.password_salt, "pepper");
        assert_eq!(config.auth.access_token_ttl_secs, 60);
        assert_eq!(config.auth.refresh_token_ttl_days, 7);
        let seed = config.auth.seed_user.as_ref().unwrap();
        assert_eq!(seed.email, "admin@example.com");
        assert_eq!(seed.roles, vec!["admin".to_string()]);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: ServerConfig = serde_yml::from_str("{}").unwrap();
        assert_eq!(config.listen, "127.0.0.1:5000");
        assert_eq!(config.db.url, "sqlite::memory:");
        assert_eq!(config.db.acquire_timeout_secs, 5);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.auth.access_token_ttl_secs, 900);
        let seed = config.auth.seed_user.unwrap();
        assert_eq!(seed.email, "test@me.com");
        assert_eq!(seed.password, "password");
        assert!(seed.roles.is_empty());
    }

    #[test]
    fn test_parse_seed_user_disabled() {
        let yaml = r#"
auth:
  seed_user: null
"#;
        let config: ServerConfig = serde_yml::from_str(yaml).unwrap();
        assert!(config.auth.seed_user.is_none());
    }

    #[test]
    fn test_parse_seed_user_missing_password_fails() {
        let yaml = r#"
auth:
  seed_user:
    email: "admin@example.com"
"#;
        let result = serde_yml::from_str::<ServerConfig>(yaml);
        assert!(result.is_err(), "Seed user without password should fail");
    }

    #[test]
    fn test_insecure_settings_reported() {
        let config = AuthConfig::default();
        assert_eq!(
            config.insecure_settings(),
            vec!["SECRET_KEY", "SECURITY_PASSWORD_SALT"]
        );

        let config = AuthConfig {
            secret_key: "real".to_string(),
            password_salt: "real".to_string(),
            ..AuthConfig::default()
        };
        assert!(config.insecure_settings().is_empty());
    }

    #[test]
    fn test_empty_secrets_reported_insecure() {
        let config = AuthConfig {
            secret_key: String::new(),
            password_salt: "real".to_string(),
            ..AuthConfig::default()
        };
        assert_eq!(config.insecure_settings(), vec!["SECRET_KEY"]);

        let mut env = HashMap::new();
        env.insert("SECRET_KEY".to_string(), "real".to_string());
        env.insert("SECURITY_PASSWORD_SALT".to_string(), String::new());
        let config = load_config_with_env("/nonexistent/gatehouse.yaml", env).unwrap();
        assert_eq!(config.auth.insecure_settings(), vec!["SECURITY_PASSWORD_SALT"]);
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let config =
            load_config_with_env("/nonexistent/gatehouse.yaml", HashMap::new()).unwrap();
        assert_eq!(config.db.url, "sqlite::memory:");
        assert_eq!(config.auth.secret_key, INSECURE_DEFAULT_SECRET_KEY);
        assert_eq!(config.auth.password_salt, INSECURE_DEFAULT_PASSWORD_SALT);
    }

    #[test]
    fn test_load_config_legacy_env_overrides() {
        let mut env = HashMap::new();
        env.insert("SECRET_KEY".to_string(), "from-env".to_string());
        env.insert("SECURITY_PASSWORD_SALT".to_string(), "salt-from-env".to_string());

        let config = load_config_with_env("/nonexistent/gatehouse.yaml", env).unwrap();
        assert_eq!(config.auth.secret_key, "from-env");
        assert_eq!(config.auth.password_salt, "salt-from-env");
        assert!(config.auth.insecure_settings().is_empty());
    }

    #[test]
    fn test_load_config_file_then_prefixed_env() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "listen: \"0.0.0.0:9000\"\ndb:\n  url: \"sqlite://from-file.db\"\n"
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let mut env = HashMap::new();
        env.insert(
            "GATEHOUSE__DB__URL".to_string(),
            "sqlite://from-env.db".to_string(),
        );

        let config = load_config_with_env(&path, env).unwrap();
        assert_eq!(config.listen, "0.0.0.0:9000");
        assert_eq!(config.db.url, "sqlite://from-env.db");
    }
}
