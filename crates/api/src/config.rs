use std::path::PathBuf;

use stylist_storage::StorageConfig;

use crate::auth::jwt::JwtConfig;
use crate::auth::password::hash_password;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the JWT
/// secret and the admin password.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Static catalog JSON merged into `GET /catalog`.
    pub catalog_path: Option<PathBuf>,
    pub jwt: JwtConfig,
    pub admin: AdminCredentials,
    /// Storage backend; its local directory is also served under `/files`.
    pub storage: StorageConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                                         |
    /// |------------------------|-------------------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                                       |
    /// | `PORT`                 | `8000`                                          |
    /// | `CORS_ORIGINS`         | `http://localhost:3000,http://127.0.0.1:3000`   |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                            |
    /// | `CATALOG_PATH`         | unset                                           |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let catalog_path = std::env::var("CATALOG_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            catalog_path,
            jwt: JwtConfig::from_env(),
            admin: AdminCredentials::from_env(),
            storage: StorageConfig::from_env(),
        }
    }
}

/// The single admin password, kept as an Argon2id PHC hash.
#[derive(Clone)]
pub struct AdminCredentials {
    pub password_hash: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

impl AdminCredentials {
    /// | Env Var               | Notes                                  |
    /// |-----------------------|----------------------------------------|
    /// | `ADMIN_PASSWORD_HASH` | Argon2 PHC string, preferred           |
    /// | `ADMIN_PASSWORD`      | Plaintext, hashed once at startup      |
    ///
    /// # Panics
    ///
    /// Panics if neither variable is set.
    pub fn from_env() -> Self {
        if let Some(hash) = non_empty_var("ADMIN_PASSWORD_HASH") {
            return Self {
                password_hash: hash,
            };
        }
        let password = non_empty_var("ADMIN_PASSWORD")
            .expect("ADMIN_PASSWORD_HASH or ADMIN_PASSWORD must be set in the environment");
        Self {
            password_hash: hash_password(&password).expect("Failed to hash ADMIN_PASSWORD"),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
