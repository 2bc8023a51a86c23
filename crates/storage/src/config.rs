use std::path::PathBuf;

/// Fallback host for local file URLs when `PUBLIC_BASE_URL` is unset.
pub const DEFAULT_LOCAL_BASE: &str = "http://localhost:8000";

/// Route prefix the API serves the local storage directory under.
pub const FILES_ROUTE: &str = "/files";

/// Which backend stores objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    Local,
    R2,
}

impl StorageBackendKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "r2" => Some(Self::R2),
            _ => None,
        }
    }
}

/// Cloudflare R2 credentials and bucket.
#[derive(Debug, Clone)]
pub struct R2Config {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Public bucket URL objects are served from.
    pub public_url: String,
}

impl R2Config {
    /// S3-compatible endpoint for the account.
    pub fn endpoint(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

/// Storage configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    /// Directory the local backend writes to (also served at `/files`).
    pub local_dir: PathBuf,
    /// Public origin of the API, used to build and rewrite image URLs.
    pub public_base_url: Option<String>,
    pub r2: Option<R2Config>,
}

impl StorageConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default   |
    /// |------------------------|-----------|
    /// | `STORAGE_BACKEND`      | `local`   |
    /// | `LOCAL_STORAGE_DIR`    | `storage` |
    /// | `PUBLIC_BASE_URL`      | (unset)   |
    /// | `R2_ACCOUNT_ID`        | (unset)   |
    /// | `R2_ACCESS_KEY_ID`     | (unset)   |
    /// | `R2_SECRET_ACCESS_KEY` | (unset)   |
    /// | `R2_BUCKET_NAME`       | (unset)   |
    /// | `R2_PUBLIC_URL`        | (unset)   |
    ///
    /// Panics if `STORAGE_BACKEND` is unknown, or is `r2` while any R2
    /// variable is missing.
    pub fn from_env() -> Self {
        let backend_name = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".into());
        let backend = StorageBackendKind::parse(&backend_name)
            .unwrap_or_else(|| panic!("STORAGE_BACKEND must be 'local' or 'r2', got '{backend_name}'"));

        let local_dir = PathBuf::from(
            std::env::var("LOCAL_STORAGE_DIR").unwrap_or_else(|_| "storage".into()),
        );

        let public_base_url = non_empty_var("PUBLIC_BASE_URL");

        let r2 = match backend {
            StorageBackendKind::Local => None,
            StorageBackendKind::R2 => Some(R2Config {
                account_id: non_empty_var("R2_ACCOUNT_ID").expect("R2_ACCOUNT_ID must be set"),
                access_key_id: non_empty_var("R2_ACCESS_KEY_ID")
                    .expect("R2_ACCESS_KEY_ID must be set"),
                secret_access_key: non_empty_var("R2_SECRET_ACCESS_KEY")
                    .expect("R2_SECRET_ACCESS_KEY must be set"),
                bucket: non_empty_var("R2_BUCKET_NAME").expect("R2_BUCKET_NAME must be set"),
                public_url: non_empty_var("R2_PUBLIC_URL").expect("R2_PUBLIC_URL must be set"),
            }),
        };

        Self {
            backend,
            local_dir,
            public_base_url,
            r2,
        }
    }

    /// Local storage rooted at `dir`, with URLs on the default host.
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackendKind::Local,
            local_dir: dir.into(),
            public_base_url: None,
            r2: None,
        }
    }

    /// URL prefix for files written by the local backend.
    pub fn local_base_url(&self) -> String {
        let origin = self
            .public_base_url
            .as_deref()
            .unwrap_or(DEFAULT_LOCAL_BASE)
            .trim_end_matches('/');
        format!("{origin}{FILES_ROUTE}")
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parsing() {
        assert_eq!(StorageBackendKind::parse("LOCAL"), Some(StorageBackendKind::Local));
        assert_eq!(StorageBackendKind::parse("r2"), Some(StorageBackendKind::R2));
        assert_eq!(StorageBackendKind::parse("s3"), None);
    }

    #[test]
    fn local_base_url_defaults_to_localhost() {
        let config = StorageConfig::local("storage");
        assert_eq!(config.local_base_url(), "http://localhost:8000/files");
    }

    #[test]
    fn local_base_url_uses_public_base() {
        let mut config = StorageConfig::local("storage");
        config.public_base_url = Some("https://api.example.com/".into());
        assert_eq!(config.local_base_url(), "https://api.example.com/files");
    }

    #[test]
    fn r2_endpoint() {
        let r2 = R2Config {
            account_id: "abc123".into(),
            access_key_id: "k".into(),
            secret_access_key: "s".into(),
            bucket: "b".into(),
            public_url: "https://pub.example.com".into(),
        };
        assert_eq!(r2.endpoint(), "https://abc123.r2.cloudflarestorage.com");
    }
}
