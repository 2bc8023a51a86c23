use std::time::Duration;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// Sleep between polls when the queue is empty or the database errored.
    pub poll_interval: Duration,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Default    |
    /// |----------------------|------------|
    /// | `DATABASE_URL`       | (required) |
    /// | `POLL_INTERVAL_SECS` | `5`        |
    ///
    /// Panics if `DATABASE_URL` is unset or the interval is not a number.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        Self {
            database_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
        }
    }
}
