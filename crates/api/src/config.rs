//! Server configuration loaded from environment variables.

use std::path::PathBuf;

use crate::allocator::ShortfallPolicy;

/// Blob storage backend selection.
#[derive(Debug, Clone)]
pub enum StorageSettings {
    /// Local filesystem store (development, tests).
    Local { root: PathBuf, base_url: String },
    /// S3 bucket with a public base URL for served blobs.
    S3 {
        bucket: String,
        public_base_url: String,
    },
}

/// All runtime configuration. Every field has a development default;
/// production overrides via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Recovery sweep interval in seconds (default: daily).
    pub sweep_interval_secs: u64,
    /// Per-status row cap for each recovery sweep (default: `100`).
    pub sweep_scan_limit: i64,
    /// Root for per-batch scratch directories.
    pub work_dir: PathBuf,
    /// TTF font for the QR text overlay; overlay is skipped if unset or
    /// unreadable.
    pub font_path: Option<PathBuf>,
    /// Blob storage backend.
    pub storage: StorageSettings,
    /// External dialcode allocator endpoint.
    pub allocator_url: String,
    /// Maximum codes per allocator call (default: `1000`).
    pub allocator_per_call_max: u32,
    /// What to do when the allocator cumulatively returns fewer codes than
    /// requested (default: absorb).
    pub shortfall_policy: ShortfallPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                          |
    /// |---------------------------|----------------------------------|
    /// | `HOST`                    | `0.0.0.0`                        |
    /// | `PORT`                    | `3000`                           |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`          |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                             |
    /// | `SWEEP_INTERVAL_SECS`     | `86400`                          |
    /// | `SWEEP_SCAN_LIMIT`        | `100`                            |
    /// | `WORK_DIR`                | `{tmp}/dialbatch`                |
    /// | `QR_TEXT_FONT`            | unset                            |
    /// | `STORAGE_BACKEND`         | `local`                          |
    /// | `STORAGE_LOCAL_ROOT`      | `./blobs`                        |
    /// | `STORAGE_BASE_URL`        | `http://localhost:3000/blobs`    |
    /// | `S3_BUCKET`               | required when backend is `s3`    |
    /// | `ALLOCATOR_URL`           | `http://localhost:9090/dialcodes`|
    /// | `ALLOCATOR_PER_CALL_MAX`  | `1000`                           |
    /// | `ALLOCATOR_SHORTFALL`     | `absorb`                         |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env_u64("REQUEST_TIMEOUT_SECS", 30);
        let sweep_interval_secs = env_u64("SWEEP_INTERVAL_SECS", 24 * 60 * 60);

        let sweep_scan_limit: i64 = std::env::var("SWEEP_SCAN_LIMIT")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("SWEEP_SCAN_LIMIT must be a valid i64");

        let work_dir = std::env::var("WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("dialbatch"));

        let font_path = std::env::var("QR_TEXT_FONT").ok().map(PathBuf::from);

        let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".into());
        let storage = match backend.as_str() {
            "s3" => StorageSettings::S3 {
                bucket: std::env::var("S3_BUCKET")
                    .expect("S3_BUCKET must be set when STORAGE_BACKEND is s3"),
                public_base_url: std::env::var("STORAGE_BASE_URL")
                    .expect("STORAGE_BASE_URL must be set when STORAGE_BACKEND is s3"),
            },
            "local" => StorageSettings::Local {
                root: std::env::var("STORAGE_LOCAL_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./blobs")),
                base_url: std::env::var("STORAGE_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:3000/blobs".into()),
            },
            other => panic!("STORAGE_BACKEND must be 'local' or 's3', got '{other}'"),
        };

        let allocator_url = std::env::var("ALLOCATOR_URL")
            .unwrap_or_else(|_| "http://localhost:9090/dialcodes".into());

        let allocator_per_call_max: u32 = std::env::var("ALLOCATOR_PER_CALL_MAX")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("ALLOCATOR_PER_CALL_MAX must be a valid u32");

        let shortfall_policy = ShortfallPolicy::parse(
            &std::env::var("ALLOCATOR_SHORTFALL").unwrap_or_else(|_| "absorb".into()),
        );

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            sweep_interval_secs,
            sweep_scan_limit,
            work_dir,
            font_path,
            storage,
            allocator_url,
            allocator_per_call_max,
            shortfall_policy,
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid u64"))
}
