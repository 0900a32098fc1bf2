use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, path::PathBuf, time::Duration};

/// Default lifetime of a presigned part URL.
pub const DEFAULT_PART_URL_TTL_SECS: u64 = 300;

/// Longest lifetime SigV4 presigning accepts (one week).
pub const MAX_PART_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments; CLI wins.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory served for unmatched routes (the upload page), if any.
    pub static_dir: Option<PathBuf>,
    pub part_url_ttl: Duration,
    /// Refuse to start when store configuration is incomplete.
    pub strict_config: bool,
    pub store: StoreConfig,
}

/// Connection settings for the S3-compatible store.
///
/// Every field except `region` may be absent; [`StoreConfig::missing`]
/// reports which required ones are.
#[derive(Clone, Default)]
pub struct StoreConfig {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
    pub region: String,
    pub force_path_style: bool,
}

impl StoreConfig {
    /// Names of required environment variables that are unset or empty.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("R2_ENDPOINT", &self.endpoint),
            ("R2_ACCESS_KEY", &self.access_key),
            ("R2_SECRET_KEY", &self.secret_key),
            ("R2_BUCKET", &self.bucket),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
        .map(|(name, _)| name)
        .collect()
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Presigned multipart upload gateway for S3-compatible stores")]
pub struct Args {
    /// Host to bind to (overrides UPLOAD_GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides UPLOAD_GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory of static files to serve (overrides UPLOAD_GATEWAY_STATIC_DIR)
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Lifetime of presigned part URLs in seconds (overrides UPLOAD_GATEWAY_PART_URL_TTL_SECS)
    #[arg(long)]
    pub part_url_ttl_secs: Option<u64>,

    /// Fail at startup if store configuration is incomplete
    #[arg(long)]
    pub strict_config: bool,

    /// Store endpoint URL (overrides R2_ENDPOINT)
    #[arg(long)]
    pub store_endpoint: Option<String>,

    /// Bucket name (overrides R2_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Signing region (overrides R2_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Use path-style bucket addressing (overrides R2_FORCE_PATH_STYLE)
    #[arg(long)]
    pub force_path_style: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_lookup(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge `args` over values produced by `lookup`, then apply defaults.
    pub fn from_lookup<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let env_port = match var("UPLOAD_GATEWAY_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing UPLOAD_GATEWAY_PORT value `{}`", value))?,
            None => 3000,
        };
        let env_ttl = match var("UPLOAD_GATEWAY_PART_URL_TTL_SECS") {
            Some(value) => value.parse::<u64>().with_context(|| {
                format!("parsing UPLOAD_GATEWAY_PART_URL_TTL_SECS value `{}`", value)
            })?,
            None => DEFAULT_PART_URL_TTL_SECS,
        };
        let env_strict = parse_flag(
            "UPLOAD_GATEWAY_STRICT_CONFIG",
            var("UPLOAD_GATEWAY_STRICT_CONFIG"),
        )?;
        let env_path_style = parse_flag("R2_FORCE_PATH_STYLE", var("R2_FORCE_PATH_STYLE"))?;

        let part_url_ttl_secs = args.part_url_ttl_secs.unwrap_or(env_ttl);
        if part_url_ttl_secs == 0 {
            bail!("part URL lifetime must be at least one second");
        }
        if part_url_ttl_secs > MAX_PART_URL_TTL_SECS {
            bail!(
                "part URL lifetime {}s exceeds the presigning limit of {}s",
                part_url_ttl_secs,
                MAX_PART_URL_TTL_SECS
            );
        }

        let store = StoreConfig {
            endpoint: args.store_endpoint.or_else(|| var("R2_ENDPOINT")),
            access_key: var("R2_ACCESS_KEY"),
            secret_key: var("R2_SECRET_KEY"),
            bucket: args.bucket.or_else(|| var("R2_BUCKET")),
            region: args
                .region
                .or_else(|| var("R2_REGION"))
                .unwrap_or_else(|| "auto".into()),
            force_path_style: args.force_path_style || env_path_style,
        };

        Ok(Self {
            host: args
                .host
                .or_else(|| var("UPLOAD_GATEWAY_HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: args.port.unwrap_or(env_port),
            static_dir: args
                .static_dir
                .or_else(|| var("UPLOAD_GATEWAY_STATIC_DIR").map(PathBuf::from)),
            part_url_ttl: Duration::from_secs(part_url_ttl_secs),
            strict_config: args.strict_config || env_strict,
            store,
        })
    }

    /// Enforce `strict_config`. Lenient mode only warns; the store will report
    /// the gap on first use.
    pub fn check_store(&self) -> Result<()> {
        let missing = self.store.missing();
        if missing.is_empty() {
            return Ok(());
        }
        if self.strict_config {
            bail!("store configuration incomplete, missing: {}", missing.join(", "));
        }
        tracing::warn!(
            missing = %missing.join(", "),
            "store configuration incomplete; upload requests will fail until it is provided"
        );
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(name: &str, value: Option<String>) -> Result<bool> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => bail!("parsing {} value `{}`: expected true or false", name, other),
    }
}
