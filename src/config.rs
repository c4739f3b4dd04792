use anyhow::{Result, bail};
use clap::Parser;
use std::env;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_PROFILE: &str = "default";
const DEFAULT_REGION: &str = "us-east-1";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub addr: String,
    pub profile: String,
    pub region: String,
    pub bucket: String,
    pub endpoint_url: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Serve a static website from an S3 bucket")]
pub struct Args {
    /// Address to listen on (overrides S3_WEBSITE_ADDR, default 127.0.0.1:8080)
    #[arg(short = 'a', long)]
    pub addr: Option<String>,

    /// AWS profile to use (overrides AWS_PROFILE, default "default")
    #[arg(long)]
    pub profile: Option<String>,

    /// AWS region to use (overrides AWS_REGION, default us-east-1)
    #[arg(long)]
    pub region: Option<String>,

    /// Bucket holding the website (overrides AWS_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Custom S3-compatible endpoint (overrides AWS_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::merge(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge parsed flags with an environment lookup. Flags win, then
    /// non-empty environment values, then defaults.
    pub fn merge(args: Args, env_var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let pick = |flag: Option<String>, name: &str| {
            flag.filter(|value| !value.is_empty())
                .or_else(|| env_var(name).filter(|value| !value.is_empty()))
        };

        let cfg = Self {
            addr: pick(args.addr, "S3_WEBSITE_ADDR").unwrap_or_else(|| DEFAULT_ADDR.into()),
            profile: pick(args.profile, "AWS_PROFILE").unwrap_or_else(|| DEFAULT_PROFILE.into()),
            region: pick(args.region, "AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.into()),
            bucket: pick(args.bucket, "AWS_BUCKET").unwrap_or_default(),
            endpoint_url: pick(args.endpoint_url, "AWS_ENDPOINT_URL"),
        };

        if cfg.bucket.is_empty() {
            bail!("no bucket configured: pass --bucket or set AWS_BUCKET");
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_bucket_is_set() {
        let cfg = AppConfig::merge(Args::default(), env_of(&[("AWS_BUCKET", "site")])).unwrap();
        assert_eq!(
            cfg,
            AppConfig {
                addr: "127.0.0.1:8080".into(),
                profile: "default".into(),
                region: "us-east-1".into(),
                bucket: "site".into(),
                endpoint_url: None,
            }
        );
    }

    #[test]
    fn flags_override_environment() {
        let args = Args::parse_from([
            "s3-website",
            "-a",
            "0.0.0.0:9000",
            "--region",
            "eu-west-1",
            "--bucket",
            "from-flag",
        ]);
        let env = env_of(&[
            ("AWS_BUCKET", "from-env"),
            ("AWS_REGION", "us-west-2"),
            ("AWS_PROFILE", "staging"),
            ("AWS_ENDPOINT_URL", "http://localhost:9000"),
        ]);
        let cfg = AppConfig::merge(args, env).unwrap();
        assert_eq!(cfg.addr, "0.0.0.0:9000");
        assert_eq!(cfg.region, "eu-west-1");
        assert_eq!(cfg.bucket, "from-flag");
        assert_eq!(cfg.profile, "staging");
        assert_eq!(cfg.endpoint_url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn missing_bucket_is_rejected() {
        assert!(AppConfig::merge(Args::default(), env_of(&[])).is_err());
        assert!(AppConfig::merge(Args::default(), env_of(&[("AWS_BUCKET", "")])).is_err());
    }
}
