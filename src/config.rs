use clap::Parser;
use config::{ConfigBuilder, builder::DefaultState};
use serde::Deserialize;
use std::env;

use handle_errors::Error;

/// Operate pages web service
#[derive(Parser, Debug, Default, PartialEq)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Settings file, looked up without extension
    #[clap(short, long, default_value = "setup")]
    pub config: String,
    /// Which errors we want to log (info, warn or error)
    #[clap(short, long)]
    pub log_level: Option<String>,
    /// Address the web server listens on
    #[clap(long)]
    pub host: Option<String>,
    /// Port the web server listens on
    #[clap(short, long)]
    pub port: Option<u16>,
    /// Origin the static documents are fetched from, instead of the request host
    #[clap(long)]
    pub asset_origin: Option<String>,
    /// Directory served as the static site
    #[clap(long)]
    pub public_dir: Option<String>,
    /// Model name used for /api/gemini
    #[clap(long)]
    pub gemini_model: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub asset_origin: Option<String>,
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_gemini_endpoint")]
    pub gemini_endpoint: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3030
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

impl Config {
    /// Defaults, then the settings file, then `OPERATE_*` variables, then
    /// `PORT`/`GEMINI_API_KEY`, then command line flags.
    pub fn new() -> Result<Config, Error> {
        dotenv::dotenv().ok();
        let args = Args::parse();

        let builder = config::Config::builder()
            .add_source(config::File::with_name(&args.config).required(false))
            .add_source(config::Environment::with_prefix("OPERATE"));

        Config::layered(
            builder,
            &args,
            env::var("PORT").ok(),
            env::var("GEMINI_API_KEY").ok(),
        )
    }

    fn layered(
        builder: ConfigBuilder<DefaultState>,
        args: &Args,
        port: Option<String>,
        gemini_api_key: Option<String>,
    ) -> Result<Config, Error> {
        let config = builder
            .set_override_option("port", port)
            .and_then(|b| b.set_override_option("gemini_api_key", gemini_api_key))
            .and_then(|b| b.set_override_option("log_level", args.log_level.clone()))
            .and_then(|b| b.set_override_option("host", args.host.clone()))
            .and_then(|b| b.set_override_option("port", args.port.map(i64::from)))
            .and_then(|b| b.set_override_option("asset_origin", args.asset_origin.clone()))
            .and_then(|b| b.set_override_option("public_dir", args.public_dir.clone()))
            .and_then(|b| b.set_override_option("gemini_model", args.gemini_model.clone()))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize::<Config>())
            .map_err(Error::ConfigError)?;

        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        self.gemini_api_key = self.gemini_api_key.filter(|key| !key.trim().is_empty());
        self.asset_origin = self
            .asset_origin
            .map(|origin| origin.trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty());
        self.gemini_endpoint = self.gemini_endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, Error> {
        let ip = self
            .host
            .parse::<std::net::IpAddr>()
            .map_err(Error::InvalidAddress)?;
        Ok(std::net::SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_toml(toml: &str, args: &Args, port: Option<&str>, key: Option<&str>) -> Config {
        let builder = config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Config::layered(
            builder,
            args,
            port.map(str::to_string),
            key.map(str::to_string),
        )
        .unwrap()
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let config = from_toml("", &Args::default(), None, None);
        assert_eq!(config.port, 3030);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.public_dir, "public");
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.asset_origin, None);
    }

    #[test]
    fn flags_beat_environment_beat_file() {
        let toml = r#"
            port = 8000
            log_level = "warn"
            gemini_model = "from-file"
            asset_origin = "http://assets.local/"
        "#;
        let config = from_toml(toml, &Args::default(), Some("8080"), Some("secret"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.gemini_model, "from-file");
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.asset_origin.as_deref(), Some("http://assets.local"));

        let args = Args {
            port: Some(9090),
            gemini_model: Some("from-flag".to_string()),
            ..Args::default()
        };
        let config = from_toml(toml, &args, Some("8080"), None);
        assert_eq!(config.port, 9090);
        assert_eq!(config.gemini_model, "from-flag");
    }

    #[test]
    fn empty_api_key_means_local_mode() {
        let config = from_toml("", &Args::default(), None, Some("  "));
        assert_eq!(config.gemini_api_key, None);
    }

    #[test]
    fn rejects_unparseable_host() {
        let mut config = from_toml("", &Args::default(), None, None);
        assert!(config.socket_addr().is_ok());
        config.host = "not an ip".to_string();
        assert!(matches!(config.socket_addr(), Err(Error::InvalidAddress(_))));
    }
}
