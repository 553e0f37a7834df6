use clap::Parser;
use serde::Deserialize;

use ::config::ConfigError;
use handle_errors::Error;

/// Typed questionnaire web service API
#[derive(Parser, Debug, Default, PartialEq)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Settings file to read, without its extension
    #[clap(short, long, default_value = "setup")]
    config: String,
    /// Which errors we want to log (info, warn or error)
    #[clap(short, long)]
    log_level: Option<String>,
    /// Which port the server should listen on
    #[clap(short, long)]
    port: Option<u16>,
    /// Keep questions in process memory instead of PostgreSQL
    #[clap(long)]
    in_memory: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Settings for one server run.
///
/// Sources, lowest precedence first: built-in defaults, the settings
/// file, `QUESTIONNAIRE_*` environment variables (a `.env` file is
/// loaded into the environment first), command line flags.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    pub log_level: String,
    pub port: u16,
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub storage: StorageBackend,
}

impl Config {
    pub fn new() -> Result<Config, Error> {
        dotenv::dotenv().ok();
        Config::from_args(Args::parse())
    }

    fn from_args(args: Args) -> Result<Config, Error> {
        let mut config = load(&args.config).map_err(Error::ConfigurationError)?;

        if let Some(log_level) = args.log_level {
            config.log_level = log_level;
        }
        if let Some(port) = args.port {
            config.port = port;
        }
        if args.in_memory {
            config.storage = StorageBackend::Memory;
        }

        Ok(config)
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }
}

fn load(settings_file: &str) -> Result<Config, ConfigError> {
    ::config::Config::builder()
        .set_default("log_level", "info")?
        .set_default("port", 3030_i64)?
        .set_default("db_host", "localhost")?
        .set_default("db_port", 5432_i64)?
        .set_default("db_user", "postgres")?
        .set_default("db_password", "")?
        .set_default("db_name", "questionnaire")?
        .set_default("storage", "postgres")?
        .add_source(::config::File::with_name(settings_file).required(false))
        .add_source(::config::Environment::with_prefix("QUESTIONNAIRE"))
        .build()?
        .try_deserialize::<Config>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_flags_win() {
        let config = Config::from_args(Args {
            config: "no-such-settings-file".to_string(),
            log_level: Some("debug".to_string()),
            port: Some(9000),
            in_memory: true,
        })
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.port, 9000);
        assert_eq!(config.storage, StorageBackend::Memory);
    }

    #[test]
    fn database_url_is_assembled_from_parts() {
        let config = Config {
            log_level: "info".to_string(),
            port: 3030,
            db_host: "db".to_string(),
            db_port: 5433,
            db_user: "quiz".to_string(),
            db_password: "secret".to_string(),
            db_name: "questions".to_string(),
            storage: StorageBackend::Postgres,
        };

        assert_eq!(
            config.database_url(),
            "postgres://quiz:secret@db:5433/questions"
        );
    }
}
