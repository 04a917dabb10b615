use clap::{Parser, Subcommand};
use envfile_loadr::{
    define_config, define_enum, load_values, ConfigError, EnvSchema, LoadOptions,
};
use std::{path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

define_enum!(
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LogLevel {
        #[value = "debug"]
        Debug,
        #[value = "info"]
        Info,
        #[value = "warn"]
        Warn,
    }
);

define_config!(
    #[derive(Debug)]
    pub struct DatabaseConfig {
        #[field(string, env = "HOST", doc = "Database host")]
        pub host: String,

        #[field(int, env = "PORT", doc = "Database port", optional, default = 5432)]
        pub port: u16,
    }
);

define_config!(
    #[derive(Debug)]
    pub struct DemoConfig {
        #[field(boolean, env = "DEBUG", doc = "Verbose mode", optional, default = false)]
        pub debug: bool,

        #[field(int, env = "PORT", doc = "HTTP port", min = 1, max = 65535)]
        pub port: u16,

        #[field(enumeration, env = "LOG_LEVEL", doc = "Log level", optional, default = LogLevel::Info)]
        pub log_level: LogLevel,

        #[field(string, env = "ALLOWED_HOSTS", doc = "Comma separated host names", optional)]
        pub allowed_hosts: Option<Vec<String>>,

        #[field(object, env = "DB", doc = "Database connection")]
        pub database: DatabaseConfig,
    }
);

/// Validate env files against the demo schema
#[derive(Parser, Debug)]
#[command(name = "util-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate an env file
    Check {
        /// Accept variables the schema does not declare
        #[arg(long)]
        allow_unknown: bool,

        /// Env file to read instead of ENV_FILE or ./.env
        #[arg(long)]
        env_file: Option<PathBuf>,

        /// Print values or error details as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the Markdown table of every variable
    Docs {
        #[arg(long, default_value = "CONFIG.md")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Check {
            allow_unknown,
            env_file,
            json,
        } => check(allow_unknown, env_file, json),
        Command::Docs { output } => generate_docs(output),
    }
}

fn check(allow_unknown: bool, env_file: Option<PathBuf>, json: bool) -> ExitCode {
    let mut options = LoadOptions::new().allow_unknown(allow_unknown);
    if let Some(path) = env_file {
        options = options.env_file(path);
    }

    if json {
        return check_json(&options);
    }

    match DemoConfig::load_with(&options) {
        Ok(config) => {
            println!("Config loaded successfully!");
            println!("{:#?}", config);
            ExitCode::SUCCESS
        }
        Err(ConfigError::Invalid(e)) => {
            eprintln!("{}", e.colored_report());
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn check_json(options: &LoadOptions) -> ExitCode {
    let (output, code) = match load_values(DemoConfig::schema(), options) {
        Ok(values) => (serde_json::to_string_pretty(&values), ExitCode::SUCCESS),
        Err(ConfigError::Invalid(e)) => (serde_json::to_string_pretty(&e.details), ExitCode::FAILURE),
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match output {
        Ok(json) => {
            println!("{}", json);
            code
        }
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn generate_docs(output: PathBuf) -> ExitCode {
    println!("Generating documentation for DemoConfig...");
    match DemoConfig::write_docs(&output) {
        Ok(_) => {
            println!("✓ Documentation written to {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write documentation: {}", e);
            ExitCode::FAILURE
        }
    }
}
