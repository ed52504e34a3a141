pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "school-admin-api")]
#[command(about = "School administration API server and maintenance commands")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API (default)")]
    Serve,

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Create an Admin account, or reset the password of an existing one")]
    CreateAdmin {
        #[arg(long, help = "Login name")]
        username: String,
        #[arg(long, env = "ADMIN_PASSWORD", help = "Plain-text password, hashed before storage")]
        password: String,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve::handle().await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::CreateAdmin { username, password } => {
            commands::admin::handle(&username, password, output_format).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::parse_from(["school-admin-api"]);
        assert!(cli.command.is_none());
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Text));
    }

    #[test]
    fn parses_create_admin() {
        let cli = Cli::parse_from(["school-admin-api", "--json", "create-admin", "--username", "root", "--password", "secret1"]);
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Some(Commands::CreateAdmin { username, password }) => {
                assert_eq!(username, "root");
                assert_eq!(password, "secret1");
            }
            _ => panic!("expected create-admin"),
        }
    }
}
