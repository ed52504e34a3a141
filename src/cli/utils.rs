use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::Database;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = Map::new();
            response.insert("status".to_string(), json!("success"));
            response.insert("message".to_string(), json!(message));
            if let Some(Value::Object(fields)) = data {
                response.extend(fields);
            }
            println!("{}", serde_json::to_string_pretty(&Value::Object(response))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Loads configuration and opens the pool
pub async fn connect() -> anyhow::Result<(AppConfig, Database)> {
    let config = AppConfig::from_env()?;
    let database = Database::connect(&config.database).await?;
    Ok((config, database))
}
