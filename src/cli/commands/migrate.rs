use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let (_, database) = connect().await?;
    database.migrate().await?;
    database.close().await;
    output_success(output_format, "Migrations applied", None)
}
