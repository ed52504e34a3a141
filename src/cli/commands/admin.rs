use serde_json::json;

use crate::auth::password::hash_password;
use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::types::Role;
use crate::validation::user::check_password;

/// Bootstraps the first Admin. Running it again for the same username resets
/// the password and role.
pub async fn handle(username: &str, password: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let username = username.trim();
    if username.is_empty() {
        anyhow::bail!("username must be a non-empty string");
    }
    check_password(&password)?;

    let (config, database) = connect().await?;
    let hash = hash_password(password, config.security.bcrypt_cost).await?;

    let (user_id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (username, password_hash, role, branch_id) VALUES ($1, $2, $3, NULL) \
         ON CONFLICT (username) DO UPDATE \
         SET password_hash = EXCLUDED.password_hash, role = EXCLUDED.role, branch_id = NULL, updated_at = now() \
         RETURNING user_id",
    )
    .bind(username)
    .bind(&hash)
    .bind(Role::Admin.as_str())
    .fetch_one(database.pool())
    .await?;

    tracing::info!("Admin account {} ready (user {})", username, user_id);
    database.close().await;

    output_success(
        output_format,
        &format!("Admin {} is ready", username),
        Some(json!({ "user_id": user_id, "username": username })),
    )
}
