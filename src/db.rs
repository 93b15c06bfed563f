//! Database module
//!
//! Connectivity and schema checks run at startup.

use sqlx::PgPool;

/// Tables the stores and the identity service read from
pub const REQUIRED_TABLES: &[&str] = &[
    "clans",
    "challenges",
    "wars",
    "player_clans",
    "player_challenges",
    "player_wars",
    "players",
    "user_roles",
    "api_keys",
];

/// Verify database connectivity.
/// The schema itself lives in raw SQL files under migrations/.
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(*table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    let administrators: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_roles WHERE role = 'Administrator'")
            .fetch_one(pool)
            .await?;
    if administrators == 0 {
        tracing::warn!("No user holds the Administrator role; challenges and wars cannot be managed");
    }

    Ok(true)
}
