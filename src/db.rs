//! Database module - PostgreSQL connection and migrations

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Multiple statements need the simple query protocol
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Scored transactions and their OTP challenge state
CREATE TABLE IF NOT EXISTS transactions (
    id UUID PRIMARY KEY,
    transaction JSONB NOT NULL,
    fraud_probability DOUBLE PRECISION NOT NULL,
    risk VARCHAR(10) NOT NULL,
    status VARCHAR(20) NOT NULL,
    otp INT,
    attempts INT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_transactions_risk ON transactions(risk);
CREATE INDEX IF NOT EXISTS idx_transactions_status ON transactions(status);
"#;
