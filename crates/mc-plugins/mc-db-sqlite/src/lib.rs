//! # mc-db-sqlite
//!
//! SQLite implementation of `ListingRepo` and `ProfileRepo`.
//! This crate maps between the relational model and the `mc-core`
//! domain models; one repo value serves both ports.

mod listings;
mod profiles;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::info;

const SCHEMA: &str = include_str!("schema.sql");

pub struct SqliteMarketplaceRepo {
    pool: SqlitePool,
}

impl SqliteMarketplaceRepo {
    /// Connects (creating the database file if needed) and applies the schema.
    ///
    /// `sqlite::memory:` gets a single, never-recycled connection so the
    /// whole pool sees the same in-memory database.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        if !in_memory {
            if let Some(parent) = options.get_filename().parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        info!(%url, "sqlite schema ready");

        Ok(Self { pool })
    }
}

/// Reads a text column holding a storage enum token.
fn parse_column<T>(row: &SqliteRow, column: &str) -> anyhow::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(anyhow::Error::msg)
}

/// `%needle%` for a case-insensitive `LIKE ... ESCAPE '\'`.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("BMW"), "%bmw%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[tokio::test]
    async fn schema_applies_twice() {
        let repo = SqliteMarketplaceRepo::new("sqlite::memory:").await.unwrap();
        sqlx::raw_sql(SCHEMA).execute(&repo.pool).await.unwrap();
    }
}
