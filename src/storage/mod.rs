pub mod schema;

use std::fmt;
use std::fs;
use std::path::Path;

use alloy_primitives::B256;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, PgPool};

use crate::exporter::BlockSink;
use crate::models::errors::DbConfigError;
use crate::models::transfers::InternalTransaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::MySql => write!(f, "mysql"),
        }
    }
}

// Backend selection plus its connection string, read from the db params
// file at startup and held immutably thereafter.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub dialect: Dialect,
    pub conn: String,
}

impl DbConfig {
    // Parses "<dialect> <connection string>". The dialect token is
    // prefix-matched, so both "postgres" and "postgresql" select Postgres.
    pub fn parse(params: &str) -> Result<Self, DbConfigError> {
        let mut parts = params.trim().splitn(2, char::is_whitespace);
        let prefix = parts.next().unwrap_or("");
        let conn = parts.next().map(str::trim).unwrap_or("");
        if prefix.is_empty() || conn.is_empty() {
            return Err(DbConfigError::MissingConnectionString);
        }
        let dialect = if prefix.starts_with("postgres") {
            Dialect::Postgres
        } else if prefix.starts_with("mysql") {
            Dialect::MySql
        } else {
            return Err(DbConfigError::UnsupportedDialect(prefix.to_string()));
        };
        Ok(Self {
            dialect,
            conn: conn.to_string(),
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read db params file {}", path.as_ref().display()))?;
        Ok(Self::parse(&contents)?)
    }
}

// Thin insert-only facade over the two supported backends. One Store per
// running process; the pools are safe for concurrent use, and each
// insert is one autonomous operation (no cross-table transactions).
pub enum Store {
    Postgres(PgPool),
    MySql(MySqlPool),
}

impl Store {
    // Connects eagerly, so an unreachable database fails here rather
    // than on the first insert.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        Ok(match config.dialect {
            Dialect::Postgres => Self::Postgres(PgPool::connect(&config.conn).await?),
            Dialect::MySql => Self::MySql(MySqlPool::connect(&config.conn).await?),
        })
    }

    // Creates the export tables when missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        match self {
            Self::Postgres(pool) => {
                for stmt in schema::POSTGRES_SCHEMA {
                    sqlx::query(stmt).execute(pool).await?;
                }
            }
            Self::MySql(pool) => {
                for stmt in schema::MYSQL_SCHEMA {
                    sqlx::query(stmt).execute(pool).await?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BlockSink for Store {
    async fn insert_block(
        &self,
        number: u64,
        hash: B256,
        block_data: &str,
        trace_data: Option<&str>,
    ) -> Result<()> {
        let hash = format!("{hash:#x}");
        match self {
            Self::Postgres(pool) => {
                sqlx::query(schema::POSTGRES_INSERT_BLOCK)
                    .bind(number as i64)
                    .bind(hash)
                    .bind(block_data)
                    .bind(trace_data)
                    .execute(pool)
                    .await?;
            }
            Self::MySql(pool) => {
                sqlx::query(schema::MYSQL_INSERT_BLOCK)
                    .bind(number as i64)
                    .bind(hash)
                    .bind(block_data)
                    .bind(trace_data)
                    .execute(pool)
                    .await?;
            }
        }
        Ok(())
    }

    async fn insert_internal_transaction(&self, itx: &InternalTransaction) -> Result<()> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query(schema::POSTGRES_INSERT_INTERNAL_TX)
                    .bind(format!("{:#x}", itx.tx_hash))
                    .bind(format!("{:#x}", itx.block_hash))
                    .bind(itx.block_number as i64)
                    .bind(itx.tx_index as i32)
                    .bind(itx.call_index as i32)
                    .bind(itx.from.to_checksum(None))
                    .bind(itx.to.to_checksum(None))
                    .bind(itx.value.to_string())
                    .execute(pool)
                    .await?;
            }
            Self::MySql(pool) => {
                sqlx::query(schema::MYSQL_INSERT_INTERNAL_TX)
                    .bind(format!("{:#x}", itx.tx_hash))
                    .bind(format!("{:#x}", itx.block_hash))
                    .bind(itx.block_number as i64)
                    .bind(itx.tx_index as i32)
                    .bind(itx.call_index as i32)
                    .bind(itx.from.to_checksum(None))
                    .bind(itx.to.to_checksum(None))
                    .bind(itx.value.to_string())
                    .execute(pool)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_postgres_params() {
        let config =
            DbConfig::parse("postgresql user=u password=p dbname=explorer host=127.0.0.1").unwrap();
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.conn, "user=u password=p dbname=explorer host=127.0.0.1");
    }

    #[test]
    fn parses_mysql_params_with_surrounding_whitespace() {
        let config = DbConfig::parse("mysql  user:pass@tcp(127.0.0.1:3306)/explorer\n").unwrap();
        assert_eq!(config.dialect, Dialect::MySql);
        assert_eq!(config.conn, "user:pass@tcp(127.0.0.1:3306)/explorer");
    }

    #[test]
    fn rejects_unknown_dialects() {
        match DbConfig::parse("sqlite file.db") {
            Err(DbConfigError::UnsupportedDialect(prefix)) => assert_eq!(prefix, "sqlite"),
            other => panic!("expected unsupported dialect, got {other:?}"),
        }
    }

    #[test]
    fn rejects_params_without_a_connection_string() {
        assert!(matches!(
            DbConfig::parse("postgres"),
            Err(DbConfigError::MissingConnectionString)
        ));
        assert!(matches!(
            DbConfig::parse("   "),
            Err(DbConfigError::MissingConnectionString)
        ));
    }

    #[test]
    fn placeholder_conventions_match_their_dialect() {
        assert!(schema::POSTGRES_INSERT_INTERNAL_TX.contains("$8"));
        assert!(!schema::POSTGRES_INSERT_INTERNAL_TX.contains('?'));
        assert!(schema::MYSQL_INSERT_INTERNAL_TX.contains('?'));
        assert!(!schema::MYSQL_INSERT_INTERNAL_TX.contains('$'));
    }
}
