//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.
//!
//! Query helpers are free functions generic over [`ConnectionTrait`] so the
//! services can compose them inside a single transaction.

mod access;
mod accounts;
mod connection;
pub mod converters;
mod links;
pub mod retry;

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::warn;

use crate::errors::{Result, SnaplinkError};
use crate::storage::models::StorageConfig;

pub use access::{access_records_for_links, insert_access_record};
pub use accounts::{
    email_taken, find_account_by_email, find_account_by_guest_uuid, find_account_by_id,
    insert_guest_account, insert_registered_account, promote_guest, touch_account,
    username_taken,
};
pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use links::{
    clear_link_expiry, code_exists, count_active_links, count_links, delete_expired_links,
    delete_owned_link, find_link_by_code, find_link_by_id, increment_click, insert_link,
    list_all_links, list_links, update_link,
};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(SnaplinkError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 连接参数
#[derive(Debug, Clone)]
pub struct StorageOptions {
    pub database_url: String,
    pub pool_size: u32,
    pub retry: retry::RetryConfig,
}

impl StorageOptions {
    pub fn from_config(config: &crate::config::DatabaseConfig) -> Self {
        Self {
            database_url: config.database_url.clone(),
            pool_size: config.pool_size,
            retry: retry::RetryConfig {
                max_retries: config.retry_count,
                base_delay_ms: config.retry_base_delay_ms,
                max_delay_ms: config.retry_max_delay_ms,
            },
        }
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    /// Connects, runs pending migrations and returns the ready storage
    pub async fn new(options: &StorageOptions) -> Result<Self> {
        if options.database_url.is_empty() {
            return Err(SnaplinkError::database_config("database_url is empty"));
        }

        let backend_name = infer_backend_from_url(&options.database_url)?;

        let db = if backend_name == "sqlite" {
            connect_sqlite(&options.database_url).await?
        } else {
            connect_generic(&options.database_url, &backend_name, options.pool_size).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name,
            retry_config: options.retry,
        };

        run_migrations(&storage.db).await?;

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn get_backend_config(&self) -> StorageConfig {
        StorageConfig {
            storage_type: self.backend_name.clone(),
        }
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn retry_config(&self) -> retry::RetryConfig {
        self.retry_config
    }

    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| SnaplinkError::database_operation(format!("Failed to begin transaction: {}", e)))
    }

    /// Liveness check used by the health endpoint
    pub async fn ping(&self) -> Result<()> {
        let db = &self.db;
        retry::with_retry("ping", self.retry_config, || async {
            db.execute_unprepared("SELECT 1").await.map(|_| ())
        })
        .await
        .map_err(|e| SnaplinkError::database_connection(format!("Database unreachable: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://data.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("links.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url(":memory:").unwrap(), "sqlite");
        assert_eq!(
            infer_backend_from_url("mariadb://u:p@localhost/db").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("postgresql://u:p@localhost/db").unwrap(),
            "postgres"
        );
        assert!(infer_backend_from_url("redis://localhost").is_err());
    }

    #[tokio::test]
    async fn test_new_rejects_empty_url() {
        let options = StorageOptions {
            database_url: String::new(),
            pool_size: 1,
            retry: retry::RetryConfig::default(),
        };
        let err = SeaOrmStorage::new(&options).await.err().unwrap();
        assert!(matches!(err, SnaplinkError::DatabaseConfig(_)));
    }
}
