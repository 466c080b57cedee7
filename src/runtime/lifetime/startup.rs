use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::AppState;
use crate::config::StaticConfig;
use crate::storage::SeaOrmStorage;
use crate::storage::backend::StorageOptions;

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub state: AppState,
}

/// 安装 TLS provider 并连接数据库（含迁移）
pub async fn prepare_storage(config: &StaticConfig) -> Result<Arc<SeaOrmStorage>> {
    // 重复安装时返回 Err，可忽略
    let _ = rustls::crypto::ring::default_provider().install_default();

    let storage = SeaOrmStorage::new(&StorageOptions::from_config(&config.database))
        .await
        .context("Failed to create storage backend")?;
    info!(
        "Using storage backend: {}",
        storage.get_backend_config().storage_type
    );

    Ok(Arc::new(storage))
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = prepare_storage(config).await?;
    let state = AppState::from_config(storage.clone(), config);

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext { storage, state })
}
