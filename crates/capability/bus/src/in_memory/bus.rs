//! 总线客户端内存实现

use super::status_pool::InMemoryStatusPool;
use crate::error::BusError;
use crate::registry::{ReferenceRegistry, format_hex};
use crate::traits::{BusClient, DatapointRegistry, StatusPool};
use async_trait::async_trait;
use domain::{DatapointValue, GroupAddress};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// 内存总线的应答方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusMode {
    /// 读请求仅在状态池已有值时确认，写请求总是确认
    #[default]
    AcknowledgeKnown,
    /// 读写请求总是确认
    AcknowledgeAll,
    /// 读写请求都不确认
    RejectAll,
    /// 所有请求返回 [`BusError::Unavailable`]
    Offline,
}

/// 内存总线
pub struct InMemoryBus {
    registry: Arc<dyn DatapointRegistry>,
    pool: InMemoryStatusPool,
    mode: RwLock<BusMode>,
    requests: AtomicU64,
}

impl InMemoryBus {
    /// 使用参考注册表创建
    pub fn new() -> Self {
        Self::with_registry(Arc::new(ReferenceRegistry::new()))
    }

    pub fn with_registry(registry: Arc<dyn DatapointRegistry>) -> Self {
        Self {
            registry,
            pool: InMemoryStatusPool::new(),
            mode: RwLock::new(BusMode::default()),
            requests: AtomicU64::new(0),
        }
    }

    pub fn pool(&self) -> &InMemoryStatusPool {
        &self.pool
    }

    pub fn mode(&self) -> BusMode {
        self.mode.read().map(|mode| *mode).unwrap_or_default()
    }

    pub fn set_mode(&self, mode: BusMode) {
        if let Ok(mut current) = self.mode.write() {
            *current = mode;
        }
    }

    /// 已处理的请求数（用于测试）
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusClient for InMemoryBus {
    async fn read_request(&self, address: GroupAddress) -> Result<bool, BusError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let acknowledged = match self.mode() {
            BusMode::AcknowledgeKnown => self.pool.contains(address),
            BusMode::AcknowledgeAll => true,
            BusMode::RejectAll => false,
            BusMode::Offline => {
                return Err(BusError::Unavailable("in-memory bus is offline".to_string()));
            }
        };
        debug!(
            target: "knx_link.bus",
            group_address = %address,
            acknowledged,
            "group read"
        );
        Ok(acknowledged)
    }

    async fn write_request(
        &self,
        address: GroupAddress,
        value: &DatapointValue,
    ) -> Result<bool, BusError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let acknowledged = match self.mode() {
            BusMode::AcknowledgeKnown | BusMode::AcknowledgeAll => true,
            BusMode::RejectAll => false,
            BusMode::Offline => {
                return Err(BusError::Unavailable("in-memory bus is offline".to_string()));
            }
        };
        if acknowledged {
            self.pool.set(address, value.bytes.clone());
        }
        debug!(
            target: "knx_link.bus",
            group_address = %address,
            datapoint = %value.id,
            raw = %format_hex(&value.bytes),
            acknowledged,
            "group write"
        );
        Ok(acknowledged)
    }

    fn status_pool(&self) -> &dyn StatusPool {
        &self.pool
    }

    fn registry(&self) -> &dyn DatapointRegistry {
        self.registry.as_ref()
    }
}
