//! 状态池内存实现

use crate::traits::StatusPool;
use domain::GroupAddress;
use std::collections::HashMap;
use std::sync::RwLock;

/// 状态池内存存储
#[derive(Debug, Default)]
pub struct InMemoryStatusPool {
    values: RwLock<HashMap<GroupAddress, Vec<u8>>>,
}

impl InMemoryStatusPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入（覆盖）组地址的原始值
    pub fn set(&self, address: GroupAddress, raw: impl Into<Vec<u8>>) {
        if let Ok(mut values) = self.values.write() {
            values.insert(address, raw.into());
        }
    }

    pub fn remove(&self, address: GroupAddress) -> Option<Vec<u8>> {
        self.values
            .write()
            .ok()
            .and_then(|mut values| values.remove(&address))
    }

    pub fn contains(&self, address: GroupAddress) -> bool {
        self.values
            .read()
            .map(|values| values.contains_key(&address))
            .unwrap_or(false)
    }

    /// 已知组地址数量（用于测试）
    pub fn len(&self) -> usize {
        self.values.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StatusPool for InMemoryStatusPool {
    fn last_value(&self, address: GroupAddress) -> Option<Vec<u8>> {
        self.values
            .read()
            .ok()
            .and_then(|values| values.get(&address).cloned())
    }
}
