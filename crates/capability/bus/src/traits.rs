//! 总线协作接口 Trait 定义
//!
//! - BusClient：异步读写请求，返回总线是否确认
//! - StatusPool：组地址最近一次原始值
//! - DatapointType：文本参数 ⇄ 总线原始字节
//! - DatapointRegistry：数据点类型查找与兜底解析

use crate::error::{BusError, DatapointError};
use crate::registry::RawDatapoint;
use async_trait::async_trait;
use domain::{DatapointId, DatapointValue, GroupAddress, RenderedValue};
use std::fmt;
use std::sync::Arc;

/// 数据点类型
pub trait DatapointType: Send + Sync + fmt::Debug {
    /// 类型标识
    fn id(&self) -> DatapointId;

    /// 诊断信息中使用的名称，默认是标识的文本形式。
    fn name(&self) -> String {
        self.id().to_string()
    }

    /// 单位，无单位时为空串。
    fn unit(&self) -> &str {
        ""
    }

    /// 将文本参数编码为总线值。
    fn parse(&self, arguments: &[String]) -> Result<DatapointValue, DatapointError>;

    /// 将总线原始字节渲染为文本。
    fn render(&self, raw: &[u8]) -> Result<RenderedValue, DatapointError>;
}

/// 数据点类型注册表
pub trait DatapointRegistry: Send + Sync {
    /// 精确查找
    fn lookup(&self, id: DatapointId) -> Option<Arc<dyn DatapointType>>;

    /// 子类型 → 主类型 → 原始字节类型。
    fn resolve(&self, major: u16, minor: u16) -> Arc<dyn DatapointType> {
        self.lookup(DatapointId::new(major, minor))
            .or_else(|| self.lookup(DatapointId::base(major)))
            .unwrap_or_else(|| Arc::new(RawDatapoint))
    }
}

/// 状态池：组地址最近一次看到的原始值
pub trait StatusPool: Send + Sync {
    fn last_value(&self, address: GroupAddress) -> Option<Vec<u8>>;
}

/// KNX 总线客户端
///
/// `Ok(true)` 表示总线确认了请求，`Ok(false)` 表示未确认。
#[async_trait]
pub trait BusClient: Send + Sync {
    /// 发起组读请求
    async fn read_request(&self, address: GroupAddress) -> Result<bool, BusError>;

    /// 发起组写请求
    async fn write_request(
        &self,
        address: GroupAddress,
        value: &DatapointValue,
    ) -> Result<bool, BusError>;

    fn status_pool(&self) -> &dyn StatusPool;

    fn registry(&self) -> &dyn DatapointRegistry;
}
