//! # KNX Link Bus 模块
//!
//! 网关与 KNX 总线客户端之间的协作契约：
//!
//! - [`traits`]：`BusClient` / `StatusPool` / `DatapointType` / `DatapointRegistry`
//! - [`registry`]：参考数据点类型注册表（DPT 1 / 5 / 7 与原始字节兜底）
//! - [`in_memory`]：内存总线实现（用于本地运行和测试）
//! - [`error`]：`BusError` / `DatapointError`
//!
//! 数据点类型解析遵循三步兜底：精确子类型 → 主类型 → 原始字节类型，
//! 永不失败。

pub mod error;
pub mod in_memory;
pub mod registry;
pub mod traits;

pub use error::{BusError, DatapointError};
pub use in_memory::{BusMode, InMemoryBus, InMemoryStatusPool};
pub use registry::{BooleanDatapoint, RawDatapoint, ReferenceRegistry, UnsignedDatapoint, format_hex};
pub use traits::{BusClient, DatapointRegistry, DatapointType, StatusPool};
