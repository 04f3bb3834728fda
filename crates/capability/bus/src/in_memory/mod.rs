//! 内存总线实现
//!
//! 没有 KNXnet/IP 传输时使用，也是网关测试的总线替身：
//! - InMemoryStatusPool：`RwLock<HashMap>` 保存各组地址最近的原始值
//! - InMemoryBus：按 [`BusMode`] 应答读写请求，写请求成功后更新状态池

pub mod bus;
pub mod status_pool;

pub use bus::*;
pub use status_pool::*;
