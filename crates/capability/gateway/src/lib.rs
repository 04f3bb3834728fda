//! # KNX Link 网关模块
//!
//! 把 socket 客户端的二进制请求转发给 KNX 总线客户端，并把结果编码回写。
//!
//! ## 架构设计
//!
//! ```text
//! TcpListener ──accept──▶ SecurityAuditor ──拒绝──▶ 通知 + 关闭
//!       │
//!       ▼ 允许
//! 读取任务（每连接一个） ──ChannelPacket──▶ 有界队列
//!                                             │
//!                                             ▼
//!                                        Dispatcher ──▶ BusClient
//!                                             │
//!                                             ▼
//!                                    Connection::try_send
//! ```
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let bus = Arc::new(InMemoryBus::new());
//! let handle = Gateway::start(GatewayConfig::default(), bus).await?;
//! // ...
//! handle.shutdown().await;
//! ```

mod config;
mod connection;
mod dispatcher;
mod error;
mod listener;
mod packet;
mod security;
mod server;

pub use config::GatewayConfig;
pub use connection::{Connection, SendOutcome, TcpConnection};
pub use dispatcher::Dispatcher;
pub use error::GatewayError;
pub use listener::{ConnectionRegistry, SocketListener};
pub use packet::{ChannelPacket, PacketQueue, PacketSender, packet_queue};
pub use security::{ALLOW_LIST_KEY, SecurityAuditor, Verdict, rejection_message};
pub use server::{Gateway, GatewayHandle, ServerState};
