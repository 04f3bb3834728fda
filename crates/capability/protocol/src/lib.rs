//! # KNX Link 协议模块
//!
//! 网关与 socket 客户端之间的二进制协议：
//! - **参数分词**：写请求尾部的 shell 风格参数（引号 / 反斜杠转义）
//! - **v1 编解码**：Header、读写请求体、响应体
//!
//! ## 帧格式
//!
//! ```text
//! 请求: [version][action][body_length][group_address:2][major:2][minor:2][args..]
//! 响应: [version][action][body_length][flags|status][0x00][payload..]
//! ```
//!
//! 所有数值字段为大端 u16；`body_length` 为 u8，因此响应负载最多 253 字节。

mod args;
mod error;
mod types;
pub mod v1;

pub use args::{quote_arguments, tokenize};
pub use error::FormatError;
pub use types::{Action, Status};
