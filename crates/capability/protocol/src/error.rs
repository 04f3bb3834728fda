//! 协议错误类型定义

use crate::types::Action;

/// 帧格式错误
///
/// 只在入站方向由分发器记录并丢弃，不会回复给客户端。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// 空帧
    #[error("empty packet")]
    Empty,

    /// 长度不足
    #[error("{what} too short: expected at least {expected} bytes but got {actual}")]
    TooShort {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unknown action code: {0:#04x}")]
    UnknownAction(u8),

    #[error("unknown status code: {0:#04x}")]
    UnknownStatus(u8),

    #[error("unsupported protocol version: {0:#04x}")]
    UnsupportedVersion(u8),

    /// 入站帧携带了出站动作
    #[error("unexpected action for inbound packet: {0:?}")]
    UnexpectedAction(Action),

    /// 声明的 body 长度超过实际字节数
    #[error("body truncated: declared {declared} bytes but only {actual} available")]
    Truncated { declared: usize, actual: usize },

    #[error("payload too long: {0} bytes")]
    PayloadTooLong(usize),
}
