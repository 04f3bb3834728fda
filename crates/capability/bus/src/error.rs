//! 总线与数据点类型错误。

/// 总线客户端调用失败。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("bus unavailable: {0}")]
    Unavailable(String),
    #[error("bus request failed: {0}")]
    Request(String),
}

/// 数据点类型编解码失败。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatapointError {
    #[error("value incompatible with data point type '{id}': {reason}")]
    Incompatible { id: String, reason: String },
    #[error("missing argument for data point type '{0}'")]
    MissingArgument(String),
}

impl DatapointError {
    pub fn incompatible(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Incompatible {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
