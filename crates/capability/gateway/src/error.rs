//! 网关错误类型定义

/// 网关启动与运行错误
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 监听地址绑定失败
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 配置非法
    #[error("config error: {0}")]
    Config(String),
}
