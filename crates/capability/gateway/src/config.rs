//! 网关配置
//!
//! 可由 [`AppConfig`] 转换得到，也可以直接从 JSON 读取：
//!
//! ```json
//! { "listen_addr": "0.0.0.0:3672", "allowed_addresses": ["192.168.1.20"] }
//! ```

use crate::error::GatewayError;
use knx_link_config::{
    AppConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_READ_BUFFER_SIZE, DEFAULT_SERVER_PORT,
    MIN_READ_BUFFER_SIZE,
};
use serde::{Deserialize, Serialize};

/// 网关配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// 监听地址 `host:port`，端口为 0 时由系统分配
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// 允许访问的远端 IP（环回地址总是允许）
    #[serde(default)]
    pub allowed_addresses: Vec<String>,
    /// 拒绝连接前是否发送通知
    #[serde(default = "default_notify_rejected")]
    pub notify_rejected: bool,
    /// 分发队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// 单次读取的缓冲区大小
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

fn default_listen_addr() -> String {
    format!("0.0.0.0:{DEFAULT_SERVER_PORT}")
}

fn default_notify_rejected() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_read_buffer_size() -> usize {
    DEFAULT_READ_BUFFER_SIZE
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            allowed_addresses: Vec::new(),
            notify_rejected: default_notify_rejected(),
            queue_capacity: default_queue_capacity(),
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

impl GatewayConfig {
    /// 从 JSON 配置字符串解析
    pub fn from_json(json: &str) -> Result<Self, GatewayError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| GatewayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.queue_capacity == 0 {
            return Err(GatewayError::Config(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }
        if self.read_buffer_size < MIN_READ_BUFFER_SIZE {
            return Err(GatewayError::Config(format!(
                "read_buffer_size must be at least {MIN_READ_BUFFER_SIZE} but was {}",
                self.read_buffer_size
            )));
        }
        Ok(())
    }
}

impl From<&AppConfig> for GatewayConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            listen_addr: config.listen_addr(),
            allowed_addresses: config.allowed_addresses.clone(),
            notify_rejected: config.notify_rejected,
            queue_capacity: config.queue_capacity,
            read_buffer_size: config.read_buffer_size,
        }
    }
}
