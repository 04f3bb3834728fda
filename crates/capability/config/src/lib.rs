//! 应用运行配置加载。
//!
//! 所有配置来自 `KNX_LINK_*` 环境变量（二进制启动时先加载 `.env`），
//! 未设置或为空的变量使用默认值。

use std::env;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// 默认监听端口
pub const DEFAULT_SERVER_PORT: u16 = 3672;
/// KNXnet/IP 默认端口
pub const DEFAULT_KNX_PORT: u16 = 3671;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_READ_BUFFER_SIZE: usize = 512;
/// 读缓冲区下限（至少容纳帧头与请求前缀）
pub const MIN_READ_BUFFER_SIZE: usize = 16;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// KNX 通信模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KnxMode {
    #[default]
    Tunneling,
    Routing,
}

impl KnxMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tunneling => "tunneling",
            Self::Routing => "routing",
        }
    }
}

impl fmt::Display for KnxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnxMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tunneling" => Ok(Self::Tunneling),
            "routing" => Ok(Self::Routing),
            _ => Err(format!("mode is not supported: {s}")),
        }
    }
}

/// KNXnet/IP 连接配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnxConfig {
    pub mode: KnxMode,
    /// 仅对 tunneling 有效
    pub nat: bool,
    /// 未设置时使用自动发现
    pub address: Option<IpAddr>,
    pub port: u16,
}

impl KnxConfig {
    pub fn uses_discovery(&self) -> bool {
        self.address.is_none()
    }
}

impl Default for KnxConfig {
    fn default() -> Self {
        Self {
            mode: KnxMode::default(),
            nat: false,
            address: None,
            port: DEFAULT_KNX_PORT,
        }
    }
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_addr: String,
    pub server_port: u16,
    pub allowed_addresses: Vec<String>,
    pub notify_rejected: bool,
    pub queue_capacity: usize,
    pub read_buffer_size: usize,
    pub knx: KnxConfig,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取配置（测试中避免修改进程环境）。
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);
        let server_addr = vars
            .optional("KNX_LINK_SERVER_ADDR")
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port = vars.parse_with_default("KNX_LINK_SERVER_PORT", DEFAULT_SERVER_PORT)?;
        let allowed_addresses = vars
            .optional("KNX_LINK_ALLOWED_ADDRESSES")
            .map(|value| split_list(&value))
            .unwrap_or_default();
        let notify_rejected = vars.bool_with_default("KNX_LINK_NOTIFY_REJECTED", true);
        let queue_capacity =
            vars.parse_with_default("KNX_LINK_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?;
        if queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "KNX_LINK_QUEUE_CAPACITY".to_string(),
                queue_capacity.to_string(),
            ));
        }
        let read_buffer_size =
            vars.parse_with_default("KNX_LINK_READ_BUFFER_SIZE", DEFAULT_READ_BUFFER_SIZE)?;
        if read_buffer_size < MIN_READ_BUFFER_SIZE {
            return Err(ConfigError::Invalid(
                "KNX_LINK_READ_BUFFER_SIZE".to_string(),
                read_buffer_size.to_string(),
            ));
        }
        let knx = KnxConfig {
            mode: vars.parse_with_default("KNX_LINK_KNX_MODE", KnxMode::default())?,
            nat: vars.bool_with_default("KNX_LINK_KNX_NAT", false),
            address: vars.parse_optional("KNX_LINK_KNX_ADDRESS")?,
            port: vars.parse_with_default("KNX_LINK_KNX_PORT", DEFAULT_KNX_PORT)?,
        };

        Ok(Self {
            server_addr,
            server_port,
            allowed_addresses,
            notify_rejected,
            queue_capacity,
            read_buffer_size,
            knx,
        })
    }

    /// 监听地址 `host:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_addr, self.server_port)
    }
}

/// 逗号分隔列表，去除空白与空项。
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        match (self.0)(key) {
            Some(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
            _ => None,
        }
    }

    fn parse_optional<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.optional(key) {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::Invalid(key.to_string(), value)),
            None => Ok(None),
        }
    }

    fn parse_with_default<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.parse_optional(key)?.unwrap_or(default))
    }

    fn bool_with_default(&self, key: &str, default: bool) -> bool {
        match self.optional(key) {
            Some(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
            None => default,
        }
    }
}
