//! 数据点类型标识与数据点值。

use std::fmt;
use std::str::FromStr;

/// 数据点类型标识解析错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("wrong data point format, expected #, #.#, dpt-# or dpst-#-#: {0}")]
pub struct DatapointIdError(pub String);

/// 数据点类型标识（主类型 + 子类型）。
///
/// 子类型为 0 时表示基础类型，文本形式为 `dpt-{major}`；
/// 否则为 `dpst-{major}-{minor}`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatapointId {
    pub major: u16,
    pub minor: u16,
}

impl DatapointId {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// 基础类型（子类型为 0）。
    pub const fn base(major: u16) -> Self {
        Self { major, minor: 0 }
    }

    pub const fn is_base(&self) -> bool {
        self.minor == 0
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        let major = self.major.to_be_bytes();
        let minor = self.minor.to_be_bytes();
        [major[0], major[1], minor[0], minor[1]]
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            major: u16::from_be_bytes([bytes[0], bytes[1]]),
            minor: u16::from_be_bytes([bytes[2], bytes[3]]),
        }
    }
}

impl fmt::Display for DatapointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_base() {
            write!(f, "dpt-{}", self.major)
        } else {
            write!(f, "dpst-{}-{}", self.major, self.minor)
        }
    }
}

impl FromStr for DatapointId {
    type Err = DatapointIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DatapointIdError(s.to_string());
        let number = |part: &str| part.parse::<u16>().map_err(|_| invalid());
        let lower = s.trim().to_ascii_lowercase();

        if let Some(rest) = lower.strip_prefix("dpst-") {
            let (major, minor) = rest.split_once('-').ok_or_else(invalid)?;
            return Ok(Self::new(number(major)?, number(minor)?));
        }
        if let Some(rest) = lower.strip_prefix("dpt-") {
            return Ok(Self::base(number(rest)?));
        }
        if let Some((major, minor)) = lower.split_once('.') {
            return Ok(Self::new(number(major)?, number(minor)?));
        }
        Ok(Self::base(number(&lower)?))
    }
}

/// 已按数据点类型编码、可写入总线的值。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatapointValue {
    pub id: DatapointId,
    /// 总线原始字节。
    pub bytes: Vec<u8>,
    /// 文本表示（用于日志）。
    pub text: String,
}

/// 原始字节按数据点类型渲染后的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedValue {
    pub text: String,
    pub unit: String,
}

impl fmt::Display for RenderedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            f.write_str(&self.text)
        } else {
            write!(f, "{} {}", self.text, self.unit)
        }
    }
}
