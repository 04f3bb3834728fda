//! KNX 组地址。
//!
//! 线上统一使用 16 位原始值（大端两字节），文本形式支持：
//! - 三级 `main/middle/sub`（5/3/8 位），也是默认显示格式
//! - 二级 `main/sub`（5/11 位）
//! - 自由格式 `n`（1..=65535）

use std::fmt;
use std::str::FromStr;

/// 组地址解析错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("group address is empty")]
    Empty,
    #[error("invalid group address: {0}")]
    Invalid(String),
    #[error("main group must be between 0 and 31 but was: {0}")]
    MainOverflow(u32),
    #[error("middle group must be between 0 and 7 but was: {0}")]
    MiddleOverflow(u32),
    #[error("sub group out of range: {0}")]
    SubOverflow(u32),
}

/// 组地址（原始 16 位值）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupAddress(u16);

impl GroupAddress {
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }

    /// 三级地址，`0/0/0` 不允许。
    pub fn three_level(main: u8, middle: u8, sub: u8) -> Result<Self, AddressError> {
        if main > 31 {
            return Err(AddressError::MainOverflow(main.into()));
        }
        if middle > 7 {
            return Err(AddressError::MiddleOverflow(middle.into()));
        }
        if main == 0 && middle == 0 && sub == 0 {
            return Err(AddressError::Invalid("0/0/0".to_string()));
        }
        Ok(Self(
            (u16::from(main) << 11) | (u16::from(middle) << 8) | u16::from(sub),
        ))
    }

    /// 二级地址，`0/0` 不允许。
    pub fn two_level(main: u8, sub: u16) -> Result<Self, AddressError> {
        if main > 31 {
            return Err(AddressError::MainOverflow(main.into()));
        }
        if sub > 2047 {
            return Err(AddressError::SubOverflow(sub.into()));
        }
        if main == 0 && sub == 0 {
            return Err(AddressError::Invalid("0/0".to_string()));
        }
        Ok(Self((u16::from(main) << 11) | sub))
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub const fn main(self) -> u8 {
        (self.0 >> 11) as u8
    }

    pub const fn middle(self) -> u8 {
        ((self.0 >> 8) & 0x07) as u8
    }

    pub const fn sub(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// 原始值 0 对应 `0/0/0`，不能用于总线请求。
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

impl FromStr for GroupAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        let parts = s
            .split('/')
            .map(|part| {
                part.trim()
                    .parse::<u32>()
                    .map_err(|_| AddressError::Invalid(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [main, middle, sub] => {
                if *main > 31 {
                    return Err(AddressError::MainOverflow(*main));
                }
                if *middle > 7 {
                    return Err(AddressError::MiddleOverflow(*middle));
                }
                if *sub > 255 {
                    return Err(AddressError::SubOverflow(*sub));
                }
                Self::three_level(*main as u8, *middle as u8, *sub as u8)
            }
            [main, sub] => {
                if *main > 31 {
                    return Err(AddressError::MainOverflow(*main));
                }
                if *sub > 2047 {
                    return Err(AddressError::SubOverflow(*sub));
                }
                Self::two_level(*main as u8, *sub as u16)
            }
            [free] => match u16::try_from(*free) {
                Ok(0) => Err(AddressError::Invalid(s.to_string())),
                Ok(raw) => Ok(Self(raw)),
                Err(_) => Err(AddressError::SubOverflow(*free)),
            },
            _ => Err(AddressError::Invalid(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_level_bytes() {
        let address: GroupAddress = "1/2/3".parse().unwrap();
        assert_eq!(address.to_bytes(), [0x0A, 0x03]);
        assert_eq!(address.to_string(), "1/2/3");
    }

    #[test]
    fn two_level_bytes() {
        let address: GroupAddress = "20/1223".parse().unwrap();
        assert_eq!(address.to_bytes(), [0xA4, 0xC7]);
    }

    #[test]
    fn free_level_matches_raw() {
        let address: GroupAddress = "2563".parse().unwrap();
        assert_eq!(address, GroupAddress::from_bytes([0x0A, 0x03]));
    }

    #[test]
    fn rejects_out_of_range_parts() {
        assert_eq!(
            "0/0/0".parse::<GroupAddress>(),
            Err(AddressError::Invalid("0/0/0".to_string()))
        );
        assert_eq!(
            "32/2/3".parse::<GroupAddress>(),
            Err(AddressError::MainOverflow(32))
        );
        assert_eq!(
            "1/8/3".parse::<GroupAddress>(),
            Err(AddressError::MiddleOverflow(8))
        );
        assert_eq!(
            "1/2/256".parse::<GroupAddress>(),
            Err(AddressError::SubOverflow(256))
        );
        assert_eq!(
            "0/2048".parse::<GroupAddress>(),
            Err(AddressError::SubOverflow(2048))
        );
        assert!(matches!(
            "1/2/3/4".parse::<GroupAddress>(),
            Err(AddressError::Invalid(_))
        ));
        assert_eq!("".parse::<GroupAddress>(), Err(AddressError::Empty));
    }

    #[test]
    fn zero_is_not_valid() {
        assert!(!GroupAddress::from_raw(0).is_valid());
        assert!(GroupAddress::from_raw(1).is_valid());
    }
}
