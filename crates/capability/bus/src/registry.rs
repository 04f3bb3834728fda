//! 参考数据点类型注册表
//!
//! 只覆盖网关自身需要的类型：
//! - DPT 1.xxx：1 位布尔，子类型决定文本标签
//! - DPT 5.xxx：8 位无符号（5.001 为 0..=100 % 缩放）
//! - DPT 7.xxx：16 位无符号（7.600 色温，单位 K）
//! - 原始字节：未知主类型的兜底，按十六进制读写

use crate::error::DatapointError;
use crate::traits::{DatapointRegistry, DatapointType};
use domain::{DatapointId, DatapointValue, RenderedValue};
use std::collections::HashMap;
use std::sync::Arc;

/// 以 `0x0A 03` 形式输出原始字节，空输入输出空串。
pub fn format_hex(bytes: &[u8]) -> String {
    let pairs = bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>();
    if pairs.is_empty() {
        String::new()
    } else {
        format!("0x{}", pairs.join(" "))
    }
}

fn first_argument<'a>(
    dpt: &dyn DatapointType,
    arguments: &'a [String],
) -> Result<&'a str, DatapointError> {
    arguments
        .first()
        .map(|arg| arg.trim())
        .filter(|arg| !arg.is_empty())
        .ok_or_else(|| DatapointError::MissingArgument(dpt.name()))
}

/// 1 位布尔类型
#[derive(Debug, Clone)]
pub struct BooleanDatapoint {
    id: DatapointId,
    off: &'static str,
    on: &'static str,
}

impl BooleanDatapoint {
    pub const fn new(id: DatapointId, off: &'static str, on: &'static str) -> Self {
        Self { id, off, on }
    }

    fn label(&self, value: bool) -> &'static str {
        if value { self.on } else { self.off }
    }
}

impl DatapointType for BooleanDatapoint {
    fn id(&self) -> DatapointId {
        self.id
    }

    fn parse(&self, arguments: &[String]) -> Result<DatapointValue, DatapointError> {
        let arg = first_argument(self, arguments)?.to_ascii_lowercase();
        let value = if arg == "1" || arg == "true" || arg == self.on {
            true
        } else if arg == "0" || arg == "false" || arg == self.off {
            false
        } else {
            return Err(DatapointError::incompatible(
                self.name(),
                format!("expected '{}' or '{}' but got '{arg}'", self.off, self.on),
            ));
        };
        Ok(DatapointValue {
            id: self.id,
            bytes: vec![u8::from(value)],
            text: self.label(value).to_string(),
        })
    }

    fn render(&self, raw: &[u8]) -> Result<RenderedValue, DatapointError> {
        match raw {
            [byte] => Ok(RenderedValue {
                text: self.label(byte & 0x01 == 0x01).to_string(),
                unit: String::new(),
            }),
            _ => Err(DatapointError::incompatible(
                self.name(),
                format!("expected 1 byte but got {}", raw.len()),
            )),
        }
    }
}

/// 无符号整数类型（1 或 2 字节，大端）
#[derive(Debug, Clone)]
pub struct UnsignedDatapoint {
    id: DatapointId,
    width: usize,
    unit: &'static str,
    percent: bool,
}

impl UnsignedDatapoint {
    pub const fn u8(id: DatapointId, unit: &'static str) -> Self {
        Self {
            id,
            width: 1,
            unit,
            percent: false,
        }
    }

    pub const fn u16(id: DatapointId, unit: &'static str) -> Self {
        Self {
            id,
            width: 2,
            unit,
            percent: false,
        }
    }

    /// 0..=100 % 映射到 0..=255。
    pub const fn percent(id: DatapointId) -> Self {
        Self {
            id,
            width: 1,
            unit: "%",
            percent: true,
        }
    }

    fn max(&self) -> u32 {
        match (self.percent, self.width) {
            (true, _) => 100,
            (false, 1) => u32::from(u8::MAX),
            _ => u32::from(u16::MAX),
        }
    }
}

impl DatapointType for UnsignedDatapoint {
    fn id(&self) -> DatapointId {
        self.id
    }

    fn unit(&self) -> &str {
        self.unit
    }

    fn parse(&self, arguments: &[String]) -> Result<DatapointValue, DatapointError> {
        let arg = first_argument(self, arguments)?;
        let value = arg.parse::<u32>().map_err(|_| {
            DatapointError::incompatible(self.name(), format!("not an unsigned number: '{arg}'"))
        })?;
        if value > self.max() {
            return Err(DatapointError::incompatible(
                self.name(),
                format!("{value} is out of range 0..={}", self.max()),
            ));
        }
        let encoded = if self.percent {
            (value * 255 + 50) / 100
        } else {
            value
        };
        let bytes = encoded.to_be_bytes()[4 - self.width..].to_vec();
        Ok(DatapointValue {
            id: self.id,
            bytes,
            text: value.to_string(),
        })
    }

    fn render(&self, raw: &[u8]) -> Result<RenderedValue, DatapointError> {
        if raw.len() != self.width {
            return Err(DatapointError::incompatible(
                self.name(),
                format!("expected {} bytes but got {}", self.width, raw.len()),
            ));
        }
        let value = raw
            .iter()
            .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte));
        let value = if self.percent {
            (value * 100 + 127) / 255
        } else {
            value
        };
        Ok(RenderedValue {
            text: value.to_string(),
            unit: self.unit.to_string(),
        })
    }
}

/// 原始字节类型，未知数据点类型的兜底。
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDatapoint;

impl DatapointType for RawDatapoint {
    fn id(&self) -> DatapointId {
        DatapointId::base(0)
    }

    fn name(&self) -> String {
        "raw".to_string()
    }

    fn parse(&self, arguments: &[String]) -> Result<DatapointValue, DatapointError> {
        if arguments.is_empty() {
            return Err(DatapointError::MissingArgument(self.name()));
        }
        let mut bytes = Vec::new();
        for arg in arguments {
            let invalid = || {
                DatapointError::incompatible(self.name(), format!("not a hex byte sequence: '{arg}'"))
            };
            let trimmed = arg.trim();
            let digits = trimmed
                .strip_prefix("0x")
                .or_else(|| trimmed.strip_prefix("0X"))
                .unwrap_or(trimmed);
            if digits.is_empty()
                || digits.len() % 2 != 0
                || !digits.bytes().all(|b| b.is_ascii_hexdigit())
            {
                return Err(invalid());
            }
            for pair in digits.as_bytes().chunks(2) {
                let pair = std::str::from_utf8(pair).map_err(|_| invalid())?;
                bytes.push(u8::from_str_radix(pair, 16).map_err(|_| invalid())?);
            }
        }
        Ok(DatapointValue {
            id: self.id(),
            text: format_hex(&bytes),
            bytes,
        })
    }

    fn render(&self, raw: &[u8]) -> Result<RenderedValue, DatapointError> {
        Ok(RenderedValue {
            text: format_hex(raw),
            unit: String::new(),
        })
    }
}

/// 参考注册表
#[derive(Debug, Clone)]
pub struct ReferenceRegistry {
    types: HashMap<DatapointId, Arc<dyn DatapointType>>,
}

impl ReferenceRegistry {
    /// 内置 DPT 1 / 5 / 7 类型。
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(BooleanDatapoint::new(DatapointId::base(1), "false", "true"));
        registry.register(BooleanDatapoint::new(DatapointId::new(1, 1), "off", "on"));
        registry.register(BooleanDatapoint::new(DatapointId::new(1, 2), "false", "true"));
        registry.register(BooleanDatapoint::new(
            DatapointId::new(1, 3),
            "disable",
            "enable",
        ));
        registry.register(UnsignedDatapoint::u8(DatapointId::base(5), ""));
        registry.register(UnsignedDatapoint::percent(DatapointId::new(5, 1)));
        registry.register(UnsignedDatapoint::u8(DatapointId::new(5, 10), "pulses"));
        registry.register(UnsignedDatapoint::u16(DatapointId::base(7), "pulses"));
        registry.register(UnsignedDatapoint::u16(DatapointId::new(7, 1), "pulses"));
        registry.register(UnsignedDatapoint::u16(DatapointId::new(7, 600), "K"));
        registry
    }

    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// 注册（或替换）一个数据点类型。
    pub fn register(&mut self, dpt: impl DatapointType + 'static) {
        self.types.insert(dpt.id(), Arc::new(dpt));
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for ReferenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DatapointRegistry for ReferenceRegistry {
    fn lookup(&self, id: DatapointId) -> Option<Arc<dyn DatapointType>> {
        self.types.get(&id).cloned()
    }
}
