use super::{HEADER_LENGTH, PROTOCOL_VERSION};
use crate::error::FormatError;
use crate::types::Action;

/// 帧头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub action: Action,
    pub body_length: u8,
}

impl Header {
    pub const fn new(action: Action, body_length: u8) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            action,
            body_length,
        }
    }

    /// 解码帧头：先校验长度，再校验版本，最后解析动作。
    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let Some(&[version, action, body_length]) = bytes.get(..HEADER_LENGTH) else {
            return Err(FormatError::TooShort {
                what: "header",
                expected: HEADER_LENGTH,
                actual: bytes.len(),
            });
        };
        if version != PROTOCOL_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }
        Ok(Self {
            version,
            action: Action::try_from(action)?,
            body_length,
        })
    }

    pub const fn encode(&self) -> [u8; HEADER_LENGTH] {
        [self.version, self.action.code(), self.body_length]
    }
}
