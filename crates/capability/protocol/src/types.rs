//! 协议动作与状态码

use crate::error::FormatError;
use std::fmt;

/// 帧动作（一个字节）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ReadRequest,
    WriteRequest,
    ReadResponse,
    WriteResponse,
    /// 与具体请求无关的通知（例如拒绝连接）
    GeneralMessage,
}

impl Action {
    pub const fn code(self) -> u8 {
        match self {
            Self::ReadRequest => 0x00,
            Self::WriteRequest => 0x01,
            Self::ReadResponse => 0x02,
            Self::WriteResponse => 0x03,
            Self::GeneralMessage => 0x04,
        }
    }

    /// 客户端 → 网关方向
    pub const fn is_request(self) -> bool {
        matches!(self, Self::ReadRequest | Self::WriteRequest)
    }
}

impl TryFrom<u8> for Action {
    type Error = FormatError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00 => Ok(Self::ReadRequest),
            0x01 => Ok(Self::WriteRequest),
            0x02 => Ok(Self::ReadResponse),
            0x03 => Ok(Self::WriteResponse),
            0x04 => Ok(Self::GeneralMessage),
            other => Err(FormatError::UnknownAction(other)),
        }
    }
}

/// 响应状态码（低 4 位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    Error,
    ErrorRequest,
    ErrorTimeout,
    ErrorGroupAddress,
    ErrorIncompatibleDatapointType,
    ErrorClientNotAuthorized,
}

impl Status {
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0x00,
            Self::Error => 0x01,
            Self::ErrorRequest => 0x02,
            Self::ErrorTimeout => 0x03,
            Self::ErrorGroupAddress => 0x04,
            Self::ErrorIncompatibleDatapointType => 0x05,
            Self::ErrorClientNotAuthorized => 0x06,
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
            Self::ErrorRequest => "ERROR_REQUEST",
            Self::ErrorTimeout => "ERROR_TIMEOUT",
            Self::ErrorGroupAddress => "ERROR_GROUP_ADDRESS",
            Self::ErrorIncompatibleDatapointType => "ERROR_INCOMPATIBLE_DATA_POINT_TYPE",
            Self::ErrorClientNotAuthorized => "ERROR_CLIENT_NOT_AUTHORIZED",
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = FormatError;

    fn try_from(code: u8) -> Result<Status, FormatError> {
        match code {
            0x00 => Ok(Status::Success),
            0x01 => Ok(Status::Error),
            0x02 => Ok(Status::ErrorRequest),
            0x03 => Ok(Status::ErrorTimeout),
            0x04 => Ok(Status::ErrorGroupAddress),
            0x05 => Ok(Status::ErrorIncompatibleDatapointType),
            0x06 => Ok(Status::ErrorClientNotAuthorized),
            other => Err(FormatError::UnknownStatus(other)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
