//! 入站请求体
//!
//! 两种请求共享 6 字节前缀 `[ga:2][major:2][minor:2]`（大端），
//! 写请求在前缀之后附带参数字节，交给 [`tokenize`] 拆分。

use super::HEADER_LENGTH;
use super::header::Header;
use crate::args::{quote_arguments, tokenize};
use crate::error::FormatError;
use crate::types::Action;
use domain::{DatapointId, GroupAddress};
use knx_link_bus::{DatapointRegistry, DatapointType};
use std::sync::Arc;

const PREFIX_LENGTH: usize = 6;

fn decode_prefix(
    what: &'static str,
    bytes: &[u8],
    registry: &dyn DatapointRegistry,
) -> Result<(GroupAddress, Arc<dyn DatapointType>), FormatError> {
    let Some(&[ga_hi, ga_lo, major_hi, major_lo, minor_hi, minor_lo]) = bytes.get(..PREFIX_LENGTH)
    else {
        return Err(FormatError::TooShort {
            what,
            expected: PREFIX_LENGTH,
            actual: bytes.len(),
        });
    };
    let id = DatapointId::from_bytes([major_hi, major_lo, minor_hi, minor_lo]);
    Ok((
        GroupAddress::from_bytes([ga_hi, ga_lo]),
        registry.resolve(id.major, id.minor),
    ))
}

fn encode_frame(
    action: Action,
    address: GroupAddress,
    id: DatapointId,
    tail: &[u8],
) -> Result<Vec<u8>, FormatError> {
    let body_length = u8::try_from(PREFIX_LENGTH + tail.len())
        .map_err(|_| FormatError::PayloadTooLong(tail.len()))?;
    let mut frame = Vec::with_capacity(HEADER_LENGTH + usize::from(body_length));
    frame.extend_from_slice(&Header::new(action, body_length).encode());
    frame.extend_from_slice(&address.to_bytes());
    frame.extend_from_slice(&id.to_bytes());
    frame.extend_from_slice(tail);
    Ok(frame)
}

/// 读请求
#[derive(Debug, Clone)]
pub struct ReadRequestBody {
    pub group_address: GroupAddress,
    pub datapoint_type: Arc<dyn DatapointType>,
}

impl ReadRequestBody {
    /// 多余字节被忽略。
    pub fn decode(bytes: &[u8], registry: &dyn DatapointRegistry) -> Result<Self, FormatError> {
        let (group_address, datapoint_type) = decode_prefix("read request body", bytes, registry)?;
        Ok(Self {
            group_address,
            datapoint_type,
        })
    }
}

/// 写请求
#[derive(Debug, Clone)]
pub struct WriteRequestBody {
    pub group_address: GroupAddress,
    pub datapoint_type: Arc<dyn DatapointType>,
    pub arguments: Vec<String>,
}

impl WriteRequestBody {
    pub fn decode(bytes: &[u8], registry: &dyn DatapointRegistry) -> Result<Self, FormatError> {
        let (group_address, datapoint_type) =
            decode_prefix("write request body", bytes, registry)?;
        Ok(Self {
            group_address,
            datapoint_type,
            arguments: tokenize(&bytes[PREFIX_LENGTH..]),
        })
    }
}

/// 编码读请求帧（客户端侧）。
pub fn encode_read_request(address: GroupAddress, id: DatapointId) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LENGTH + PREFIX_LENGTH);
    frame.extend_from_slice(&Header::new(Action::ReadRequest, PREFIX_LENGTH as u8).encode());
    frame.extend_from_slice(&address.to_bytes());
    frame.extend_from_slice(&id.to_bytes());
    frame
}

/// 编码写请求帧（客户端侧），参数按 [`quote_arguments`] 转义。
pub fn encode_write_request<S: AsRef<str>>(
    address: GroupAddress,
    id: DatapointId,
    arguments: &[S],
) -> Result<Vec<u8>, FormatError> {
    encode_frame(Action::WriteRequest, address, id, &quote_arguments(arguments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use knx_link_bus::ReferenceRegistry;

    #[test]
    fn read_request_resolves_datapoint() {
        let registry = ReferenceRegistry::new();
        let body =
            ReadRequestBody::decode(&[0x0A, 0x03, 0x00, 0x07, 0x02, 0x58], &registry).unwrap();
        assert_eq!(body.group_address.to_string(), "1/2/3");
        assert_eq!(body.datapoint_type.id(), DatapointId::new(7, 600));
    }

    #[test]
    fn read_request_too_short() {
        let registry = ReferenceRegistry::new();
        assert_eq!(
            ReadRequestBody::decode(&[0x0A, 0x03, 0x00], &registry).unwrap_err(),
            FormatError::TooShort {
                what: "read request body",
                expected: 6,
                actual: 3
            }
        );
    }

    #[test]
    fn write_request_tokenizes_tail() {
        let registry = ReferenceRegistry::new();
        let mut bytes = vec![0x0A, 0x03, 0x00, 0x01, 0x00, 0x01];
        bytes.extend_from_slice(br#"on "two words""#);
        let body = WriteRequestBody::decode(&bytes, &registry).unwrap();
        assert_eq!(body.arguments, vec!["on", "two words"]);
        assert_eq!(body.datapoint_type.name(), "dpst-1-1");
    }

    #[test]
    fn client_encoders_produce_full_frames() {
        let address: GroupAddress = "1/2/3".parse().unwrap();
        assert_eq!(
            encode_read_request(address, DatapointId::new(7, 600)),
            vec![0x01, 0x00, 0x06, 0x0A, 0x03, 0x00, 0x07, 0x02, 0x58]
        );

        let frame = encode_write_request(address, DatapointId::new(1, 1), &["on"]).unwrap();
        assert_eq!(frame[..3], [0x01, 0x01, 0x08]);
        assert_eq!(&frame[9..], b"on");

        let long = "x".repeat(250);
        assert_eq!(
            encode_write_request(address, DatapointId::new(1, 1), &[long.as_str()]),
            Err(FormatError::PayloadTooLong(250))
        );
    }
}
