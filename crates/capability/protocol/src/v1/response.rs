use super::RESPONSE_PREFIX_LENGTH;
use crate::error::FormatError;
use crate::types::Status;

const LAST_PACKET_FLAG: u8 = 0x80;
const STATUS_MASK: u8 = 0x0F;

/// 响应体 `[flags|status][reserved][payload..]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBody {
    pub last_packet: bool,
    pub status: Status,
    pub payload: Vec<u8>,
}

impl ResponseBody {
    pub fn new(last_packet: bool, status: Status, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            last_packet,
            status,
            payload: payload.into(),
        }
    }

    /// 无负载
    pub fn status_only(last_packet: bool, status: Status) -> Self {
        Self::new(last_packet, status, Vec::new())
    }

    /// 文本负载（UTF-8）；空白文本编码为空负载。
    pub fn with_message(last_packet: bool, status: Status, message: impl AsRef<str>) -> Self {
        let message = message.as_ref();
        if message.trim().is_empty() {
            Self::status_only(last_packet, status)
        } else {
            Self::new(last_packet, status, message.as_bytes())
        }
    }

    /// 负载按 UTF-8 解读
    pub fn message(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut flags = self.status.code();
        if self.last_packet {
            flags |= LAST_PACKET_FLAG;
        }
        let mut bytes = Vec::with_capacity(RESPONSE_PREFIX_LENGTH + self.payload.len());
        bytes.push(flags);
        bytes.push(0x00);
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let Some(&[flags, _reserved]) = bytes.get(..RESPONSE_PREFIX_LENGTH) else {
            return Err(FormatError::TooShort {
                what: "response body",
                expected: RESPONSE_PREFIX_LENGTH,
                actual: bytes.len(),
            });
        };
        Ok(Self {
            last_packet: flags & LAST_PACKET_FLAG == LAST_PACKET_FLAG,
            status: Status::try_from(flags & STATUS_MASK)?,
            payload: bytes[RESPONSE_PREFIX_LENGTH..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v1::MAX_PAYLOAD_LENGTH;

    #[test]
    fn encodes_flags_and_status() {
        let body = ResponseBody::with_message(false, Status::ErrorTimeout, "late");
        assert_eq!(body.encode(), b"\x03\x00late".to_vec());

        let body = ResponseBody::status_only(true, Status::ErrorRequest);
        assert_eq!(body.encode(), vec![0x82, 0x00]);
    }

    #[test]
    fn decodes_what_it_encodes() {
        let body = ResponseBody::with_message(true, Status::ErrorClientNotAuthorized, "denied");
        let decoded = ResponseBody::decode(&body.encode()).unwrap();
        assert_eq!(decoded, body);
        assert_eq!(decoded.message(), "denied");
    }

    #[test]
    fn every_status_and_flag_survives_encoding() {
        let statuses = [
            Status::Success,
            Status::Error,
            Status::ErrorRequest,
            Status::ErrorTimeout,
            Status::ErrorGroupAddress,
            Status::ErrorIncompatibleDatapointType,
            Status::ErrorClientNotAuthorized,
        ];
        let payloads = [
            Vec::new(),
            vec![0x41],
            vec![b'x'; MAX_PAYLOAD_LENGTH],
            vec![0xFF, 0xFE, 0x00, 0xC3],
        ];
        for status in statuses {
            for last_packet in [true, false] {
                for payload in &payloads {
                    let body = ResponseBody::new(last_packet, status, payload.clone());
                    let encoded = body.encode();
                    assert_eq!(encoded[0] & 0x70, 0, "reserved flag bits for {status}");
                    assert_eq!(encoded[1], 0x00);
                    assert_eq!(ResponseBody::decode(&encoded), Ok(body));
                }
            }
        }
    }

    #[test]
    fn blank_message_is_empty_payload() {
        let body = ResponseBody::with_message(true, Status::Success, "  ");
        assert!(body.payload.is_empty());
    }

    #[test]
    fn decode_errors() {
        assert!(matches!(
            ResponseBody::decode(&[0x80]),
            Err(FormatError::TooShort { actual: 1, .. })
        ));
        assert_eq!(
            ResponseBody::decode(&[0x8F, 0x00]),
            Err(FormatError::UnknownStatus(0x0F))
        );
    }
}
