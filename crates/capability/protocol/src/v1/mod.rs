//! 协议版本 1 的编解码
//!
//! - [`Header`]：3 字节帧头 `[version][action][body_length]`
//! - [`ReadRequestBody`] / [`WriteRequestBody`]：入站请求体
//! - [`ResponseBody`]：出站响应体

mod header;
mod request;
mod response;

pub use header::Header;
pub use request::{ReadRequestBody, WriteRequestBody, encode_read_request, encode_write_request};
pub use response::ResponseBody;

use crate::error::FormatError;
use crate::types::Action;

/// 协议版本
pub const PROTOCOL_VERSION: u8 = 0x01;

/// 帧头长度
pub const HEADER_LENGTH: usize = 3;

/// 响应体固定部分：状态字节 + 保留字节
pub const RESPONSE_PREFIX_LENGTH: usize = 2;

/// 响应负载上限（body_length 为 u8）
pub const MAX_PAYLOAD_LENGTH: usize = u8::MAX as usize - RESPONSE_PREFIX_LENGTH;

/// 帧头之后、按 `body_length` 截取的 body。
///
/// 超出声明长度的多余字节被忽略。
pub fn body_of<'a>(header: &Header, bytes: &'a [u8]) -> Result<&'a [u8], FormatError> {
    let available = bytes.get(HEADER_LENGTH..).unwrap_or_default();
    let declared = usize::from(header.body_length);
    available
        .get(..declared)
        .ok_or(FormatError::Truncated {
            declared,
            actual: available.len(),
        })
}

/// 编码完整响应帧（帧头 + 响应体）。
pub fn encode_response(action: Action, body: &ResponseBody) -> Result<Vec<u8>, FormatError> {
    if body.payload.len() > MAX_PAYLOAD_LENGTH {
        return Err(FormatError::PayloadTooLong(body.payload.len()));
    }
    let encoded = body.encode();
    let header = Header::new(action, encoded.len() as u8);
    let mut frame = Vec::with_capacity(HEADER_LENGTH + encoded.len());
    frame.extend_from_slice(&header.encode());
    frame.extend_from_slice(&encoded);
    Ok(frame)
}
