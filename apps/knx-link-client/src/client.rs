//! 发送单个请求并收集回复直到最后一个数据包。

use domain::{AddressError, DatapointIdError};
use knx_link_protocol::v1::{HEADER_LENGTH, Header, ResponseBody};
use knx_link_protocol::{Action, FormatError};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// 连接、读、写的超时
pub const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// 客户端错误
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    #[error("malformed reply: {0}")]
    Format(#[from] FormatError),
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Datapoint(#[from] DatapointIdError),
}

/// 单个回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub action: Action,
    pub body: ResponseBody,
}

impl Reply {
    /// `[SUCCESS] msg` / `[ERROR] (STATUS): msg`
    pub fn render(&self) -> String {
        let message = self.body.message();
        if self.body.status.is_success() {
            format!("[SUCCESS] {message}").trim_end().to_string()
        } else {
            format!("[ERROR] ({}): {message}", self.body.status)
                .trim_end()
                .to_string()
        }
    }
}

async fn with_timeout<T>(
    wait: Duration,
    future: impl Future<Output = Result<T, io::Error>>,
) -> Result<T, ClientError> {
    timeout(wait, future)
        .await
        .map_err(|_| ClientError::Timeout(wait))?
        .map_err(ClientError::from)
}

async fn read_reply(stream: &mut TcpStream, wait: Duration) -> Result<Reply, ClientError> {
    let mut header = [0u8; HEADER_LENGTH];
    with_timeout(wait, stream.read_exact(&mut header)).await?;
    let header = Header::decode(&header)?;
    let mut body = vec![0u8; usize::from(header.body_length)];
    with_timeout(wait, stream.read_exact(&mut body)).await?;
    Ok(Reply {
        action: header.action,
        body: ResponseBody::decode(&body)?,
    })
}

/// 发送请求帧，返回直到最后一个数据包（含）的全部回复。
pub async fn exchange(addr: &str, frame: &[u8], wait: Duration) -> Result<Vec<Reply>, ClientError> {
    let mut stream = timeout(wait, TcpStream::connect(addr))
        .await
        .map_err(|_| ClientError::Timeout(wait))?
        .map_err(|source| ClientError::Connect {
            addr: addr.to_string(),
            source,
        })?;
    with_timeout(wait, stream.write_all(frame)).await?;
    debug!(%addr, bytes = frame.len(), "request sent");

    let mut replies = Vec::new();
    loop {
        let reply = read_reply(&mut stream, wait).await?;
        let last = reply.body.last_packet;
        debug!(status = %reply.body.status, last, "reply received");
        replies.push(reply);
        if last {
            return Ok(replies);
        }
    }
}
