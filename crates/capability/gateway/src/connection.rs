//! 客户端连接
//!
//! 连接由读取任务（EOF / 关闭时关闭连接）与分发器（写回复）共享。
//! 写操作经 `tokio::sync::Mutex` 串行化，写前先检查连接是否仍然打开。

use async_trait::async_trait;
use knx_link_bus::format_hex;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// 一次发送的结果，调用方可以忽略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// 连接已关闭，未发送
    Skipped,
    /// 写入出错
    Failed,
}

/// 可回写响应的连接
#[async_trait]
pub trait Connection: Send + Sync + fmt::Debug {
    fn peer(&self) -> SocketAddr;

    fn is_open(&self) -> bool;

    /// 发送完整帧；从不 panic，错误只记录日志。
    async fn try_send(&self, frame: &[u8]) -> SendOutcome;

    /// 关闭连接，可重复调用。
    async fn close(&self);
}

/// TCP 连接（写半部）
#[derive(Debug)]
pub struct TcpConnection {
    id: u64,
    peer: SocketAddr,
    open: AtomicBool,
    writer: Mutex<Option<OwnedWriteHalf>>,
}

impl TcpConnection {
    pub fn new(id: u64, peer: SocketAddr, writer: OwnedWriteHalf) -> Self {
        Self {
            id,
            peer,
            open: AtomicBool::new(true),
            writer: Mutex::new(Some(writer)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

#[async_trait]
impl Connection for TcpConnection {
    fn peer(&self) -> SocketAddr {
        self.peer
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    async fn try_send(&self, frame: &[u8]) -> SendOutcome {
        if !self.is_open() {
            return SendOutcome::Skipped;
        }
        let mut writer = self.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            return SendOutcome::Skipped;
        };
        match stream.write_all(frame).await {
            Ok(()) => {
                debug!(
                    target: "knx_link.gateway",
                    peer = %self.peer,
                    frame = %format_hex(frame),
                    "written to connection"
                );
                SendOutcome::Sent
            }
            Err(error) => {
                warn!(
                    target: "knx_link.gateway",
                    peer = %self.peer,
                    %error,
                    "could not write to connection"
                );
                SendOutcome::Failed
            }
        }
    }

    async fn close(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(mut stream) = self.writer.lock().await.take() {
            let _ = stream.shutdown().await;
        }
        debug!(target: "knx_link.gateway", peer = %self.peer, id = self.id, "connection closed");
    }
}
