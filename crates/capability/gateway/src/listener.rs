//! 连接管线
//!
//! - accept 循环：安全检查 → 登记连接 → 为每个连接启动读取任务
//! - 读取任务：每次读取使用新的缓冲区，把实际读到的字节作为 [`ChannelPacket`] 送入队列
//! - 停止信号到达后关闭所有连接并等待读取任务结束；读取任务持有的发送端全部释放后队列返回 `None`

use crate::config::GatewayConfig;
use crate::connection::{Connection, SendOutcome, TcpConnection};
use crate::error::GatewayError;
use crate::packet::{ChannelPacket, PacketSender};
use crate::security::{SecurityAuditor, Verdict, rejection_message};
use knx_link_bus::format_hex;
use knx_link_protocol::v1::{ResponseBody, encode_response};
use knx_link_protocol::{Action, Status};
use knx_link_telemetry::{
    record_connection_accepted, record_connection_rejected, record_packet_received,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// 已接受且尚未关闭的连接
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    open: Mutex<HashMap<u64, Arc<TcpConnection>>>,
}

impl ConnectionRegistry {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn register(&self, connection: Arc<TcpConnection>) {
        if let Ok(mut open) = self.open.lock() {
            open.insert(connection.id(), connection);
        }
    }

    fn deregister(&self, id: u64) {
        if let Ok(mut open) = self.open.lock() {
            open.remove(&id);
        }
    }

    pub fn len(&self) -> usize {
        self.open.lock().map(|open| open.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn close_all(&self) {
        let connections = self
            .open
            .lock()
            .map(|mut open| open.drain().map(|(_, c)| c).collect::<Vec<_>>())
            .unwrap_or_default();
        for connection in connections {
            connection.close().await;
        }
    }
}

/// 监听 socket 与其读取任务
pub struct SocketListener {
    listener: TcpListener,
    auditor: Arc<SecurityAuditor>,
    notify_rejected: bool,
    read_buffer_size: usize,
    sender: PacketSender,
    connections: Arc<ConnectionRegistry>,
}

impl SocketListener {
    pub async fn bind(config: &GatewayConfig, sender: PacketSender) -> Result<Self, GatewayError> {
        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .map_err(|source| GatewayError::Bind {
                addr: config.listen_addr.clone(),
                source,
            })?;
        Ok(Self {
            listener,
            auditor: Arc::new(SecurityAuditor::new(&config.allowed_addresses)),
            notify_rejected: config.notify_rejected,
            read_buffer_size: config.read_buffer_size,
            sender,
            connections: Arc::new(ConnectionRegistry::default()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, GatewayError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn connections(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.connections)
    }

    /// 运行 accept 循环直到收到停止信号。
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if let Ok(addr) = self.listener.local_addr() {
            info!(target: "knx_link.gateway", %addr, "socket listener accepting connections");
        }
        let mut readers = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                Some(_) = readers.join_next(), if !readers.is_empty() => {}
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => self.admit(stream, &mut readers, &shutdown),
                    Err(error) => {
                        error!(target: "knx_link.gateway", %error, "could not accept connection");
                    }
                },
            }
        }

        info!(
            target: "knx_link.gateway",
            open = self.connections.len(),
            "socket listener stopping"
        );
        self.connections.close_all().await;
        while readers.join_next().await.is_some() {}
        debug!(target: "knx_link.gateway", "all readers finished");
    }

    fn admit(
        &self,
        stream: TcpStream,
        readers: &mut JoinSet<()>,
        shutdown: &watch::Receiver<bool>,
    ) {
        match self.auditor.check_remote(stream.peer_addr()) {
            Verdict::Allowed { peer } => {
                record_connection_accepted();
                let (reader, writer) = stream.into_split();
                let connection = Arc::new(TcpConnection::new(
                    self.connections.next_id(),
                    peer,
                    writer,
                ));
                self.connections.register(Arc::clone(&connection));
                info!(target: "knx_link.gateway", %peer, "client accepted");
                readers.spawn(read_loop(
                    connection,
                    reader,
                    self.sender.clone(),
                    self.read_buffer_size,
                    Arc::clone(&self.connections),
                    shutdown.clone(),
                ));
            }
            verdict => {
                record_connection_rejected();
                if let Verdict::Rejected { address } = verdict {
                    warn!(target: "knx_link.gateway", peer = %address, "client rejected");
                }
                tokio::spawn(refuse(stream, verdict, self.notify_rejected));
            }
        }
    }
}

/// 处理未通过安全检查的连接：按配置发送一次拒绝通知，然后关闭。
///
/// 远端地址无法解析时不发送通知。
pub(crate) async fn refuse<S>(mut stream: S, verdict: Verdict, notify: bool) -> SendOutcome
where
    S: AsyncWrite + Unpin,
{
    match verdict {
        Verdict::Rejected { address } if notify => send_rejection(&mut stream, address).await,
        _ => {
            let _ = stream.shutdown().await;
            SendOutcome::Skipped
        }
    }
}

/// 发送一次拒绝通知后关闭写方向（尽力而为）。
pub(crate) async fn send_rejection<S>(stream: &mut S, address: SocketAddr) -> SendOutcome
where
    S: AsyncWrite + Unpin,
{
    let body = ResponseBody::with_message(
        true,
        Status::ErrorClientNotAuthorized,
        rejection_message(address.ip()),
    );
    let outcome = match encode_response(Action::GeneralMessage, &body) {
        Ok(frame) => match stream.write_all(&frame).await {
            Ok(()) => SendOutcome::Sent,
            Err(error) => {
                debug!(
                    target: "knx_link.gateway",
                    peer = %address,
                    %error,
                    "rejection notice not delivered"
                );
                SendOutcome::Failed
            }
        },
        Err(error) => {
            error!(target: "knx_link.gateway", %error, "could not encode rejection notice");
            SendOutcome::Failed
        }
    };
    let _ = stream.shutdown().await;
    outcome
}

async fn read_loop(
    connection: Arc<TcpConnection>,
    mut reader: OwnedReadHalf,
    sender: PacketSender,
    buffer_size: usize,
    connections: Arc<ConnectionRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    let peer = connection.peer();
    loop {
        let mut buffer = vec![0u8; buffer_size];
        let read = tokio::select! {
            _ = shutdown.changed() => break,
            read = reader.read(&mut buffer) => read,
        };
        match read {
            Ok(0) => {
                debug!(target: "knx_link.gateway", %peer, "client says bye");
                break;
            }
            Ok(n) => {
                buffer.truncate(n);
                record_packet_received();
                debug!(
                    target: "knx_link.gateway",
                    %peer,
                    bytes = %format_hex(&buffer),
                    "receiving packet"
                );
                let packet = ChannelPacket::new(connection.clone(), buffer);
                tokio::select! {
                    _ = shutdown.changed() => break,
                    sent = sender.send(packet) => if sent.is_err() {
                        break;
                    },
                }
            }
            Err(error) => {
                warn!(target: "knx_link.gateway", %peer, %error, "could not read from connection");
                break;
            }
        }
    }
    connections.deregister(connection.id());
    connection.close().await;
}
