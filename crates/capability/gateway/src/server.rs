//! 网关生命周期
//!
//! `Stopped → Starting → Running → Stopping → Stopped`，通过 `watch` 通道对外可见。
//! 句柄持有 I/O 任务与分发任务，停止信号同时送达两者：I/O 关闭全部连接，
//! 分发器丢弃队列中剩余的数据包。已发出的总线请求不会被取消。

use crate::config::GatewayConfig;
use crate::dispatcher::Dispatcher;
use crate::error::GatewayError;
use crate::listener::{ConnectionRegistry, SocketListener};
use crate::packet::packet_queue;
use knx_link_bus::BusClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 服务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// 网关入口
pub struct Gateway;

impl Gateway {
    /// 绑定监听地址并启动 I/O 循环与分发器，进入 Running 后返回。
    pub async fn start(
        config: GatewayConfig,
        bus: Arc<dyn BusClient>,
    ) -> Result<GatewayHandle, GatewayError> {
        config.validate()?;
        let (state, _) = watch::channel(ServerState::Stopped);
        state.send_replace(ServerState::Starting);

        let (sender, queue) = packet_queue(config.queue_capacity);
        let listener = match SocketListener::bind(&config, sender).await {
            Ok(listener) => listener,
            Err(err) => {
                state.send_replace(ServerState::Stopped);
                return Err(err);
            }
        };
        let local_addr = listener.local_addr()?;
        let connections = listener.connections();

        let (shutdown, shutdown_rx) = watch::channel(false);
        let io_task = tokio::spawn(listener.run(shutdown_rx.clone()));
        let dispatcher_task = tokio::spawn(Dispatcher::new(bus).run(queue, shutdown_rx));

        state.send_replace(ServerState::Running);
        info!(
            target: "knx_link.gateway",
            %local_addr,
            queue_capacity = config.queue_capacity,
            read_buffer_size = config.read_buffer_size,
            "gateway started"
        );

        Ok(GatewayHandle {
            local_addr,
            state,
            shutdown,
            connections,
            io_task,
            dispatcher_task,
        })
    }
}

/// 运行中网关的句柄
pub struct GatewayHandle {
    local_addr: SocketAddr,
    state: watch::Sender<ServerState>,
    shutdown: watch::Sender<bool>,
    connections: Arc<ConnectionRegistry>,
    io_task: JoinHandle<()>,
    dispatcher_task: JoinHandle<()>,
}

impl GatewayHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// 当前打开的客户端连接数
    pub fn open_connections(&self) -> usize {
        self.connections.len()
    }

    /// 停止网关并等待两个任务结束。
    pub async fn shutdown(self) {
        self.state.send_replace(ServerState::Stopping);
        self.shutdown.send_replace(true);

        if let Err(err) = self.io_task.await {
            error!(target: "knx_link.gateway", error = %err, "socket listener task failed");
        }
        if let Err(err) = self.dispatcher_task.await {
            error!(target: "knx_link.gateway", error = %err, "dispatcher task failed");
        }

        self.state.send_replace(ServerState::Stopped);
        info!(target: "knx_link.gateway", local_addr = %self.local_addr, "gateway stopped");
    }
}
