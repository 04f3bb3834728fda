//! 读取任务与分发器之间的有界队列

use crate::connection::Connection;
use knx_link_telemetry::new_request_id;
use std::sync::Arc;
use tokio::sync::mpsc;

/// 一次读取得到的字节快照及其来源连接
#[derive(Debug)]
pub struct ChannelPacket {
    pub connection: Arc<dyn Connection>,
    pub bytes: Vec<u8>,
    pub request_id: String,
}

impl ChannelPacket {
    pub fn new(connection: Arc<dyn Connection>, bytes: Vec<u8>) -> Self {
        Self {
            connection,
            bytes,
            request_id: new_request_id(),
        }
    }
}

/// 队列发送端（每个读取任务持有一份）
pub type PacketSender = mpsc::Sender<ChannelPacket>;

/// 队列接收端，由分发器独占
#[derive(Debug)]
pub struct PacketQueue {
    receiver: mpsc::Receiver<ChannelPacket>,
}

impl PacketQueue {
    /// 所有发送端释放后返回 `None`。
    pub async fn take(&mut self) -> Option<ChannelPacket> {
        self.receiver.recv().await
    }
}

/// 创建容量为 `capacity` 的队列；队列满时发送方等待。
pub fn packet_queue(capacity: usize) -> (PacketSender, PacketQueue) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (sender, PacketQueue { receiver })
}
