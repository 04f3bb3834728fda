//! 请求分发
//!
//! 单一消费者从队列取出数据包，解码后向总线发起请求；总线调用在独立任务中完成，
//! 因此同一连接上不同请求的回复可能交错，但同一请求的回复保持顺序。
//!
//! | 请求 | 结果 | 回复 |
//! |------|------|------|
//! | 读 | 总线未确认 / 出错 | `ErrorRequest` |
//! | 读 | 确认，状态池无值 | `Success`（非最后）+ `ErrorTimeout` |
//! | 读 | 确认，值无法渲染 | `Success`（非最后）+ `ErrorIncompatibleDatapointType` |
//! | 读 | 确认，渲染成功 | `Success`（非最后）+ `Success`（文本 + 单位） |
//! | 写 | 参数无法解析 | `ErrorIncompatibleDatapointType` |
//! | 写 | 总线确认 / 未确认 | `Success` / `ErrorRequest` |

use crate::connection::{Connection, SendOutcome};
use crate::packet::{ChannelPacket, PacketQueue};
use domain::GroupAddress;
use knx_link_bus::{BusClient, format_hex};
use knx_link_protocol::v1::{
    Header, MAX_PAYLOAD_LENGTH, ReadRequestBody, ResponseBody, WriteRequestBody, body_of,
    encode_response,
};
use knx_link_protocol::{Action, FormatError, Status};
use knx_link_telemetry::{
    record_bus_failure, record_bus_request, record_format_error, record_response_failure,
    record_response_sent, record_response_skipped,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// 请求分发器
#[derive(Clone)]
pub struct Dispatcher {
    bus: Arc<dyn BusClient>,
}

impl Dispatcher {
    pub fn new(bus: Arc<dyn BusClient>) -> Self {
        Self { bus }
    }

    /// 消费队列直到收到停止信号或队列关闭。
    ///
    /// 停止信号优先于队列中尚未处理的数据包，停止后不再发起总线请求。
    pub async fn run(self, mut queue: PacketQueue, mut shutdown: watch::Receiver<bool>) {
        info!(target: "knx_link.dispatcher", "dispatcher started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let packet = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                packet = queue.take() => match packet {
                    Some(packet) => packet,
                    None => break,
                },
            };
            let request_id = packet.request_id.clone();
            let peer = packet.connection.peer();
            if let Err(error) = self.handle(packet) {
                record_format_error();
                warn!(
                    target: "knx_link.dispatcher",
                    %request_id,
                    %peer,
                    %error,
                    "packet dropped"
                );
            }
        }
        info!(target: "knx_link.dispatcher", "dispatcher stopped");
    }

    /// 解码数据包并启动对应的总线请求任务。
    ///
    /// 格式错误直接返回，不回复客户端。
    pub fn handle(&self, packet: ChannelPacket) -> Result<(), FormatError> {
        let ChannelPacket {
            connection,
            bytes,
            request_id,
        } = packet;
        if bytes.is_empty() {
            return Err(FormatError::Empty);
        }
        if !connection.is_open() {
            record_response_skipped();
            debug!(
                target: "knx_link.dispatcher",
                %request_id,
                peer = %connection.peer(),
                "connection closed, packet skipped"
            );
            return Ok(());
        }
        let header = Header::decode(&bytes)?;
        let body = body_of(&header, &bytes)?;

        match header.action {
            Action::ReadRequest => {
                let request = ReadRequestBody::decode(body, self.bus.registry())?;
                debug!(
                    target: "knx_link.dispatcher",
                    %request_id,
                    group_address = %request.group_address,
                    datapoint = %request.datapoint_type.name(),
                    "read request"
                );
                let bus = Arc::clone(&self.bus);
                tokio::spawn(async move {
                    let reply = Reply {
                        connection,
                        request_id,
                        action: Action::ReadResponse,
                    };
                    read(bus.as_ref(), &reply, request).await;
                });
            }
            Action::WriteRequest => {
                let request = WriteRequestBody::decode(body, self.bus.registry())?;
                debug!(
                    target: "knx_link.dispatcher",
                    %request_id,
                    group_address = %request.group_address,
                    datapoint = %request.datapoint_type.name(),
                    arguments = ?request.arguments,
                    "write request"
                );
                let bus = Arc::clone(&self.bus);
                tokio::spawn(async move {
                    let reply = Reply {
                        connection,
                        request_id,
                        action: Action::WriteResponse,
                    };
                    write(bus.as_ref(), &reply, request).await;
                });
            }
            other => return Err(FormatError::UnexpectedAction(other)),
        }
        Ok(())
    }
}

/// 回复目标
struct Reply {
    connection: Arc<dyn Connection>,
    request_id: String,
    action: Action,
}

impl Reply {
    async fn send(&self, body: ResponseBody) -> SendOutcome {
        let frame = match encode_response(self.action, &body) {
            Ok(frame) => frame,
            Err(error) => {
                record_response_failure();
                warn!(
                    target: "knx_link.dispatcher",
                    request_id = %self.request_id,
                    %error,
                    "could not encode response"
                );
                return SendOutcome::Failed;
            }
        };
        let outcome = self.connection.try_send(&frame).await;
        match outcome {
            SendOutcome::Sent => record_response_sent(),
            SendOutcome::Skipped => {
                record_response_skipped();
                warn!(
                    target: "knx_link.dispatcher",
                    request_id = %self.request_id,
                    peer = %self.connection.peer(),
                    status = %body.status,
                    "connection closed, response dropped"
                );
            }
            SendOutcome::Failed => record_response_failure(),
        }
        outcome
    }

    async fn message(&self, last_packet: bool, status: Status, message: String) -> SendOutcome {
        self.send(ResponseBody::with_message(
            last_packet,
            status,
            truncate(message),
        ))
        .await
    }
}

/// 截断到负载上限（按字符边界）。
fn truncate(mut message: String) -> String {
    if message.len() > MAX_PAYLOAD_LENGTH {
        let mut end = MAX_PAYLOAD_LENGTH;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message.truncate(end);
    }
    message
}

async fn reject_group_address(reply: &Reply, address: GroupAddress) {
    reply
        .message(
            true,
            Status::ErrorGroupAddress,
            format!("group address is not valid for bus requests: {address}"),
        )
        .await;
}

async fn read(bus: &dyn BusClient, reply: &Reply, request: ReadRequestBody) {
    let address = request.group_address;
    if !address.is_valid() {
        reject_group_address(reply, address).await;
        return;
    }

    record_bus_request();
    match bus.read_request(address).await {
        Ok(true) => {}
        Ok(false) => {
            record_bus_failure();
            reply
                .message(
                    true,
                    Status::ErrorRequest,
                    format!("read request not acknowledged for group address: {address}"),
                )
                .await;
            return;
        }
        Err(error) => {
            record_bus_failure();
            warn!(
                target: "knx_link.dispatcher",
                request_id = %reply.request_id,
                group_address = %address,
                %error,
                "read request failed"
            );
            reply
                .message(
                    true,
                    Status::ErrorRequest,
                    format!("read request failed for group address '{address}': {error}"),
                )
                .await;
            return;
        }
    }

    reply
        .send(ResponseBody::status_only(false, Status::Success))
        .await;

    let dpt = &request.datapoint_type;
    let Some(raw) = bus.status_pool().last_value(address) else {
        reply
            .message(
                true,
                Status::ErrorTimeout,
                format!("could not get read data for group address: {address}"),
            )
            .await;
        return;
    };
    match dpt.render(&raw) {
        Ok(value) => {
            reply
                .message(true, Status::Success, value.to_string())
                .await;
        }
        Err(error) => {
            debug!(
                target: "knx_link.dispatcher",
                request_id = %reply.request_id,
                %error,
                "read data does not match data point type"
            );
            reply
                .message(
                    true,
                    Status::ErrorIncompatibleDatapointType,
                    format!(
                        "could not parse the read data for group address '{address}' and data point type '{}': {}",
                        dpt.name(),
                        format_hex(&raw)
                    ),
                )
                .await;
        }
    }
}

async fn write(bus: &dyn BusClient, reply: &Reply, request: WriteRequestBody) {
    let address = request.group_address;
    if !address.is_valid() {
        reject_group_address(reply, address).await;
        return;
    }

    let dpt = &request.datapoint_type;
    let value = match dpt.parse(&request.arguments) {
        Ok(value) => value,
        Err(error) => {
            debug!(
                target: "knx_link.dispatcher",
                request_id = %reply.request_id,
                %error,
                "write arguments do not match data point type"
            );
            reply
                .message(
                    true,
                    Status::ErrorIncompatibleDatapointType,
                    format!(
                        "could not understand value for group address '{address}' and data point type '{}': {:?}",
                        dpt.name(),
                        request.arguments
                    ),
                )
                .await;
            return;
        }
    };

    record_bus_request();
    match bus.write_request(address, &value).await {
        Ok(true) => {
            reply
                .send(ResponseBody::status_only(true, Status::Success))
                .await;
        }
        Ok(false) => {
            record_bus_failure();
            reply
                .message(
                    true,
                    Status::ErrorRequest,
                    format!("write request not acknowledged for group address: {address}"),
                )
                .await;
        }
        Err(error) => {
            record_bus_failure();
            warn!(
                target: "knx_link.dispatcher",
                request_id = %reply.request_id,
                group_address = %address,
                %error,
                "write request failed"
            );
            reply
                .message(
                    true,
                    Status::ErrorRequest,
                    format!("write request failed for group address '{address}': {error}"),
                )
                .await;
        }
    }
}
