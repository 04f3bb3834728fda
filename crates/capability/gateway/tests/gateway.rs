use domain::{DatapointId, GroupAddress};
use knx_link_bus::{BusMode, InMemoryBus};
use knx_link_gateway::{Gateway, GatewayConfig, GatewayError, GatewayHandle, ServerState};
use knx_link_protocol::v1::{
    HEADER_LENGTH, Header, ResponseBody, encode_read_request, encode_write_request,
};
use knx_link_protocol::{Action, Status};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn address() -> GroupAddress {
    "1/2/3".parse().expect("group address")
}

async fn start(bus: Arc<InMemoryBus>) -> GatewayHandle {
    let config = GatewayConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        ..GatewayConfig::default()
    };
    Gateway::start(config, bus).await.expect("gateway")
}

async fn connect(handle: &GatewayHandle) -> TcpStream {
    TcpStream::connect(handle.local_addr())
        .await
        .expect("connect")
}

async fn read_reply(stream: &mut TcpStream) -> (Action, ResponseBody) {
    timeout(WAIT, async {
        let mut header = [0u8; HEADER_LENGTH];
        stream.read_exact(&mut header).await.expect("header");
        let header = Header::decode(&header).expect("decode header");
        let mut body = vec![0u8; usize::from(header.body_length)];
        stream.read_exact(&mut body).await.expect("body");
        (header.action, ResponseBody::decode(&body).expect("decode body"))
    })
    .await
    .expect("reply in time")
}

async fn read_until_last(stream: &mut TcpStream) -> Vec<ResponseBody> {
    let mut replies = Vec::new();
    loop {
        let (_, body) = read_reply(stream).await;
        let last = body.last_packet;
        replies.push(body);
        if last {
            return replies;
        }
    }
}

#[tokio::test]
async fn read_request_returns_rendered_value() {
    let bus = Arc::new(InMemoryBus::new());
    bus.pool().set(address(), 4711u16.to_be_bytes());
    let handle = start(bus).await;
    assert_eq!(handle.state(), ServerState::Running);

    let mut stream = connect(&handle).await;
    stream
        .write_all(&encode_read_request(address(), DatapointId::new(7, 600)))
        .await
        .expect("write");

    let (action, first) = read_reply(&mut stream).await;
    assert_eq!(action, Action::ReadResponse);
    assert_eq!(first, ResponseBody::status_only(false, Status::Success));
    let (_, last) = read_reply(&mut stream).await;
    assert_eq!(last, ResponseBody::with_message(true, Status::Success, "4711 K"));

    handle.shutdown().await;
}

#[tokio::test]
async fn write_request_with_incompatible_value() {
    let bus = Arc::new(InMemoryBus::new());
    let handle = start(Arc::clone(&bus)).await;

    let mut stream = connect(&handle).await;
    let frame = encode_write_request(address(), DatapointId::new(1, 1), &["foobar"])
        .expect("frame");
    stream.write_all(&frame).await.expect("write");

    let replies = read_until_last(&mut stream).await;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].status, Status::ErrorIncompatibleDatapointType);
    let message = replies[0].message();
    assert!(message.contains("1/2/3"));
    assert!(message.contains("dpst-1-1"));
    assert!(bus.pool().is_empty());

    handle.shutdown().await;
}

#[tokio::test]
async fn written_value_can_be_read_back() {
    let bus = Arc::new(InMemoryBus::new());
    let handle = start(bus).await;
    let mut stream = connect(&handle).await;

    let frame = encode_write_request(address(), DatapointId::new(5, 1), &["100"]).expect("frame");
    stream.write_all(&frame).await.expect("write");
    let (action, written) = read_reply(&mut stream).await;
    assert_eq!(action, Action::WriteResponse);
    assert_eq!(written, ResponseBody::status_only(true, Status::Success));

    stream
        .write_all(&encode_read_request(address(), DatapointId::new(5, 1)))
        .await
        .expect("write");
    let replies = read_until_last(&mut stream).await;
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[1].message(), "100 %");

    handle.shutdown().await;
}

#[tokio::test]
async fn unsupported_version_gets_no_reply() {
    let bus = Arc::new(InMemoryBus::new());
    bus.pool().set(address(), 4711u16.to_be_bytes());
    bus.set_mode(BusMode::AcknowledgeAll);
    let handle = start(bus).await;

    let mut first = connect(&handle).await;
    let mut frame = encode_read_request(address(), DatapointId::new(7, 600));
    frame[0] = 0xFF;
    first.write_all(&frame).await.expect("write");

    let mut buffer = [0u8; 16];
    let silent = timeout(Duration::from_millis(300), first.read(&mut buffer)).await;
    assert!(silent.is_err(), "no reply expected for unsupported version");

    let mut second = connect(&handle).await;
    second
        .write_all(&encode_read_request(address(), DatapointId::new(7, 600)))
        .await
        .expect("write");
    let replies = read_until_last(&mut second).await;
    assert_eq!(replies.last().map(|r| r.status), Some(Status::Success));

    handle.shutdown().await;
}

#[tokio::test]
async fn shutdown_closes_clients() {
    let handle = start(Arc::new(InMemoryBus::new())).await;
    let mut states = handle.subscribe_state();
    let mut stream = connect(&handle).await;

    // accept 在后台完成，等待连接登记
    timeout(WAIT, async {
        while handle.open_connections() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connection registered");

    handle.shutdown().await;
    assert_eq!(*states.borrow_and_update(), ServerState::Stopped);

    let mut buffer = [0u8; 4];
    let read = timeout(WAIT, stream.read(&mut buffer))
        .await
        .expect("eof in time");
    assert!(matches!(read, Ok(0) | Err(_)));
}

#[tokio::test]
async fn bind_failure_is_reported() {
    let first = start(Arc::new(InMemoryBus::new())).await;
    let config = GatewayConfig {
        listen_addr: first.local_addr().to_string(),
        ..GatewayConfig::default()
    };

    let result = Gateway::start(config, Arc::new(InMemoryBus::new())).await;
    assert!(matches!(result, Err(GatewayError::Bind { .. })));

    first.shutdown().await;
}
