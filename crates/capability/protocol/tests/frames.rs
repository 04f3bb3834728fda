use domain::{DatapointId, GroupAddress};
use knx_link_bus::{DatapointType, ReferenceRegistry};
use knx_link_protocol::v1::{
    Header, ReadRequestBody, ResponseBody, WriteRequestBody, body_of, encode_read_request,
    encode_response, encode_write_request,
};
use knx_link_protocol::{Action, FormatError, Status};

fn address() -> GroupAddress {
    "1/2/3".parse().expect("group address")
}

#[test]
fn client_read_frame_decodes_on_server() {
    let registry = ReferenceRegistry::new();
    let frame = encode_read_request(address(), DatapointId::new(7, 600));

    let header = Header::decode(&frame).expect("header");
    assert_eq!(header.action, Action::ReadRequest);
    let body = ReadRequestBody::decode(body_of(&header, &frame).expect("body"), &registry)
        .expect("read body");
    assert_eq!(body.group_address, address());
    assert_eq!(body.datapoint_type.unit(), "K");
}

#[test]
fn client_write_frame_keeps_arguments() {
    let registry = ReferenceRegistry::new();
    let arguments = ["hello world", r#"with "quotes""#];
    let frame = encode_write_request(address(), DatapointId::new(16, 0), &arguments)
        .expect("write frame");

    let header = Header::decode(&frame).expect("header");
    let body = WriteRequestBody::decode(body_of(&header, &frame).expect("body"), &registry)
        .expect("write body");
    assert_eq!(body.arguments, arguments);
    assert_eq!(body.datapoint_type.name(), "raw");
}

#[test]
fn surplus_bytes_after_body_are_ignored() {
    let registry = ReferenceRegistry::new();
    let mut frame = encode_read_request(address(), DatapointId::new(1, 1));
    frame.extend_from_slice(&[0xDE, 0xAD]);

    let header = Header::decode(&frame).expect("header");
    let body = body_of(&header, &frame).expect("body");
    assert_eq!(body.len(), 6);
    assert!(ReadRequestBody::decode(body, &registry).is_ok());
}

#[test]
fn truncated_write_frame_is_rejected() {
    let frame = encode_write_request(address(), DatapointId::new(1, 1), &["on"]).expect("frame");
    let cut = &frame[..frame.len() - 1];
    let header = Header::decode(cut).expect("header");
    assert_eq!(
        body_of(&header, cut),
        Err(FormatError::Truncated {
            declared: 8,
            actual: 7
        })
    );
}

#[test]
fn response_frame_decodes_on_client() {
    let body = ResponseBody::with_message(true, Status::ErrorGroupAddress, "bad address");
    let frame = encode_response(Action::WriteResponse, &body).expect("frame");

    let header = Header::decode(&frame).expect("header");
    assert_eq!(header.action, Action::WriteResponse);
    let decoded = ResponseBody::decode(body_of(&header, &frame).expect("body")).expect("response");
    assert_eq!(decoded, body);
}
