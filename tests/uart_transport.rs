//! Transaction scenarios over the UART carrier: escaping, SOM
//! classification, passthrough echo validation, and deadline behavior.
mod helpers;

use cube_obc::error::Error;
use cube_obc::protocol::transport::endpoint::{Carrier, Endpoint, NodeType, Protocol};
use cube_obc::protocol::transport::master::{Config, Master};
use cube_obc::protocol::transport::traits::Unimplemented;
use cube_obc::protocol::transport::uart_codec::{EOM, ESCAPE};

use helpers::{DeviceReply, FakeClock, FnDevice, MockUartPort, TctlmDevice};

fn uart_master<D: TctlmDevice>(
    device: D,
) -> (
    Master<Unimplemented, MockUartPort<D>, Unimplemented, FakeClock>,
    MockUartPort<D>,
    FakeClock,
) {
    let port = MockUartPort::new(device);
    let clock = FakeClock::default();
    let master = Master::new(
        Config { host_address: 1 },
        Unimplemented,
        port.clone(),
        Unimplemented,
        clock.clone(),
    );
    (master, port, clock)
}

fn uart_endpoint() -> Endpoint {
    Endpoint::uart(NodeType::CubeSense, 500)
}

#[tokio::test]
async fn request_wire_image_escapes_payload() {
    let (mut master, port, _clock) = uart_master(FnDevice(|id, request: &[u8]| {
        assert_eq!(id, 0x42);
        assert_eq!(request, [0x1F, 0xAA]);
        DeviceReply::Ack(Vec::new())
    }));
    let endpoint = uart_endpoint();

    master
        .send_receive(&endpoint, 0x42, &[0x1F, 0xAA])
        .await
        .unwrap();

    assert_eq!(
        port.sent(),
        vec![0x1F, 0x7F, 0x42, 0x1F, 0x1F, 0xAA, 0x1F, 0xFF]
    );
}

#[tokio::test]
async fn response_payload_round_trips() {
    let (mut master, _port, _clock) = uart_master(FnDevice(|_, _: &[u8]| {
        DeviceReply::Ack(vec![0x01, 0x1F, 0xFF, 0x1F, 0x02])
    }));
    let endpoint = uart_endpoint();

    let response = master.send_receive(&endpoint, 0x80, &[]).await.unwrap();
    assert_eq!(response, &[0x01, 0x1F, 0xFF, 0x1F, 0x02]);
}

#[tokio::test]
async fn all_escape_payload_round_trips() {
    let request = [ESCAPE; 24];
    let (mut master, _port, _clock) = uart_master(FnDevice(move |_, received: &[u8]| {
        assert_eq!(received, [ESCAPE; 24]);
        DeviceReply::Ack(received.to_vec())
    }));
    let endpoint = uart_endpoint();

    let response = master.send_receive(&endpoint, 0x21, &request).await.unwrap();
    assert_eq!(response, &request[..]);
}

#[tokio::test]
async fn nack_reason_is_decoded() {
    let (mut master, _port, _clock) =
        uart_master(FnDevice(|_, _: &[u8]| DeviceReply::Nack(6)));
    let endpoint = uart_endpoint();

    let result = master.send_receive(&endpoint, 0x11, &[]).await;
    assert_eq!(result.unwrap_err(), Error::TctlmBusy);
}

#[tokio::test]
async fn passthrough_request_uses_alternate_som_and_echo() {
    let (mut master, port, _clock) =
        uart_master(FnDevice(|_, _: &[u8]| DeviceReply::Ack(vec![0x55])));
    let endpoint = uart_endpoint().with_passthrough(0);

    let response = master.send_receive(&endpoint, 0x33, &[]).await.unwrap();
    assert_eq!(response, &[0x55]);
    assert_eq!(port.sent()[1], 0x7E);
}

#[tokio::test]
async fn unexpected_passthrough_reply_is_a_protocol_error() {
    let (mut master, port, _clock) =
        uart_master(FnDevice(|_, _: &[u8]| DeviceReply::Ack(Vec::new())));
    port.with_state(|state| state.force_passthrough_reply = Some(true));
    let endpoint = uart_endpoint();

    let result = master.send_receive(&endpoint, 0x12, &[]).await;
    assert_eq!(result.unwrap_err(), Error::TctlmProtocol);
}

#[tokio::test]
async fn reply_without_som_is_a_protocol_error() {
    let (mut master, port, _clock) =
        uart_master(FnDevice(|_, _: &[u8]| DeviceReply::Silent));
    // Garbage bytes then a bare end-of-message sequence.
    port.with_state(|state| state.raw_reply = Some(vec![0x10, 0x20, ESCAPE, EOM]));
    let endpoint = uart_endpoint();

    let result = master.send_receive(&endpoint, 0x12, &[]).await;
    assert_eq!(result.unwrap_err(), Error::TctlmProtocol);
}

#[tokio::test]
async fn mismatched_echo_id_is_rejected() {
    let (mut master, port, _clock) =
        uart_master(FnDevice(|_, _: &[u8]| DeviceReply::Ack(Vec::new())));
    port.with_state(|state| state.echo_id = Some(0x77));
    let endpoint = uart_endpoint();

    let result = master.send_receive(&endpoint, 0x12, &[]).await;
    assert_eq!(result.unwrap_err(), Error::TctlmId);
}

#[tokio::test]
async fn silent_device_times_out_at_the_deadline() {
    let (mut master, _port, clock) =
        uart_master(FnDevice(|_, _: &[u8]| DeviceReply::Silent));
    let endpoint = uart_endpoint();

    let result = master.send_receive(&endpoint, 0x01, &[]).await;
    assert_eq!(result.unwrap_err(), Error::Timeout);
    assert_eq!(clock.now(), 500);
}

#[tokio::test]
async fn csp_protocol_on_uart_is_rejected() {
    let (mut master, port, _clock) =
        uart_master(FnDevice(|_, _: &[u8]| DeviceReply::Ack(Vec::new())));
    let mut endpoint = uart_endpoint();
    endpoint.proto = Protocol::Csp;
    assert_eq!(endpoint.carrier, Carrier::Uart);

    let result = master.send_receive(&endpoint, 0x01, &[]).await;
    assert_eq!(result.unwrap_err(), Error::Param);
    assert!(port.sent().is_empty());
}
