//! Integration tests for the UDP transport.
//!
//! These bind real loopback sockets and check that whole datagrams arrive
//! with the right source address.

use std::time::Duration;

use gabble_transport::{DatagramSocket, TransportError, UdpTransport};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_udp_send_and_receive_round_trip() {
    let a = UdpTransport::bind("127.0.0.1:0").await.expect("should bind");
    let b = UdpTransport::bind("127.0.0.1:0").await.expect("should bind");
    let a_addr = a.local_addr().unwrap();
    let b_addr = b.local_addr().unwrap();

    a.send_to(b"hello from a", b_addr).await.expect("send should succeed");

    let mut buf = [0u8; 64];
    let (len, from) = tokio::time::timeout(RECV_TIMEOUT, b.recv_from(&mut buf))
        .await
        .expect("datagram should arrive")
        .expect("recv should succeed");

    assert_eq!(&buf[..len], b"hello from a");
    assert!(from.same_endpoint(a_addr), "source should be a's socket");
}

#[tokio::test]
async fn test_udp_oversize_datagram_is_visible_with_spare_byte() {
    // A buffer one byte larger than the expected size lets the caller see
    // that the datagram was bigger than expected.
    let a = UdpTransport::bind("127.0.0.1:0").await.unwrap();
    let b = UdpTransport::bind("127.0.0.1:0").await.unwrap();

    a.send_to(&[7u8; 32], b.local_addr().unwrap()).await.unwrap();

    let mut buf = [0u8; 17];
    let (len, _) = tokio::time::timeout(RECV_TIMEOUT, b.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(len, 17, "datagram should be truncated to the buffer");
}

#[tokio::test]
async fn test_udp_bind_invalid_address_returns_bind_failed() {
    let result = UdpTransport::bind("not-an-address").await;
    assert!(matches!(result, Err(TransportError::BindFailed { .. })));
}
