// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::net::UdpSocket;
use std::time::Duration;

use xdr_codec::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A loopback socket pair with a receive timeout so a lost datagram fails
/// the test instead of hanging it.
fn socket_pair() -> (UdpSocket, UdpSocket) {
    let a = UdpSocket::bind("127.0.0.1:0").unwrap();
    let b = UdpSocket::bind("127.0.0.1:0").unwrap();
    b.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    (a, b)
}

#[test]
fn datagram_roundtrip() {
    init_logging();

    let (tx, rx) = socket_pair();
    let rx_addr = rx.local_addr().unwrap();
    let tx_addr = tx.local_addr().unwrap();

    let mut enc = UdpEncoder::new(tx, DEFAULT_BUFFER_SIZE);
    enc.begin_with(rx_addr).unwrap();
    enc.encode_i32(390210).unwrap();
    enc.encode_string("gpib0,12").unwrap();
    enc.encode_f64(2.5e-3).unwrap();
    enc.end().unwrap();

    let mut dec = UdpDecoder::new(rx, DEFAULT_BUFFER_SIZE);
    dec.begin().unwrap();
    assert_eq!(dec.decode_i32().unwrap(), 390210);
    assert_eq!(dec.decode_string().unwrap(), "gpib0,12");
    assert_eq!(dec.decode_f64().unwrap(), 2.5e-3);
    dec.end().unwrap();

    assert_eq!(dec.sender(), Some(tx_addr));
}

#[test]
fn destination_is_reused_across_records() {
    let (tx, rx) = socket_pair();
    let rx_addr = rx.local_addr().unwrap();

    let mut enc = UdpEncoder::new(tx, MIN_BUFFER_SIZE);
    enc.begin_with(rx_addr).unwrap();
    enc.encode_i32(1).unwrap();
    enc.end().unwrap();

    // The second record names no destination and goes to the same peer.
    enc.begin().unwrap();
    enc.encode_i32(2).unwrap();
    enc.end().unwrap();

    let mut dec = UdpDecoder::new(rx, MIN_BUFFER_SIZE);
    dec.begin().unwrap();
    assert_eq!(dec.decode_i32().unwrap(), 1);
    dec.end().unwrap();
    dec.begin().unwrap();
    assert_eq!(dec.decode_i32().unwrap(), 2);
    dec.end().unwrap();
}

#[test]
fn end_without_a_destination_fails() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let mut enc = UdpEncoder::new(socket, MIN_BUFFER_SIZE);
    enc.begin().unwrap();
    enc.encode_i32(1).unwrap();
    assert!(matches!(enc.end(), Err(Error::Failed(_))));
}

#[test]
fn record_larger_than_the_buffer_overflows() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let mut enc = UdpEncoder::new(socket, MIN_BUFFER_SIZE);
    enc.begin().unwrap();
    assert!(matches!(
        enc.encode_opaque(&[0; 2000]),
        Err(Error::BufferOverflow)
    ));
}

#[test]
fn datagram_bounds_the_decode() {
    let (tx, rx) = socket_pair();
    let rx_addr = rx.local_addr().unwrap();

    let mut enc = UdpEncoder::new(tx, MIN_BUFFER_SIZE);
    enc.begin_with(rx_addr).unwrap();
    enc.encode_i32(77).unwrap();
    enc.end().unwrap();

    let mut dec = UdpDecoder::new(rx, MIN_BUFFER_SIZE);
    dec.begin().unwrap();
    assert_eq!(dec.decode_i32().unwrap(), 77);
    assert!(matches!(dec.decode_i32(), Err(Error::BufferUnderflow)));
}

#[test]
fn empty_record_pings() {
    init_logging();

    let (tx, rx) = socket_pair();
    let rx_addr = rx.local_addr().unwrap();

    let mut enc = UdpEncoder::new(tx, MIN_BUFFER_SIZE);
    enc.begin_with(rx_addr).unwrap();
    VOID.encode(&mut enc).unwrap();
    enc.end().unwrap();

    let mut dec = UdpDecoder::new(rx, MIN_BUFFER_SIZE);
    dec.begin().unwrap();
    let mut reply = Void;
    reply.decode(&mut dec).unwrap();
    dec.end().unwrap();

    assert!(dec.sender().is_some());
}
