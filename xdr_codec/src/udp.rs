// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use log::*;

use std::io;
use std::net::{SocketAddr, UdpSocket};

use crate::stream::{CharacterEncoding, Decoder, Encoder};
use crate::{wire, Error, Result};

/// Encodes XDR records and sends each one as a single UDP datagram.
///
/// There is no fragmentation at this layer: a record must fit the buffer,
/// and `end` performs exactly one send. The stream owns the socket and
/// closes it when dropped.
pub struct UdpEncoder {
    socket: UdpSocket,
    buf: Vec<u8>,
    cursor: usize,
    remote: Option<SocketAddr>,
    encoding: CharacterEncoding,
}

impl UdpEncoder {
    pub fn new(socket: UdpSocket, buffer_size: usize) -> Self {
        Self {
            socket,
            buf: vec![0; wire::round_buffer_size(buffer_size)],
            cursor: 0,
            remote: None,
            encoding: CharacterEncoding::default(),
        }
    }

    pub fn set_character_encoding(&mut self, encoding: CharacterEncoding) {
        self.encoding = encoding;
    }

    /// Start a record addressed to `remote`. Later records may call plain
    /// `begin` to reuse the same destination.
    pub fn begin_with(&mut self, remote: SocketAddr) -> Result<()> {
        self.remote = Some(remote);
        self.begin()
    }

    /// The socket this stream sends from.
    pub fn socket(&self) -> &UdpSocket {
        &self.socket
    }
}

impl Encoder for UdpEncoder {
    fn begin(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    /// Send the accumulated octets as exactly one datagram. May block on the
    /// socket; closing the socket fails the send with `CannotSend`.
    fn end(&mut self) -> Result<()> {
        let Some(remote) = self.remote else {
            return Err(Error::Failed(
                "no destination: begin_with() was never called".to_string(),
            ));
        };

        let sent = self
            .socket
            .send_to(&self.buf[..self.cursor], remote)
            .map_err(Error::CannotSend)?;
        debug!("sent {sent} octet datagram to {remote}");

        if sent != self.cursor {
            return Err(Error::CannotSend(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("datagram truncated: sent {sent} of {} octets", self.cursor),
            )));
        }
        Ok(())
    }

    fn encode_u32(&mut self, val: u32) -> Result<()> {
        wire::put_u32(&mut self.buf, &mut self.cursor, val)
    }

    fn encode_opaque(&mut self, bytes: &[u8]) -> Result<()> {
        wire::put_opaque(&mut self.buf, &mut self.cursor, bytes)
    }

    fn character_encoding(&self) -> CharacterEncoding {
        self.encoding
    }
}

/// Decodes XDR records from UDP datagrams, one record per datagram.
pub struct UdpDecoder {
    socket: UdpSocket,
    buf: Vec<u8>,
    cursor: usize,

    /// Length of the datagram being decoded.
    limit: usize,

    sender: Option<SocketAddr>,
    encoding: CharacterEncoding,
}

impl UdpDecoder {
    pub fn new(socket: UdpSocket, buffer_size: usize) -> Self {
        Self {
            socket,
            buf: vec![0; wire::round_buffer_size(buffer_size)],
            cursor: 0,
            limit: 0,
            sender: None,
            encoding: CharacterEncoding::default(),
        }
    }

    pub fn set_character_encoding(&mut self, encoding: CharacterEncoding) {
        self.encoding = encoding;
    }

    /// Address of the peer that sent the record currently being decoded.
    /// `None` until the first `begin` completes.
    pub fn sender(&self) -> Option<SocketAddr> {
        self.sender
    }

    /// The socket this stream receives on.
    pub fn socket(&self) -> &UdpSocket {
        &self.socket
    }
}

impl Decoder for UdpDecoder {
    /// Block for one datagram; subsequent decodes are bounded by its length.
    /// Closing the socket fails the receive with `CannotReceive`.
    fn begin(&mut self) -> Result<()> {
        let (received, from) = self
            .socket
            .recv_from(&mut self.buf)
            .map_err(Error::CannotReceive)?;
        debug!("received {received} octet datagram from {from}");

        self.cursor = 0;
        self.limit = received;
        self.sender = Some(from);
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        Ok(())
    }

    fn decode_u32(&mut self) -> Result<u32> {
        wire::get_u32(&self.buf, &mut self.cursor, self.limit)
    }

    fn decode_opaque_into(&mut self, dst: &mut [u8]) -> Result<()> {
        wire::get_opaque_into(&self.buf, &mut self.cursor, self.limit, dst)
    }

    fn character_encoding(&self) -> CharacterEncoding {
        self.encoding
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.limit - self.cursor)
    }
}
