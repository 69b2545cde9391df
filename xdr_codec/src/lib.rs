// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Encoding and decoding of External Data Representation (XDR, RFC 4506)
//! data, as used on the wire by ONC RPC and VXI-11 instrument control.
//!
//! Values are written to an [`Encoder`] and read back from a [`Decoder`].
//! Three backings are provided for each: a fixed in-memory buffer, a UDP
//! socket carrying one record per datagram, and a byte stream (typically
//! TCP) carrying records with RFC 1831 record marking.
//!
//! ```
//! use xdr_codec::{BufferDecoder, BufferEncoder, Decoder, Encoder};
//!
//! # fn main() -> xdr_codec::Result<()> {
//! let mut encoder = BufferEncoder::new(1024);
//! encoder.begin()?;
//! encoder.encode_i32(42)?;
//! encoder.encode_string("*IDN?")?;
//! encoder.end()?;
//!
//! let mut decoder = BufferDecoder::new(encoder.as_slice().to_vec(), encoder.encoded_len())?;
//! decoder.begin()?;
//! assert_eq!(decoder.decode_i32()?, 42);
//! assert_eq!(decoder.decode_string()?, "*IDN?");
//! decoder.end()?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod codec;
pub mod record;
pub mod stream;
pub mod udp;

mod wire;

pub use buffer::{BufferDecoder, BufferEncoder};
pub use codec::{Codec, Void, VOID};
pub use record::{RecordDecoder, RecordEncoder};
pub use stream::{CharacterEncoding, Decoder, Encoder};
pub use udp::{UdpDecoder, UdpEncoder};

use std::fmt;
use std::io;

/// Buffer size, in octets, used when a stream is constructed without an
/// explicit size.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// The smallest internal buffer any stream will use. Requested sizes are
/// rounded up to a multiple of 4 and never fall below this floor.
pub const MIN_BUFFER_SIZE: usize = 1024;

/// The possible errors that can arise from encoding or decoding XDR data.
#[derive(Debug)]
pub enum Error {
    /// The underlying sink refused, or only partially accepted, the encoded
    /// bytes.
    CannotSend(io::Error),

    /// The underlying source was exhausted before a required read completed.
    /// This includes a stream peer closing the connection in the middle of a
    /// fragment.
    CannotReceive(io::Error),

    /// An encode would advance past the end of the buffer.
    BufferOverflow,

    /// A decode would read past the end of the available data, and no more
    /// data can be fetched.
    BufferUnderflow,

    /// The data violates the XDR encoding rules: a fragment length that is
    /// not a multiple of 4, an empty fragment that is not the last one, or a
    /// negative length.
    Malformed(String),

    /// Unexpected conditions that fit no other kind.
    Failed(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::CannotSend(e) => write!(f, "Cannot send: {e}"),
            Self::CannotReceive(e) => write!(f, "Cannot receive: {e}"),
            Self::BufferOverflow => write!(f, "Buffer overflow"),
            Self::BufferUnderflow => write!(f, "Buffer underflow"),
            Self::Malformed(msg) => write!(f, "Malformed data: {msg}"),
            Self::Failed(msg) => write!(f, "Failed: {msg}"),
        }
    }
}

/// The result of every fallible codec operation.
///
/// Nothing is recovered inside the codec: the caller decides whether a
/// failure is transient (retry the whole record) or fatal (tear down the
/// connection).
pub type Result<T> = std::result::Result<T, Error>;

/// A "pipe", constructed using socketpair(2), that can be used for testing
/// encoder and decoder behavior over a real kernel socket without setting up
/// a listener.
///
/// Each `Endpoint` implements `Read` and `Write`, so a record-marked stream
/// can be driven over one end and decoded from the other. Dropping an
/// endpoint closes it, which the peer observes as end-of-stream.
pub mod pipe {
    use nix::sys::socket::{socketpair, AddressFamily, SockFlag, SockType};

    pub struct Endpoint {
        fd: std::os::fd::OwnedFd,
    }

    pub fn pipe() -> std::io::Result<(Endpoint, Endpoint)> {
        let (a, b) = socketpair(
            AddressFamily::Unix,
            SockType::Stream,
            None,
            SockFlag::empty(),
        )?;

        Ok((Endpoint { fd: a }, Endpoint { fd: b }))
    }

    impl std::io::Read for Endpoint {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            Ok(nix::unistd::read(&self.fd, buf)?)
        }
    }

    impl std::io::Write for Endpoint {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(nix::unistd::write(&self.fd, buf)?)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
