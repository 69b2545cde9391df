// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use crate::stream::{CharacterEncoding, Decoder, Encoder};
use crate::{wire, Error, Result};

/// Encodes XDR records into a fixed in-memory buffer.
///
/// Nothing is sent anywhere: the encoded octets stay in the buffer, exposed
/// through `as_slice` and `encoded_len` for test harnesses and for handing
/// off to I/O done elsewhere.
pub struct BufferEncoder {
    buf: Vec<u8>,
    cursor: usize,
    encoding: CharacterEncoding,
}

impl BufferEncoder {
    /// Create an encoder over a fresh zero-filled buffer of `size` octets,
    /// rounded up to a whole number of words with a floor of
    /// [`crate::MIN_BUFFER_SIZE`].
    pub fn new(size: usize) -> Self {
        Self {
            buf: vec![0; wire::round_buffer_size(size)],
            cursor: 0,
            encoding: CharacterEncoding::default(),
        }
    }

    pub fn set_character_encoding(&mut self, encoding: CharacterEncoding) {
        self.encoding = encoding;
    }

    /// The encoded octets of the current record.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.cursor]
    }

    /// Number of octets encoded so far. A multiple of 4 after every
    /// completed encode.
    pub fn encoded_len(&self) -> usize {
        self.cursor
    }

    /// Total capacity of the buffer in octets.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Encoder for BufferEncoder {
    fn begin(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    /// Leaves the cursor at the encoded length so the record can be picked
    /// up with `as_slice`.
    fn end(&mut self) -> Result<()> {
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

/// Decodes XDR records from a caller-supplied, pre-filled buffer.
pub struct BufferDecoder {
    buf: Vec<u8>,
    cursor: usize,

    /// One past the last decodable octet; fixed at construction.
    limit: usize,

    encoding: CharacterEncoding,
}

impl BufferDecoder {
    /// Create a decoder over `data`, of which the first `encoded_len` octets
    /// are a complete encoded record. `encoded_len` must be a multiple of 4
    /// and no longer than `data`.
    pub fn new(data: Vec<u8>, encoded_len: usize) -> Result<Self> {
        if encoded_len > data.len() {
            return Err(Error::Malformed(format!(
                "encoded length {encoded_len} exceeds the {} octet buffer",
                data.len()
            )));
        }
        if encoded_len % wire::WORD_SIZE != 0 {
            return Err(Error::Malformed(format!(
                "encoded length {encoded_len} is not a multiple of 4"
            )));
        }

        Ok(Self {
            buf: data,
            cursor: 0,
            limit: encoded_len,
            encoding: CharacterEncoding::default(),
        })
    }

    pub fn set_character_encoding(&mut self, encoding: CharacterEncoding) {
        self.encoding = encoding;
    }

    /// The encoded length this decoder was constructed with.
    pub fn encoded_len(&self) -> usize {
        self.limit
    }
}

impl Decoder for BufferDecoder {
    fn begin(&mut self) -> Result<()> {
        self.cursor = 0;
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
