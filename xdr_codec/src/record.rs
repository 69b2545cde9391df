// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use log::*;

use std::io::{Read, Write};

use crate::stream::{CharacterEncoding, Decoder, Encoder};
use crate::{wire, Error, Result};

/// Encodes XDR records onto a byte-oriented transport using RFC 1831 record
/// marking: each record is carried as one or more fragments, each prefixed by
/// a 4-octet header holding the fragment's payload length in its low 31 bits
/// and a last-fragment flag in the top bit.
///
/// The transport is anything `Write`: typically a `TcpStream` the stream
/// then owns (and closes on drop), but also a `pipe::Endpoint` or a
/// `Vec<u8>`.
pub struct RecordEncoder<W: Write> {
    sink: W,
    buf: Vec<u8>,

    /// Next write position. The 4 octets at `frag_start` are the reserved
    /// header of the fragment being built, so `cursor > frag_start` always.
    cursor: usize,

    /// Offset of the current fragment's header placeholder.
    frag_start: usize,

    encoding: CharacterEncoding,
}

impl<W: Write> RecordEncoder<W> {
    pub fn new(sink: W, buffer_size: usize) -> Self {
        Self {
            sink,
            buf: vec![0; wire::round_buffer_size(buffer_size)],
            cursor: wire::WORD_SIZE,
            frag_start: 0,
            encoding: CharacterEncoding::default(),
        }
    }

    pub fn set_character_encoding(&mut self, encoding: CharacterEncoding) {
        self.encoding = encoding;
    }

    /// Finish the current record.
    ///
    /// With `flush` set, the record (and any batched predecessors) is
    /// written to the transport. Without it, the record is stamped complete
    /// but held in the buffer while room remains for another header plus one
    /// word of payload, so several complete records can ride a single
    /// transport write. When that reserve does not fit, the encoder flushes
    /// anyway.
    pub fn end_record(&mut self, flush: bool) -> Result<()> {
        self.flush_fragment(true, !flush)
    }

    /// A reference to the underlying transport.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Consume the stream, returning the transport without closing it.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn flush_fragment(&mut self, last: bool, batch: bool) -> Result<()> {
        let payload = self.cursor - self.frag_start - wire::WORD_SIZE;
        debug_assert_eq!(payload % wire::WORD_SIZE, 0);

        let header = wire::fragment_header(payload, last);
        self.buf[self.frag_start..self.frag_start + wire::WORD_SIZE].copy_from_slice(&header);
        trace!("fragment out: {payload} octets, last: {last}, batch: {batch}");

        if last && batch && self.cursor + 2 * wire::WORD_SIZE <= self.buf.len() {
            // Hold the completed record and reserve the next header behind it.
            self.frag_start = self.cursor;
            self.cursor += wire::WORD_SIZE;
            return Ok(());
        }

        self.sink
            .write_all(&self.buf[..self.cursor])
            .map_err(Error::CannotSend)?;
        self.sink.flush().map_err(Error::CannotSend)?;
        self.frag_start = 0;
        self.cursor = wire::WORD_SIZE;
        Ok(())
    }

    /// Make room for `want` more octets, closing out the buffer contents as
    /// a non-last fragment if it is full. Only ever flushes with the cursor
    /// on a word boundary, so fragment lengths stay word-aligned.
    fn reserve(&mut self, want: usize) -> Result<()> {
        if self.cursor + want > self.buf.len() {
            self.flush_fragment(false, false)?;
        }
        Ok(())
    }
}

impl<W: Write> Encoder for RecordEncoder<W> {
    /// Reserve the header of the record's first fragment. Records already
    /// batched in the buffer stay put.
    fn begin(&mut self) -> Result<()> {
        self.cursor = self.frag_start + wire::WORD_SIZE;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.end_record(true)
    }

    fn encode_u32(&mut self, val: u32) -> Result<()> {
        self.reserve(wire::WORD_SIZE)?;
        wire::put_u32(&mut self.buf, &mut self.cursor, val)
    }

    fn encode_opaque(&mut self, bytes: &[u8]) -> Result<()> {
        let mut rest = bytes;
        while !rest.is_empty() {
            self.reserve(1)?;
            let n = (self.buf.len() - self.cursor).min(rest.len());
            self.buf[self.cursor..self.cursor + n].copy_from_slice(&rest[..n]);
            self.cursor += n;
            rest = &rest[n..];
        }
        for _ in 0..wire::pad_len(bytes.len()) {
            self.reserve(1)?;
            self.buf[self.cursor] = 0;
            self.cursor += 1;
        }
        Ok(())
    }

    fn character_encoding(&self) -> CharacterEncoding {
        self.encoding
    }
}

/// Decodes record-marked XDR records from a byte-oriented transport.
///
/// Between records (fresh, or after `end`) the stream is idle: `end` is a
/// no-op and any decode reports `BufferUnderflow`. `begin` arms the fragment
/// state machine and reads the first stretch of the record.
pub struct RecordDecoder<R: Read> {
    source: R,
    buf: Vec<u8>,
    cursor: usize,

    /// One past the last valid octet in `buf`.
    limit: usize,

    /// Octets of the current fragment not yet read from the transport.
    fragment_remaining: usize,

    last_fragment: bool,
    encoding: CharacterEncoding,
}

impl<R: Read> RecordDecoder<R> {
    pub fn new(source: R, buffer_size: usize) -> Self {
        Self {
            source,
            buf: vec![0; wire::round_buffer_size(buffer_size)],
            cursor: 0,
            limit: 0,
            fragment_remaining: 0,
            // Idle until begin() arms the state machine.
            last_fragment: true,
            encoding: CharacterEncoding::default(),
        }
    }

    pub fn set_character_encoding(&mut self, encoding: CharacterEncoding) {
        self.encoding = encoding;
    }

    pub fn get_ref(&self) -> &R {
        &self.source
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.source
    }

    /// Consume the stream, returning the transport without closing it.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Read the next fragment header and/or the next stretch of payload into
    /// the buffer.
    ///
    /// A fragment length that is not a multiple of 4, or an empty fragment
    /// that is not the last one, is `Malformed`. The peer must finish any
    /// fragment it started, so end-of-stream inside a header or payload is
    /// `CannotReceive`.
    fn fill(&mut self) -> Result<()> {
        if self.fragment_remaining == 0 {
            if self.last_fragment {
                return Err(Error::BufferUnderflow);
            }

            let mut header = [0; wire::WORD_SIZE];
            self.source
                .read_exact(&mut header)
                .map_err(Error::CannotReceive)?;
            let (len, last) = wire::parse_fragment_header(header);
            trace!("fragment in: {len} octets, last: {last}");

            if len % wire::WORD_SIZE != 0 {
                return Err(Error::Malformed(format!(
                    "fragment length {len} is not a multiple of 4"
                )));
            }
            if len == 0 && !last {
                return Err(Error::Malformed(
                    "empty fragment that is not the last".to_string(),
                ));
            }
            self.fragment_remaining = len;
            self.last_fragment = last;
        }

        let n = self.fragment_remaining.min(self.buf.len());
        self.source
            .read_exact(&mut self.buf[..n])
            .map_err(Error::CannotReceive)?;
        self.cursor = 0;
        self.limit = n;
        self.fragment_remaining -= n;
        Ok(())
    }

    /// Refill until decodable data is buffered. The loop (rather than a
    /// single fill) steps over a legal empty trailing last-fragment.
    fn refill(&mut self) -> Result<()> {
        while self.cursor >= self.limit {
            self.fill()?;
        }
        Ok(())
    }

    /// Consume `n` octets without interpreting them.
    fn skip(&mut self, n: usize) -> Result<()> {
        let mut remaining = n;
        while remaining > 0 {
            self.refill()?;
            let step = (self.limit - self.cursor).min(remaining);
            self.cursor += step;
            remaining -= step;
        }
        Ok(())
    }

    /// Pull the rest of the record off the transport and discard it.
    fn drain(&mut self) -> Result<()> {
        while !(self.last_fragment && self.fragment_remaining == 0) {
            self.fill()?;
        }
        Ok(())
    }

    /// Forget the current record and return to the idle state.
    fn reset(&mut self) {
        self.cursor = 0;
        self.limit = 0;
        self.fragment_remaining = 0;
        self.last_fragment = true;
    }
}

impl<R: Read> Decoder for RecordDecoder<R> {
    /// Arm the state machine and read the first stretch of the record. May
    /// block until the peer sends the first fragment header.
    fn begin(&mut self) -> Result<()> {
        self.reset();
        self.last_fragment = false;
        self.fill()
    }

    /// Drain whatever is left of the record so the next one can start. The
    /// stream returns to the idle state even when draining itself fails, so
    /// a decoder that hit an error can still be reused after the caller
    /// resynchronizes the transport.
    fn end(&mut self) -> Result<()> {
        let drained = self.drain();
        self.reset();
        if let Err(ref e) = drained {
            warn!("discarding record remainder: {e}");
        }
        drained
    }

    fn decode_u32(&mut self) -> Result<u32> {
        self.refill()?;
        wire::get_u32(&self.buf, &mut self.cursor, self.limit)
    }

    fn decode_opaque_into(&mut self, dst: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < dst.len() {
            self.refill()?;
            let n = (self.limit - self.cursor).min(dst.len() - filled);
            dst[filled..filled + n].copy_from_slice(&self.buf[self.cursor..self.cursor + n]);
            self.cursor += n;
            filled += n;
        }
        self.skip(wire::pad_len(dst.len()))
    }

    fn character_encoding(&self) -> CharacterEncoding {
        self.encoding
    }
}
