// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use crate::stream::{Decoder, Encoder};
use crate::Result;

/// A value that can encode itself onto any [`Encoder`] and decode itself
/// back from any [`Decoder`].
///
/// Implementations compose the primitive stream operations, field by field
/// for a record. Two laws bind them: encode and decode must consume and
/// produce the same number of wire words for the same logical value, and
/// both must be deterministic, with no hidden state, clock, or randomness in
/// the wire path.
pub trait Codec {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<()>;

    /// Decode into `self`, replacing its value.
    fn decode<D: Decoder>(&mut self, decoder: &mut D) -> Result<()>;
}

/// The empty payload. Encoding and decoding it touch no wire words; RPC
/// layers use it wherever a procedure takes or returns nothing, such as a
/// ping.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Void;

/// The canonical [`Void`] value.
pub const VOID: Void = Void;

impl Codec for Void {
    fn encode<E: Encoder>(&self, _encoder: &mut E) -> Result<()> {
        Ok(())
    }

    fn decode<D: Decoder>(&mut self, _decoder: &mut D) -> Result<()> {
        Ok(())
    }
}

impl Codec for i32 {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<()> {
        encoder.encode_i32(*self)
    }

    fn decode<D: Decoder>(&mut self, decoder: &mut D) -> Result<()> {
        *self = decoder.decode_i32()?;
        Ok(())
    }
}

impl Codec for u32 {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<()> {
        encoder.encode_u32(*self)
    }

    fn decode<D: Decoder>(&mut self, decoder: &mut D) -> Result<()> {
        *self = decoder.decode_u32()?;
        Ok(())
    }
}

impl Codec for i64 {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<()> {
        encoder.encode_i64(*self)
    }

    fn decode<D: Decoder>(&mut self, decoder: &mut D) -> Result<()> {
        *self = decoder.decode_i64()?;
        Ok(())
    }
}

impl Codec for u64 {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<()> {
        encoder.encode_u64(*self)
    }

    fn decode<D: Decoder>(&mut self, decoder: &mut D) -> Result<()> {
        *self = decoder.decode_u64()?;
        Ok(())
    }
}

impl Codec for f32 {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<()> {
        encoder.encode_f32(*self)
    }

    fn decode<D: Decoder>(&mut self, decoder: &mut D) -> Result<()> {
        *self = decoder.decode_f32()?;
        Ok(())
    }
}

impl Codec for f64 {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<()> {
        encoder.encode_f64(*self)
    }

    fn decode<D: Decoder>(&mut self, decoder: &mut D) -> Result<()> {
        *self = decoder.decode_f64()?;
        Ok(())
    }
}

impl Codec for bool {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<()> {
        encoder.encode_bool(*self)
    }

    fn decode<D: Decoder>(&mut self, decoder: &mut D) -> Result<()> {
        *self = decoder.decode_bool()?;
        Ok(())
    }
}

impl Codec for String {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<()> {
        encoder.encode_string(self)
    }

    fn decode<D: Decoder>(&mut self, decoder: &mut D) -> Result<()> {
        *self = decoder.decode_string()?;
        Ok(())
    }
}

/// A byte vector goes on the wire as counted ("dynamic") opaque.
impl Codec for Vec<u8> {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<()> {
        encoder.encode_opaque_vec(self)
    }

    fn decode<D: Decoder>(&mut self, decoder: &mut D) -> Result<()> {
        *self = decoder.decode_opaque_vec()?;
        Ok(())
    }
}
