// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::borrow::Cow;

use crate::{Error, Result};

/// How the octet body of an XDR string is converted to and from text.
///
/// VXI-11 instruments exchange plain ASCII, so that encoding is offered next
/// to the UTF-8 default. Conversion never fails: scalar values an encoding
/// cannot represent are replaced with `?` on encode, and bytes outside the
/// encoding are replaced on decode. Content validation belongs to the layer
/// above the codec.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CharacterEncoding {
    #[default]
    Utf8,
    Ascii,
}

impl CharacterEncoding {
    /// The octets that carry `s` on the wire.
    pub fn encode_str<'a>(&self, s: &'a str) -> Cow<'a, [u8]> {
        match self {
            Self::Utf8 => Cow::Borrowed(s.as_bytes()),
            Self::Ascii => {
                if s.is_ascii() {
                    Cow::Borrowed(s.as_bytes())
                } else {
                    Cow::Owned(
                        s.chars()
                            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                            .collect(),
                    )
                }
            }
        }
    }

    /// The owned text carried by octets received on the wire.
    pub fn decode_bytes(&self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect(),
        }
    }
}

/// An XDR length or element count, which goes on the wire as a non-negative
/// int.
fn wire_count(n: usize) -> Result<i32> {
    i32::try_from(n).map_err(|_| Error::Failed(format!("length {n} exceeds the XDR length range")))
}

/// A decoded length or element count. Negative values are illegal on the
/// wire.
fn decoded_count(n: i32) -> Result<usize> {
    usize::try_from(n).map_err(|_| Error::Malformed(format!("negative length {n}")))
}

/// A sink for XDR-encoded values.
///
/// A backing provides the record lifecycle, the 32-bit word, and fixed
/// opaque; every other XDR type is derived from those. A record is written by
/// calling `begin`, encoding its values in order, then calling `end`. What
/// `end` does (nothing, send a datagram, flush a fragment) depends on the
/// backing, and a stream may be reused for many records.
pub trait Encoder {
    /// Start encoding a record.
    fn begin(&mut self) -> Result<()>;

    /// Finish the current record.
    fn end(&mut self) -> Result<()>;

    /// Encode one unsigned 32-bit integer as a big-endian wire word.
    fn encode_u32(&mut self, val: u32) -> Result<()>;

    /// Encode `bytes` verbatim, followed by zero octets up to the next word
    /// boundary. The length is not encoded; both sides must know it from
    /// context.
    fn encode_opaque(&mut self, bytes: &[u8]) -> Result<()>;

    /// The encoding used by `encode_string`.
    fn character_encoding(&self) -> CharacterEncoding;

    fn encode_i32(&mut self, val: i32) -> Result<()> {
        self.encode_u32(val as u32)
    }

    /// Booleans are an int that is exactly 0 or 1.
    fn encode_bool(&mut self, val: bool) -> Result<()> {
        self.encode_i32(val as i32)
    }

    /// Narrow integers widen to a full word: sign-extended when signed,
    /// zero-extended when unsigned.
    fn encode_i8(&mut self, val: i8) -> Result<()> {
        self.encode_i32(val as i32)
    }

    fn encode_u8(&mut self, val: u8) -> Result<()> {
        self.encode_i32(val as i32)
    }

    fn encode_i16(&mut self, val: i16) -> Result<()> {
        self.encode_i32(val as i32)
    }

    fn encode_u16(&mut self, val: u16) -> Result<()> {
        self.encode_i32(val as i32)
    }

    /// Characters are ASCII and occupy the low 8 bits of a word.
    fn encode_char(&mut self, val: char) -> Result<()> {
        self.encode_u32(val as u32 & 0xff)
    }

    /// A hyper is the high-order word followed by the low-order word.
    fn encode_i64(&mut self, val: i64) -> Result<()> {
        self.encode_u32((val >> 32) as u32)?;
        self.encode_u32(val as u32)
    }

    fn encode_u64(&mut self, val: u64) -> Result<()> {
        self.encode_u32((val >> 32) as u32)?;
        self.encode_u32(val as u32)
    }

    /// The IEEE-754 bit pattern goes on the wire unchanged, so NaN payloads
    /// survive the trip.
    fn encode_f32(&mut self, val: f32) -> Result<()> {
        self.encode_u32(val.to_bits())
    }

    fn encode_f64(&mut self, val: f64) -> Result<()> {
        self.encode_u64(val.to_bits())
    }

    /// Encode a length word, then the body as fixed opaque. A zero-length
    /// body encodes as just the length word.
    fn encode_opaque_vec(&mut self, bytes: &[u8]) -> Result<()> {
        self.encode_i32(wire_count(bytes.len())?)?;
        self.encode_opaque(bytes)
    }

    /// Encode text as a counted octet body under the stream's character
    /// encoding.
    fn encode_string(&mut self, s: &str) -> Result<()> {
        let bytes = self.character_encoding().encode_str(s);
        self.encode_opaque_vec(&bytes)
    }

    fn encode_i16_vec(&mut self, vals: &[i16]) -> Result<()> {
        self.encode_i32(wire_count(vals.len())?)?;
        self.encode_i16_fixed(vals)
    }

    /// Encode the elements without the leading count, for callers that carry
    /// the length out of band (fixed-length arrays, separately encoded
    /// counts).
    fn encode_i16_fixed(&mut self, vals: &[i16]) -> Result<()> {
        for val in vals {
            self.encode_i16(*val)?;
        }
        Ok(())
    }

    fn encode_i32_vec(&mut self, vals: &[i32]) -> Result<()> {
        self.encode_i32(wire_count(vals.len())?)?;
        self.encode_i32_fixed(vals)
    }

    fn encode_i32_fixed(&mut self, vals: &[i32]) -> Result<()> {
        for val in vals {
            self.encode_i32(*val)?;
        }
        Ok(())
    }

    fn encode_i64_vec(&mut self, vals: &[i64]) -> Result<()> {
        self.encode_i32(wire_count(vals.len())?)?;
        self.encode_i64_fixed(vals)
    }

    fn encode_i64_fixed(&mut self, vals: &[i64]) -> Result<()> {
        for val in vals {
            self.encode_i64(*val)?;
        }
        Ok(())
    }

    fn encode_f32_vec(&mut self, vals: &[f32]) -> Result<()> {
        self.encode_i32(wire_count(vals.len())?)?;
        self.encode_f32_fixed(vals)
    }

    fn encode_f32_fixed(&mut self, vals: &[f32]) -> Result<()> {
        for val in vals {
            self.encode_f32(*val)?;
        }
        Ok(())
    }

    fn encode_f64_vec(&mut self, vals: &[f64]) -> Result<()> {
        self.encode_i32(wire_count(vals.len())?)?;
        self.encode_f64_fixed(vals)
    }

    fn encode_f64_fixed(&mut self, vals: &[f64]) -> Result<()> {
        for val in vals {
            self.encode_f64(*val)?;
        }
        Ok(())
    }

    fn encode_bool_vec(&mut self, vals: &[bool]) -> Result<()> {
        self.encode_i32(wire_count(vals.len())?)?;
        self.encode_bool_fixed(vals)
    }

    fn encode_bool_fixed(&mut self, vals: &[bool]) -> Result<()> {
        for val in vals {
            self.encode_bool(*val)?;
        }
        Ok(())
    }

    fn encode_string_vec<S: AsRef<str>>(&mut self, vals: &[S]) -> Result<()> {
        self.encode_i32(wire_count(vals.len())?)?;
        self.encode_string_fixed(vals)
    }

    fn encode_string_fixed<S: AsRef<str>>(&mut self, vals: &[S]) -> Result<()> {
        for val in vals {
            self.encode_string(val.as_ref())?;
        }
        Ok(())
    }
}

/// A source of XDR-encoded values.
///
/// The mirror image of [`Encoder`]: a backing provides the record lifecycle,
/// the 32-bit word, and fixed opaque, and every other XDR type is derived.
/// Every decode yields a freshly owned value.
pub trait Decoder {
    /// Start decoding a record. Backings that pull data from a transport
    /// perform their first read here and may block.
    fn begin(&mut self) -> Result<()>;

    /// Finish with the current record, discarding any of it that was never
    /// decoded. The stream is left ready for the next `begin` even if the
    /// record was abandoned after an error.
    fn end(&mut self) -> Result<()>;

    /// Decode one big-endian wire word as an unsigned 32-bit integer.
    fn decode_u32(&mut self) -> Result<u32>;

    /// Fill all of `dst` from the wire, then consume (without checking) the
    /// pad octets that align the body to a word boundary.
    fn decode_opaque_into(&mut self, dst: &mut [u8]) -> Result<()>;

    /// The encoding used by `decode_string`.
    fn character_encoding(&self) -> CharacterEncoding;

    /// Octets left in the current record, when the backing knows. Stream
    /// backings that can fetch further fragments return `None`.
    fn remaining(&self) -> Option<usize> {
        None
    }

    /// The decoded value equals the 32-bit two's-complement interpretation
    /// of the four wire octets.
    fn decode_i32(&mut self) -> Result<i32> {
        Ok(self.decode_u32()? as i32)
    }

    /// Any non-zero int decodes as true.
    fn decode_bool(&mut self) -> Result<bool> {
        Ok(self.decode_i32()? != 0)
    }

    /// Narrow integers are carried in the low-order byte(s) of the word.
    fn decode_i8(&mut self) -> Result<i8> {
        Ok(self.decode_i32()? as i8)
    }

    fn decode_u8(&mut self) -> Result<u8> {
        Ok(self.decode_i32()? as u8)
    }

    fn decode_i16(&mut self) -> Result<i16> {
        Ok(self.decode_i32()? as i16)
    }

    fn decode_u16(&mut self) -> Result<u16> {
        Ok(self.decode_i32()? as u16)
    }

    fn decode_char(&mut self) -> Result<char> {
        Ok((self.decode_u32()? as u8) as char)
    }

    /// Rejoin the two words of a hyper. The mask keeps the low word from
    /// sign-extending into the high one.
    fn decode_i64(&mut self) -> Result<i64> {
        let high = self.decode_i32()? as i64;
        let low = self.decode_i32()? as i64;
        Ok((high << 32) | (low & 0xffff_ffff))
    }

    fn decode_u64(&mut self) -> Result<u64> {
        let high = self.decode_u32()? as u64;
        let low = self.decode_u32()? as u64;
        Ok((high << 32) | low)
    }

    fn decode_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.decode_u32()?))
    }

    fn decode_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.decode_u64()?))
    }

    /// Decode fixed opaque of a length known from context.
    fn decode_opaque(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut body = vec![0; len];
        self.decode_opaque_into(&mut body)?;
        Ok(body)
    }

    /// Decode a counted opaque body. A count that exceeds what is left of
    /// the record is `Malformed` on backings that know their bounds.
    fn decode_opaque_vec(&mut self) -> Result<Vec<u8>> {
        let len = decoded_count(self.decode_i32()?)?;
        if let Some(remaining) = self.remaining() {
            if len > remaining {
                return Err(Error::Malformed(format!(
                    "length {len} exceeds the {remaining} octets left in the record"
                )));
            }
        }
        self.decode_opaque(len)
    }

    fn decode_string(&mut self) -> Result<String> {
        let bytes = self.decode_opaque_vec()?;
        Ok(self.character_encoding().decode_bytes(&bytes))
    }

    fn decode_i16_vec(&mut self) -> Result<Vec<i16>> {
        let count = decoded_count(self.decode_i32()?)?;
        self.decode_i16_fixed(count)
    }

    /// Decode `count` elements whose count was carried out of band.
    fn decode_i16_fixed(&mut self, count: usize) -> Result<Vec<i16>> {
        let mut vals = Vec::new();
        for _ in 0..count {
            vals.push(self.decode_i16()?);
        }
        Ok(vals)
    }

    fn decode_i32_vec(&mut self) -> Result<Vec<i32>> {
        let count = decoded_count(self.decode_i32()?)?;
        self.decode_i32_fixed(count)
    }

    fn decode_i32_fixed(&mut self, count: usize) -> Result<Vec<i32>> {
        let mut vals = Vec::new();
        for _ in 0..count {
            vals.push(self.decode_i32()?);
        }
        Ok(vals)
    }

    fn decode_i64_vec(&mut self) -> Result<Vec<i64>> {
        let count = decoded_count(self.decode_i32()?)?;
        self.decode_i64_fixed(count)
    }

    fn decode_i64_fixed(&mut self, count: usize) -> Result<Vec<i64>> {
        let mut vals = Vec::new();
        for _ in 0..count {
            vals.push(self.decode_i64()?);
        }
        Ok(vals)
    }

    fn decode_f32_vec(&mut self) -> Result<Vec<f32>> {
        let count = decoded_count(self.decode_i32()?)?;
        self.decode_f32_fixed(count)
    }

    fn decode_f32_fixed(&mut self, count: usize) -> Result<Vec<f32>> {
        let mut vals = Vec::new();
        for _ in 0..count {
            vals.push(self.decode_f32()?);
        }
        Ok(vals)
    }

    fn decode_f64_vec(&mut self) -> Result<Vec<f64>> {
        let count = decoded_count(self.decode_i32()?)?;
        self.decode_f64_fixed(count)
    }

    fn decode_f64_fixed(&mut self, count: usize) -> Result<Vec<f64>> {
        let mut vals = Vec::new();
        for _ in 0..count {
            vals.push(self.decode_f64()?);
        }
        Ok(vals)
    }

    fn decode_bool_vec(&mut self) -> Result<Vec<bool>> {
        let count = decoded_count(self.decode_i32()?)?;
        self.decode_bool_fixed(count)
    }

    fn decode_bool_fixed(&mut self, count: usize) -> Result<Vec<bool>> {
        let mut vals = Vec::new();
        for _ in 0..count {
            vals.push(self.decode_bool()?);
        }
        Ok(vals)
    }

    fn decode_string_vec(&mut self) -> Result<Vec<String>> {
        let count = decoded_count(self.decode_i32()?)?;
        self.decode_string_fixed(count)
    }

    fn decode_string_fixed(&mut self, count: usize) -> Result<Vec<String>> {
        let mut vals = Vec::new();
        for _ in 0..count {
            vals.push(self.decode_string()?);
        }
        Ok(vals)
    }
}
