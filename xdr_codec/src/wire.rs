// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

// Word-level primitives shared by every stream backing. All multi-byte values
// are big-endian, and every completed operation leaves the cursor on a 4-octet
// boundary.

use crate::{Error, Result, MIN_BUFFER_SIZE};

/// Size of an XDR wire word in octets. Every encoded value occupies a whole
/// number of words; this is the sole alignment rule.
pub(crate) const WORD_SIZE: usize = 4;

/// Bit in a record-marking header that flags the last fragment of a record.
pub(crate) const LAST_FRAGMENT: u32 = 1 << 31;

/// Number of zero octets that pad an `n`-octet opaque body out to the next
/// word boundary.
pub(crate) fn pad_len(n: usize) -> usize {
    (WORD_SIZE - n % WORD_SIZE) % WORD_SIZE
}

/// Round a requested buffer size up to a whole number of words, with a floor
/// of [`MIN_BUFFER_SIZE`].
pub(crate) fn round_buffer_size(requested: usize) -> usize {
    let rounded = requested.div_ceil(WORD_SIZE) * WORD_SIZE;
    rounded.max(MIN_BUFFER_SIZE)
}

/// Write one wire word at `*cursor`, advancing the cursor past it.
pub(crate) fn put_u32(buf: &mut [u8], cursor: &mut usize, val: u32) -> Result<()> {
    if *cursor + WORD_SIZE > buf.len() {
        return Err(Error::BufferOverflow);
    }
    buf[*cursor..*cursor + WORD_SIZE].copy_from_slice(&val.to_be_bytes());
    *cursor += WORD_SIZE;
    Ok(())
}

/// Read one wire word at `*cursor`, advancing the cursor past it. `limit` is
/// one past the last readable octet.
pub(crate) fn get_u32(buf: &[u8], cursor: &mut usize, limit: usize) -> Result<u32> {
    if *cursor + WORD_SIZE > limit {
        return Err(Error::BufferUnderflow);
    }
    let word = u32::from_be_bytes(buf[*cursor..*cursor + WORD_SIZE].try_into().unwrap());
    *cursor += WORD_SIZE;
    Ok(word)
}

/// Write `bytes` verbatim at `*cursor`, followed by zero octets up to the
/// next word boundary. The buffer may hold a previous record, so the pad
/// octets are written rather than assumed to be zero.
pub(crate) fn put_opaque(buf: &mut [u8], cursor: &mut usize, bytes: &[u8]) -> Result<()> {
    let padded = bytes.len() + pad_len(bytes.len());
    if *cursor + padded > buf.len() {
        return Err(Error::BufferOverflow);
    }
    buf[*cursor..*cursor + bytes.len()].copy_from_slice(bytes);
    buf[*cursor + bytes.len()..*cursor + padded].fill(0);
    *cursor += padded;
    Ok(())
}

/// Fill `dst` from the octets at `*cursor`, consuming (but not checking) the
/// pad octets that follow the body.
pub(crate) fn get_opaque_into(
    buf: &[u8],
    cursor: &mut usize,
    limit: usize,
    dst: &mut [u8],
) -> Result<()> {
    let padded = dst.len() + pad_len(dst.len());
    if *cursor + padded > limit {
        return Err(Error::BufferUnderflow);
    }
    dst.copy_from_slice(&buf[*cursor..*cursor + dst.len()]);
    *cursor += padded;
    Ok(())
}

/// Build a record-marking header for a fragment of `len` payload octets.
pub(crate) fn fragment_header(len: usize, last: bool) -> [u8; 4] {
    let mut header = len as u32;
    if last {
        header |= LAST_FRAGMENT;
    }
    header.to_be_bytes()
}

/// Split a record-marking header into the fragment length and the
/// last-fragment flag. The length is the low 31 bits; the flag bit is masked
/// off, never sign-extended into the length.
pub(crate) fn parse_fragment_header(header: [u8; 4]) -> (usize, bool) {
    let word = u32::from_be_bytes(header);
    ((word & !LAST_FRAGMENT) as usize, word & LAST_FRAGMENT != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding() {
        assert_eq!(pad_len(0), 0);
        assert_eq!(pad_len(1), 3);
        assert_eq!(pad_len(2), 2);
        assert_eq!(pad_len(3), 1);
        assert_eq!(pad_len(4), 0);
        assert_eq!(pad_len(5), 3);
    }

    #[test]
    fn buffer_size_rounding() {
        assert_eq!(round_buffer_size(0), MIN_BUFFER_SIZE);
        assert_eq!(round_buffer_size(1), MIN_BUFFER_SIZE);
        assert_eq!(round_buffer_size(1023), MIN_BUFFER_SIZE);
        assert_eq!(round_buffer_size(1024), 1024);
        assert_eq!(round_buffer_size(1025), 1028);
        assert_eq!(round_buffer_size(8190), 8192);
    }

    #[test]
    fn words() {
        let mut buf = [0_u8; 8];
        let mut cursor = 0;
        put_u32(&mut buf, &mut cursor, 0xdeadbeef).unwrap();
        put_u32(&mut buf, &mut cursor, 1).unwrap();
        assert!(matches!(
            put_u32(&mut buf, &mut cursor, 2),
            Err(Error::BufferOverflow)
        ));
        assert_eq!(buf, [0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 1]);

        let mut cursor = 0;
        assert_eq!(get_u32(&buf, &mut cursor, buf.len()).unwrap(), 0xdeadbeef);
        assert_eq!(get_u32(&buf, &mut cursor, buf.len()).unwrap(), 1);
        assert!(matches!(
            get_u32(&buf, &mut cursor, buf.len()),
            Err(Error::BufferUnderflow)
        ));
    }

    #[test]
    fn opaque_padding_written() {
        let mut buf = [0xff_u8; 8];
        let mut cursor = 0;
        put_opaque(&mut buf, &mut cursor, &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(cursor, 8);
        assert_eq!(buf, [1, 2, 3, 4, 5, 0, 0, 0]);
    }

    #[test]
    fn fragment_headers() {
        assert_eq!(fragment_header(4, true), [0x80, 0, 0, 4]);
        assert_eq!(fragment_header(1020, false), [0, 0, 0x03, 0xfc]);
        assert_eq!(fragment_header(0, true), [0x80, 0, 0, 0]);

        assert_eq!(parse_fragment_header([0x80, 0, 0, 4]), (4, true));
        assert_eq!(parse_fragment_header([0, 0, 0x03, 0xfc]), (1020, false));
        // The top bit must not leak into the length.
        assert_eq!(
            parse_fragment_header([0xff, 0xff, 0xff, 0xfc]),
            (0x7fff_fffc, true)
        );
    }
}
