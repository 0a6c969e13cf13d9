//! Hex payload encoding for the socket commands in hex mode.

use core::fmt;
use heapless::String;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encode `bytes` into `out`, failing if it does not fit.
pub fn encode_hex<const N: usize>(bytes: &[u8], out: &mut String<N>) -> Result<(), EncodeHexError> {
    out.clear();
    for b in bytes {
        out.push(HEX_DIGITS[(b >> 4) as usize] as char)
            .and_then(|_| out.push(HEX_DIGITS[(b & 0x0f) as usize] as char))
            .map_err(|_| EncodeHexError::BufferTooSmall)?;
    }
    Ok(())
}

/// Decode `s` into the front of `buf`, returning the number of bytes written.
pub fn decode_hex(s: &str, buf: &mut [u8]) -> Result<usize, DecodeHexError> {
    let s = s.as_bytes();
    if s.len() % 2 != 0 {
        return Err(DecodeHexError::OddLength);
    }
    let len = s.len() / 2;
    if len > buf.len() {
        return Err(DecodeHexError::BufferTooSmall);
    }
    for (out, pair) in buf.iter_mut().zip(s.chunks_exact(2)) {
        *out = (nibble(pair[0])? << 4) | nibble(pair[1])?;
    }
    Ok(len)
}

fn nibble(c: u8) -> Result<u8, DecodeHexError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(DecodeHexError::InvalidDigit),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeHexError {
    BufferTooSmall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeHexError {
    OddLength,
    InvalidDigit,
    BufferTooSmall,
}

impl fmt::Display for DecodeHexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeHexError::OddLength => "input string has an odd number of bytes".fmt(f),
            DecodeHexError::InvalidDigit => "input string contains a non-hex digit".fmt(f),
            DecodeHexError::BufferTooSmall => "output buffer too small".fmt(f),
        }
    }
}
