//! Support for information responses that carry one record per line, which
//! the derive macros can't express.

use atat::serde_at;
use core::fmt::Write;
use heapless::{String, Vec};
use serde::Deserialize;

/// Deserialize every non-empty line of `resp` as a `T`.
///
/// A response with more records than `N` is a parse error rather than a
/// silent truncation.
pub(crate) fn parse_lines<'a, T, const N: usize>(resp: &'a [u8]) -> Result<Vec<T, N>, atat::Error>
where
    T: Deserialize<'a>,
{
    let mut records = Vec::new();
    for line in resp.split(|b| *b == b'\n').map(trim) {
        if line.is_empty() {
            continue;
        }
        let record = serde_at::from_slice::<T>(line).map_err(|_| atat::Error::Parse)?;
        records.push(record).map_err(|_| atat::Error::Parse)?;
    }
    Ok(records)
}

/// Split a single response line on top-level commas, leaving quoted commas
/// alone. The `+XXX: ` prefix, if present, is stripped first.
pub(crate) fn fields(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = match line.iter().position(|b| *b == b':') {
        Some(i) if line.first() == Some(&b'+') => &line[i + 1..],
        _ => line,
    };

    let mut rest = Some(body);
    core::iter::from_fn(move || {
        let s = rest?;
        let mut quoted = false;
        let mut depth = 0usize;
        for (i, b) in s.iter().enumerate() {
            match b {
                b'"' => quoted = !quoted,
                b'(' if !quoted => depth += 1,
                b')' if !quoted => depth = depth.saturating_sub(1),
                b',' if !quoted && depth == 0 => {
                    rest = Some(&s[i + 1..]);
                    return Some(trim(&s[..i]));
                }
                _ => {}
            }
        }
        rest = None;
        Some(trim(s))
    })
}

pub(crate) fn trim(mut s: &[u8]) -> &[u8] {
    while let [b' ' | b'\r' | b'\n', tail @ ..] = s {
        s = tail;
    }
    while let [head @ .., b' ' | b'\r' | b'\n'] = s {
        s = head;
    }
    s
}

pub(crate) fn unquote(s: &[u8]) -> &[u8] {
    match s {
        [b'"', inner @ .., b'"'] => inner,
        _ => s,
    }
}

/// Render `AT<cmd>\r\n` into `buf`, returning the written length.
pub(crate) fn write_cmd(buf: &mut [u8], args: core::fmt::Arguments) -> usize {
    let mut s = String::<128>::new();
    // Command payloads are bounded by the callers' MAX_LEN
    let _ = s.write_fmt(format_args!("AT{}\r\n", args));
    let len = s.len().min(buf.len());
    buf[..len].copy_from_slice(&s.as_bytes()[..len]);
    len
}
