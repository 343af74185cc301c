//! Byte-level JSON emission helpers for the self-contained backend.
//! Escaping matches serde_json: quote, backslash and ASCII control bytes,
//! with the short forms where JSON defines them.

use crate::value::{Number, Scalar};

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

pub fn write_escaped_str(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    let bytes = s.as_bytes();
    let mut start = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        if byte >= 0x20 && byte != b'"' && byte != b'\\' {
            continue;
        }
        out.extend_from_slice(&bytes[start..i]);
        match byte {
            b'"' => out.extend_from_slice(b"\\\""),
            b'\\' => out.extend_from_slice(b"\\\\"),
            0x08 => out.extend_from_slice(b"\\b"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b'\n' => out.extend_from_slice(b"\\n"),
            0x0C => out.extend_from_slice(b"\\f"),
            b'\r' => out.extend_from_slice(b"\\r"),
            other => out.extend_from_slice(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX_DIGITS[usize::from(other >> 4)],
                HEX_DIGITS[usize::from(other & 0xF)],
            ]),
        }
        start = i + 1;
    }
    out.extend_from_slice(&bytes[start..]);
    out.push(b'"');
}

pub fn write_f64(out: &mut Vec<u8>, value: f64) {
    if value.is_finite() {
        let mut buf = ryu::Buffer::new();
        out.extend_from_slice(buf.format_finite(value).as_bytes());
    } else {
        out.extend_from_slice(b"null");
    }
}

pub fn write_number(out: &mut Vec<u8>, number: &Number) {
    match *number {
        Number::I64(v) => out.extend_from_slice(v.to_string().as_bytes()),
        Number::U64(v) => out.extend_from_slice(v.to_string().as_bytes()),
        Number::F64(v) => write_f64(out, v),
    }
}

pub fn write_scalar(out: &mut Vec<u8>, value: &Scalar) {
    match value {
        Scalar::Null => out.extend_from_slice(b"null"),
        Scalar::Bool(true) => out.extend_from_slice(b"true"),
        Scalar::Bool(false) => out.extend_from_slice(b"false"),
        Scalar::Number(n) => write_number(out, n),
        Scalar::String(s) => write_escaped_str(out, s),
    }
}
