//! Reversible archive-name encoding.
//!
//! Collection URIs and file names can contain characters that are unsafe as
//! archive entry or directory names. `escape_*` maps each such byte of the
//! UTF-8 form to `%XX` (uppercase hex); [`unescape`] reverses the transform
//! exactly. The manifest records the original name, the archive layout uses
//! the escaped form.

use crate::error::{CoreError, CoreResult};

const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn is_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'_')
}

fn escape_impl(value: &str, keep_separators: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for &byte in value.as_bytes() {
        if is_safe(byte) || (keep_separators && byte == b'/') {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0f) as usize] as char);
        }
    }
    out
}

/// Escape a full collection path, keeping `/` separators intact.
#[must_use]
pub fn escape_path(path: &str) -> String {
    escape_impl(path, true)
}

/// Escape a single file or collection name.
#[must_use]
pub fn escape_name(name: &str) -> String {
    escape_impl(name, false)
}

/// Reverse [`escape_path`] / [`escape_name`].
///
/// # Errors
///
/// Returns [`CoreError::Encoding`] on a dangling or non-hex `%` sequence, or
/// if the decoded bytes are not UTF-8.
pub fn unescape(value: &str) -> CoreResult<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .ok_or_else(|| CoreError::encoding(format!("dangling escape in {value:?}")))?;
                let high = hex_digit(hex[0])?;
                let low = hex_digit(hex[1])?;
                out.push((high << 4) | low);
                i += 3;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8(out)
        .map_err(|e| CoreError::encoding(format!("escaped name is not UTF-8: {e}")))
}

fn hex_digit(byte: u8) -> CoreResult<u8> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        other => Err(CoreError::encoding(format!("bad hex digit {:?}", other as char))),
    }
}
