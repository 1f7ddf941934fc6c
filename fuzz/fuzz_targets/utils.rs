use std::str;

pub const MAX_INPUT_SIZE: usize = 64 * 1024;

/// Returns a UTF-8 view of `data` truncated to `MAX_INPUT_SIZE`.
///
/// If the truncated data is not valid UTF-8, only up to 3 bytes are trimmed to
/// recover from cutting a multibyte codepoint.
#[inline]
pub fn truncate_utf8(data: &[u8]) -> Option<&str> {
    let cap = data.len().min(MAX_INPUT_SIZE);
    for trim in 0..=3 {
        if cap < trim {
            break;
        }
        let slice = &data[..cap - trim];
        if let Ok(text) = str::from_utf8(slice) {
            return Some(text);
        }
    }
    None
}

/// An offset derived from the leading bytes of `data`, moved back to a char
/// boundary of `text`.
pub fn offset_in(text: &str, data: &[u8], skip: usize) -> usize {
    let mut bytes = [0u8; 4];
    let tail = data.get(skip..).unwrap_or_default();
    let n = tail.len().min(bytes.len());
    bytes[..n].copy_from_slice(&tail[..n]);
    let mut offset = u32::from_le_bytes(bytes) as usize % (text.len() + 1);
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
