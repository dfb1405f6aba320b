//! Decoding of raw screencap output.

use image::RgbaImage;

use super::CaptureError;

/// The PNG file signature.
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// The PNG signature after a pty turned every `\n` into `\r\n`.
const PNG_SIGNATURE_TRANSLATED: [u8; 9] =
    [0x89, b'P', b'N', b'G', b'\r', b'\r', b'\n', 0x1a, b'\r'];

/// True if the bytes went through LF -> CRLF translation on the way out of
/// the device.
pub fn has_translated_line_endings(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE_TRANSLATED)
}

/// Collapses every `\r\n` into `\n`.
pub fn collapse_crlf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter().peekable();
    while let Some(&byte) = iter.next() {
        if byte == b'\r' && iter.peek() == Some(&&b'\n') {
            continue;
        }
        out.push(byte);
    }
    out
}

/// Undoes transport line-ending translation, if any, and decodes the image
/// to RGBA8.
///
/// Data whose signature arrived intact is decoded as-is so binary content
/// that happens to contain `\r\n` is never rewritten.
pub fn decode_screencap(data: &[u8]) -> Result<RgbaImage, CaptureError> {
    if data.is_empty() {
        return Err(CaptureError::Empty);
    }

    let img = if has_translated_line_endings(data) {
        let fixed = collapse_crlf(data);
        debug_assert!(fixed.starts_with(&PNG_SIGNATURE));
        image::load_from_memory(&fixed)?
    } else {
        image::load_from_memory(data)?
    };

    let rgba = img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(CaptureError::Empty);
    }
    Ok(rgba)
}
