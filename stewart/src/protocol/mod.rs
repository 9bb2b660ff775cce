//! Serial wire format between the host and the servo controller board.
//!
//! Outbound, one frame per cadence tick:
//!
//! ```text
//! 0x6A 0x6A "<v0>,<v1>,<v2>,<v3>,<v4>,<v5>\n"
//! ```
//!
//! with each `v` the horn angle in centi-degrees. Inbound, the board reports
//! its IMU orientation and temperature as text lines:
//!
//! ```text
//! FB:<roll>,<pitch>,<yaw>,<temp>\n
//! ```
//!
//! There is no checksum or length prefix; framing relies on the header bytes
//! and the newline.

use tracing::debug;

mod frame;
mod telemetry;

pub use frame::*;
pub use telemetry::*;

/// Longest unterminated inbound tail kept between reads.
pub const MAX_LINE_LEN: usize = 256;

/// Splits complete `\n`-terminated lines off the front of `buffer`.
///
/// Incomplete trailing data stays in the buffer for the next read, unless it
/// exceeds `MAX_LINE_LEN`, in which case it is discarded. Lines that are not
/// valid UTF-8 are dropped.
pub fn extract_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let mut chunk = buffer.drain(..=pos).collect::<Vec<_>>();
        chunk.pop(); // remove the `\n`
        if let Ok(s) = String::from_utf8(chunk) {
            lines.push(s);
        }
    }
    if buffer.len() > MAX_LINE_LEN {
        debug!("no line terminator in {} bytes, dropping them", buffer.len());
        buffer.clear();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_lines_keeps_partial_tail() {
        let mut buffer = b"FB:1,2,3,4\nFB:5,6".to_vec();
        let lines = extract_lines(&mut buffer);
        assert_eq!(lines, vec!["FB:1,2,3,4".to_string()]);
        assert_eq!(buffer, b"FB:5,6".to_vec());

        buffer.extend_from_slice(b",7,8\r\n");
        let lines = extract_lines(&mut buffer);
        assert_eq!(lines, vec!["FB:5,6,7,8\r".to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn extract_lines_drops_invalid_utf8() {
        let mut buffer = vec![0xff, 0xfe, b'\n', b'o', b'k', b'\n'];
        let lines = extract_lines(&mut buffer);
        assert_eq!(lines, vec!["ok".to_string()]);
    }

    #[test]
    fn extract_lines_bounds_unterminated_input() {
        let mut buffer = Vec::new();
        for _ in 0..1000 {
            buffer.extend_from_slice(&[0x55; 4096]);
            assert!(extract_lines(&mut buffer).is_empty());
            assert!(buffer.len() <= MAX_LINE_LEN);
        }

        // the stream recovers once real lines arrive
        buffer.extend_from_slice(b"\nFB:1,2,3,4\n");
        let lines = extract_lines(&mut buffer);
        assert_eq!(lines.last().map(String::as_str), Some("FB:1,2,3,4"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn extract_lines_keeps_tail_up_to_the_limit() {
        let mut buffer = vec![b'1'; MAX_LINE_LEN];
        assert!(extract_lines(&mut buffer).is_empty());
        assert_eq!(buffer.len(), MAX_LINE_LEN);
    }
}
