use tracing::debug;

use crate::LEG_COUNT;

/// Two sync bytes opening every outbound frame.
pub const FRAME_HEADER: [u8; 2] = [0x6A, 0x6A];

pub const FRAME_TERMINATOR: u8 = b'\n';

/// Converts a horn angle in radians to the integer centi-degrees sent on the wire.
///
/// The fractional part is truncated toward zero, matching the board firmware.
/// `NaN` has no meaningful encoding; gate on validity before calling.
pub fn to_centidegrees(alpha: f64) -> i32 {
    (alpha.to_degrees() * 100.0) as i32
}

pub fn from_centidegrees(value: i32) -> f64 {
    (value as f64 / 100.0).to_radians()
}

/// Encodes six horn angles (radians) into one outbound frame.
///
/// Returns `None` if any angle is undefined so that a partial or meaningless
/// frame can never be produced.
pub fn encode_frame(alpha: &[f64; LEG_COUNT]) -> Option<Vec<u8>> {
    if alpha.iter().any(|a| a.is_nan()) {
        return None;
    }
    Some(encode_centidegrees(&alpha.map(to_centidegrees)))
}

pub fn encode_centidegrees(values: &[i32; LEG_COUNT]) -> Vec<u8> {
    let body = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");

    let mut frame = Vec::with_capacity(FRAME_HEADER.len() + body.len() + 1);
    frame.extend_from_slice(&FRAME_HEADER);
    frame.extend_from_slice(body.as_bytes());
    frame.push(FRAME_TERMINATOR);
    frame
}

/// Parses one complete frame (header through newline) back to centi-degrees.
pub fn decode_frame(frame: &[u8]) -> Option<[i32; LEG_COUNT]> {
    let body = frame.strip_prefix(&FRAME_HEADER)?;
    let body = body.strip_suffix(&[FRAME_TERMINATOR])?;
    parse_body(body)
}

fn parse_body(body: &[u8]) -> Option<[i32; LEG_COUNT]> {
    let text = std::str::from_utf8(body).ok()?;
    let mut values = [0i32; LEG_COUNT];
    let mut fields = text.split(',');
    for value in values.iter_mut() {
        *value = fields.next()?.trim().parse().ok()?;
    }
    if fields.next().is_some() {
        return None;
    }
    Some(values)
}

/// Longest frame the decoder waits for. Six `i32` fields, commas, header and
/// terminator fit well within it.
pub const MAX_FRAME_LEN: usize = 128;

/// Reassembles frames from an arbitrarily chunked byte stream.
///
/// Bytes before a header are discarded, so a receiver that joins mid-frame
/// resynchronizes on the next header. A header with no terminator within
/// `MAX_FRAME_LEN` bytes is abandoned, so the buffer stays bounded.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<[i32; LEG_COUNT]> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        loop {
            let Some(start) = self
                .buffer
                .windows(FRAME_HEADER.len())
                .position(|w| w == FRAME_HEADER)
            else {
                // keep a trailing half header
                let keep = usize::from(self.buffer.last() == Some(&FRAME_HEADER[0]));
                let drop_to = self.buffer.len() - keep;
                self.buffer.drain(..drop_to);
                break;
            };
            self.buffer.drain(..start);

            let Some(end) = self.buffer.iter().position(|&b| b == FRAME_TERMINATOR) else {
                if self.buffer.len() <= MAX_FRAME_LEN {
                    break;
                }
                // header never terminated; rescan past it
                debug!("unterminated frame of {} bytes, dropping header", self.buffer.len());
                self.buffer.drain(..FRAME_HEADER.len());
                continue;
            };
            let frame: Vec<u8> = self.buffer.drain(..=end).collect();
            if let Some(values) = decode_frame(&frame) {
                frames.push(values);
            }
        }
        frames
    }
}
