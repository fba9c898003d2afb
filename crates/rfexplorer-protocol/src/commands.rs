//! Host-to-analyzer command builders.
//!
//! Every command is `#`, one length byte counting the whole command, then
//! ASCII text. Commands are built as complete byte vectors ready to hand to
//! [`Transport::send`](rfexplorer_core::Transport::send).

use bytes::{BufMut, BytesMut};
use rfexplorer_core::{Error, Result};

/// Ask the analyzer to report its current configuration.
pub const CMD_QUERY_CONFIG: &[u8] = b"#\x04C0\r\n";

/// Largest frequency the seven-digit kHz fields can carry.
pub const MAX_FIELD_KHZ: u32 = 9_999_999;

/// Amplitude range sent with a frequency change (top, bottom in dBm).
const SET_AMP_FIELDS: &str = "0000,-120";

fn framed(text: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(text.len() + 2);
    buf.put_u8(b'#');
    // Length counts the '#', itself, and the text.
    buf.put_u8((text.len() + 2) as u8);
    buf.put_slice(text.as_bytes());
    buf.to_vec()
}

/// Build the configuration query command.
pub fn cmd_query_config() -> Vec<u8> {
    CMD_QUERY_CONFIG.to_vec()
}

/// Build the command that sets a new sweep span.
///
/// Both edges must fit the seven-digit kHz field and `start_khz` must be
/// below `end_khz`.
pub fn cmd_set_frequency(start_khz: u32, end_khz: u32) -> Result<Vec<u8>> {
    if start_khz >= end_khz {
        return Err(Error::InvalidParameter(format!(
            "start {start_khz} kHz must be below end {end_khz} kHz"
        )));
    }
    if end_khz > MAX_FIELD_KHZ {
        return Err(Error::InvalidParameter(format!(
            "end {end_khz} kHz exceeds the {MAX_FIELD_KHZ} kHz field limit"
        )));
    }
    let text = format!("C2-F:{start_khz:07},{end_khz:07},{SET_AMP_FIELDS}");
    Ok(framed(&text))
}
