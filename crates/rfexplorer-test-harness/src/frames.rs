//! Builders for synthetic analyzer output.
//!
//! These produce byte-exact copies of what the firmware sends so tests can
//! assemble arbitrary streams (garbage, split frames, interleaved
//! configuration lines) without hardware.

/// Encode a reading in dBm the way the firmware does (`-2 * dBm`, clamped
/// to one byte).
pub fn dbm_byte(dbm: f32) -> u8 {
    (-dbm * 2.0).round().clamp(0.0, 255.0) as u8
}

/// A complete sweep frame: `$S`, one header byte, then the raw payload.
///
/// The header carries the payload length, as the firmware does for sweeps
/// of up to 255 points.
pub fn sweep_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(3 + payload.len());
    frame.extend_from_slice(b"$S");
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);
    frame
}

/// A sweep frame whose payload encodes the given readings in dBm.
pub fn sweep_frame_dbm(readings: &[f32]) -> Vec<u8> {
    let payload: Vec<u8> = readings.iter().map(|&dbm| dbm_byte(dbm)).collect();
    sweep_frame(&payload)
}

/// A sweep payload of `points` bytes where every bin reads `floor_dbm`
/// except `peak_index`, which reads `peak_dbm`.
pub fn single_peak_payload(points: usize, floor_dbm: f32, peak_index: usize, peak_dbm: f32) -> Vec<u8> {
    let mut payload = vec![dbm_byte(floor_dbm); points];
    if let Some(bin) = payload.get_mut(peak_index) {
        *bin = dbm_byte(peak_dbm);
    }
    payload
}

/// A configuration line as sent by the firmware, CRLF-terminated.
pub fn config_frame(start_khz: u32, end_khz: u32) -> Vec<u8> {
    format!("#C2-F:{start_khz:07},{end_khz:07},-010,-120\r\n").into_bytes()
}

/// An identity banner as emitted once after power-up.
pub fn identity_line(text: &str) -> Vec<u8> {
    format!("{text}\r\n").into_bytes()
}

/// Split `data` into chunks at the given offsets (out-of-range offsets are
/// clamped, duplicates produce empty chunks which are dropped).
pub fn split_at_offsets(data: &[u8], offsets: &[usize]) -> Vec<Vec<u8>> {
    let mut cuts: Vec<usize> = offsets.iter().map(|&o| o.min(data.len())).collect();
    cuts.sort_unstable();

    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(data.len())) {
        if cut > start {
            chunks.push(data[start..cut].to_vec());
            start = cut;
        }
    }
    chunks
}
