//! Frame scanner for the analyzer's output stream.
//!
//! The analyzer interleaves two kinds of frame on one byte stream:
//!
//! ```text
//! $S <hdr> <N power bytes>                  sweep (binary, 3 + N bytes)
//! #C2-F:<start_kHz>,<end_kHz>,<top>,<bot>\r\n  configuration (ASCII line)
//! ```
//!
//! There is no checksum and no escaping, so markers can appear by accident
//! inside sweep payloads. The scanner therefore works left to right and
//! skips a complete sweep frame as a unit once it has matched its marker.
//!
//! Two extraction policies are provided, see [`ScanPolicy`].

/// Marker that starts every sweep frame.
pub const SWEEP_MARKER: &[u8] = b"$S";

/// Marker that starts every configuration line.
pub const CONFIG_MARKER: &[u8] = b"#C2-F:";

/// Line terminator used by configuration and identity lines.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Substring that identifies the power-up banner.
pub const IDENTITY_MARKER: &[u8] = b"RF Explorer";

/// Bytes between the sweep marker and the first power byte.
pub const SWEEP_HEADER_LEN: usize = 1;

/// A configuration marker with no terminator within this many bytes of its
/// start is treated as garbage.
pub const MAX_CONFIG_LINE: usize = 64;

/// Total length of a sweep frame carrying `points` readings, marker included.
pub fn sweep_frame_len(points: usize) -> usize {
    SWEEP_MARKER.len() + SWEEP_HEADER_LEN + points
}

/// How sweep frames are pulled out of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPolicy {
    /// Only the newest sweep in the buffer is decoded; older ones are
    /// dropped. Lowest latency for a display that only shows the latest
    /// trace. The newest `$S` pair wins even when it sits inside a sweep's
    /// payload, in which case the real frame is lost and a misaligned one
    /// may be decoded later.
    LatestOnly,
    /// Every complete sweep is decoded in arrival order. Nothing is lost
    /// when several sweeps arrive between reads.
    #[default]
    Exhaustive,
}

/// Fields of a configuration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigFrame {
    /// Sweep start in kHz.
    pub start_khz: u32,
    /// Sweep end in kHz.
    pub end_khz: u32,
    /// Top of the amplitude scale in dBm, if present and numeric.
    pub amp_top_dbm: Option<i32>,
    /// Bottom of the amplitude scale in dBm, if present and numeric.
    pub amp_bottom_dbm: Option<i32>,
}

/// A frame found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannedFrame<'a> {
    /// Raw sweep payload, exactly the expected point count long.
    Sweep(&'a [u8]),
    /// A well-formed configuration line.
    Config(ConfigFrame),
}

/// Result of attempting to decode one frame from the front of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult<'a> {
    /// A complete frame was decoded. `consumed` counts every byte from the
    /// start of the input through the end of the frame, including any
    /// garbage before the marker.
    Frame {
        frame: ScannedFrame<'a>,
        consumed: usize,
    },

    /// A marker was found but what follows is not a valid frame. The `usize`
    /// is the number of bytes to skip (always at least one).
    Malformed(usize),

    /// No complete frame is available yet. The `usize` is the number of
    /// leading bytes that can be discarded because no frame can start in
    /// them.
    Incomplete(usize),
}

/// Result of scanning a whole buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan<'a> {
    /// Frames in stream order.
    pub frames: Vec<ScannedFrame<'a>>,
    /// Number of leading bytes the caller should trim from the buffer.
    pub consumed: usize,
}

impl Scan<'_> {
    /// Number of sweep frames found.
    pub fn sweep_count(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| matches!(f, ScannedFrame::Sweep(_)))
            .count()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Number of trailing bytes that might be the beginning of a marker split
/// across reads.
const MARKER_TAIL: usize = CONFIG_MARKER.len() - 1;

/// Decode one frame from the front of `buf`.
///
/// The earliest marker of either kind wins. A sweep frame needs
/// `sweep_frame_len(points)` bytes from its marker; a configuration line
/// needs its CRLF within [`MAX_CONFIG_LINE`] bytes.
pub fn decode_frame(buf: &[u8], points: usize) -> DecodeResult<'_> {
    let sweep_pos = find(buf, SWEEP_MARKER);
    let config_pos = find(buf, CONFIG_MARKER);

    match (sweep_pos, config_pos) {
        (None, None) => DecodeResult::Incomplete(buf.len().saturating_sub(MARKER_TAIL)),
        (Some(s), Some(c)) if c < s => decode_config_at(buf, c),
        (None, Some(c)) => decode_config_at(buf, c),
        (Some(s), _) => decode_sweep_at(buf, s, points),
    }
}

fn decode_sweep_at(buf: &[u8], pos: usize, points: usize) -> DecodeResult<'_> {
    let end = pos + sweep_frame_len(points);
    if buf.len() < end {
        return DecodeResult::Incomplete(pos);
    }
    let payload = &buf[pos + SWEEP_MARKER.len() + SWEEP_HEADER_LEN..end];
    DecodeResult::Frame {
        frame: ScannedFrame::Sweep(payload),
        consumed: end,
    }
}

fn decode_config_at(buf: &[u8], pos: usize) -> DecodeResult<'_> {
    let body_start = pos + CONFIG_MARKER.len();
    let window_end = (pos + MAX_CONFIG_LINE).min(buf.len());

    let Some(term) = find(&buf[body_start..window_end], LINE_TERMINATOR) else {
        if buf.len() >= pos + MAX_CONFIG_LINE {
            tracing::trace!(offset = pos, "configuration marker without terminator, skipping");
            return DecodeResult::Malformed(pos + 1);
        }
        return DecodeResult::Incomplete(pos);
    };

    let term_pos = body_start + term;
    let consumed = term_pos + LINE_TERMINATOR.len();
    match parse_config_fields(&buf[body_start..term_pos]) {
        Some(config) => DecodeResult::Frame {
            frame: ScannedFrame::Config(config),
            consumed,
        },
        None => {
            tracing::trace!(offset = pos, "malformed configuration line, skipping");
            DecodeResult::Malformed(consumed)
        }
    }
}

/// Decode bytes as ASCII, silently dropping anything outside the ASCII range.
fn ascii_lossy(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| char::from(b))
        .collect()
}

/// Parse the comma-separated body of a configuration line (everything
/// between the marker and the terminator).
///
/// The first two fields are the span in kHz and are required; the span must
/// be non-empty. The amplitude fields are optional. Returns `None` for
/// anything malformed: configuration parsing is best-effort.
pub fn parse_config_fields(body: &[u8]) -> Option<ConfigFrame> {
    let text = ascii_lossy(body);
    let mut fields = text.split(',').map(str::trim);

    let start_khz = fields.next()?.parse::<u32>().ok()?;
    let end_khz = fields.next()?.parse::<u32>().ok()?;
    if end_khz <= start_khz {
        return None;
    }

    let amp_top_dbm = fields.next().and_then(|f| f.parse().ok());
    let amp_bottom_dbm = fields.next().and_then(|f| f.parse().ok());

    Some(ConfigFrame {
        start_khz,
        end_khz,
        amp_top_dbm,
        amp_bottom_dbm,
    })
}

/// Find the first well-formed configuration line anywhere in `buf`.
///
/// Malformed and unterminated lines are skipped.
pub fn find_config_frame(buf: &[u8]) -> Option<ConfigFrame> {
    let mut cursor = 0;
    while let Some(rel) = find(&buf[cursor..], CONFIG_MARKER) {
        let pos = cursor + rel;
        let body_start = pos + CONFIG_MARKER.len();
        if let Some(term) = find(&buf[body_start..], LINE_TERMINATOR) {
            if let Some(config) = parse_config_fields(&buf[body_start..body_start + term]) {
                return Some(config);
            }
        }
        cursor = pos + 1;
    }
    None
}

/// Extract the identity banner: text from `RF Explorer` up to the next CRLF.
///
/// Returns `None` if the banner is absent or not yet terminated.
pub fn extract_identity(buf: &[u8]) -> Option<String> {
    let start = find(buf, IDENTITY_MARKER)?;
    let len = find(&buf[start..], LINE_TERMINATOR)?;
    let text = ascii_lossy(&buf[start..start + len]);
    Some(text.trim_end().to_string())
}

/// Scan `buf` for frames using the given policy.
pub fn scan(buf: &[u8], points: usize, policy: ScanPolicy) -> Scan<'_> {
    match policy {
        ScanPolicy::Exhaustive => scan_exhaustive(buf, points),
        ScanPolicy::LatestOnly => scan_latest(buf, points),
    }
}

/// Decode every complete frame from the start of the buffer, in order.
///
/// Stops at the first incomplete frame so it can be finished by the next
/// read. The result only depends on the bytes seen, not on how they were
/// split across reads.
pub fn scan_exhaustive(buf: &[u8], points: usize) -> Scan<'_> {
    let mut frames = Vec::new();
    let mut cursor = 0;

    loop {
        match decode_frame(&buf[cursor..], points) {
            DecodeResult::Frame { frame, consumed } => {
                frames.push(frame);
                cursor += consumed;
            }
            DecodeResult::Malformed(skip) => cursor += skip,
            DecodeResult::Incomplete(discard) => {
                cursor += discard;
                break;
            }
        }
    }

    Scan {
        frames,
        consumed: cursor,
    }
}

/// Decode only the newest sweep in the buffer.
///
/// Looks at the last sweep marker. If its frame is complete it is returned
/// and consumed together with everything before it; otherwise nothing is
/// returned and everything before the marker is dropped. The newest
/// well-formed configuration line in the consumed region is reported ahead
/// of the sweep. A configuration line still waiting for its terminator is
/// kept in the buffer when no sweep is decoded.
pub fn scan_latest(buf: &[u8], points: usize) -> Scan<'_> {
    let mut frames = Vec::new();

    let (cut, sweep) = match rfind(buf, SWEEP_MARKER) {
        Some(pos) => match decode_sweep_at(buf, pos, points) {
            DecodeResult::Frame { frame, consumed } => (consumed, Some(frame)),
            _ => (pos, None),
        },
        None => (buf.len().saturating_sub(MARKER_TAIL), None),
    };

    let (config, cut) = configs_before(buf, cut, sweep.is_none());
    frames.extend(config.map(ScannedFrame::Config));
    frames.extend(sweep);

    Scan {
        frames,
        consumed: cut,
    }
}

/// Newest configuration line starting before `cut`, decoded against the
/// whole buffer so a line straddling `cut` is still seen. Returns the
/// adjusted cut: it covers any reported line, and with `hold_pending` it
/// stops at the first line that has no terminator yet.
fn configs_before(buf: &[u8], mut cut: usize, hold_pending: bool) -> (Option<ConfigFrame>, usize) {
    let mut cursor = 0;
    let mut latest = None;
    while let Some(rel) = find(&buf[cursor..cut], CONFIG_MARKER) {
        let pos = cursor + rel;
        match decode_config_at(buf, pos) {
            DecodeResult::Frame {
                frame: ScannedFrame::Config(config),
                consumed,
            } => {
                latest = Some(config);
                cut = cut.max(consumed);
                cursor = consumed;
            }
            DecodeResult::Incomplete(_) if hold_pending => {
                cut = pos;
                break;
            }
            DecodeResult::Malformed(next) if next > pos => cursor = next,
            _ => cursor = pos + 1,
        }
        if cursor >= cut {
            break;
        }
    }
    (latest, cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rfexplorer_test_harness::frames::{config_frame, split_at_offsets, sweep_frame};

    const POINTS: usize = 112;

    fn payload(fill: u8) -> Vec<u8> {
        vec![fill; POINTS]
    }

    fn sweeps(scan: &Scan<'_>) -> Vec<Vec<u8>> {
        scan.frames
            .iter()
            .filter_map(|f| match f {
                ScannedFrame::Sweep(p) => Some(p.to_vec()),
                ScannedFrame::Config(_) => None,
            })
            .collect()
    }

    // ---------------------------------------------------------------
    // decode_frame
    // ---------------------------------------------------------------

    #[test]
    fn frame_length_is_115_for_112_points() {
        assert_eq!(sweep_frame_len(POINTS), 115);
    }

    #[test]
    fn decode_single_sweep() {
        let buf = sweep_frame(&payload(120));
        match decode_frame(&buf, POINTS) {
            DecodeResult::Frame {
                frame: ScannedFrame::Sweep(p),
                consumed,
            } => {
                assert_eq!(p, payload(120).as_slice());
                assert_eq!(consumed, 115);
            }
            other => panic!("expected sweep, got {other:?}"),
        }
    }

    #[test]
    fn decode_skips_leading_garbage() {
        let mut buf = b"\x00\x17noise".to_vec();
        buf.extend(sweep_frame(&payload(90)));
        match decode_frame(&buf, POINTS) {
            DecodeResult::Frame { consumed, .. } => assert_eq!(consumed, 7 + 115),
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[test]
    fn decode_truncated_sweep_is_incomplete_at_marker() {
        let mut buf = b"xx".to_vec();
        buf.extend(&sweep_frame(&payload(90))[..50]);
        assert_eq!(decode_frame(&buf, POINTS), DecodeResult::Incomplete(2));
    }

    #[test]
    fn decode_no_marker_keeps_possible_split_marker() {
        let buf = b"0123456789#C2-";
        assert_eq!(decode_frame(buf, POINTS), DecodeResult::Incomplete(9));
        assert_eq!(decode_frame(b"ab", POINTS), DecodeResult::Incomplete(0));
        assert_eq!(decode_frame(b"", POINTS), DecodeResult::Incomplete(0));
    }

    #[test]
    fn decode_config_line() {
        let buf = b"#C2-F:5500000,5700000,0000,-120\r\n";
        match decode_frame(buf, POINTS) {
            DecodeResult::Frame {
                frame: ScannedFrame::Config(config),
                consumed,
            } => {
                assert_eq!(config.start_khz, 5_500_000);
                assert_eq!(config.end_khz, 5_700_000);
                assert_eq!(config.amp_top_dbm, Some(0));
                assert_eq!(config.amp_bottom_dbm, Some(-120));
                assert_eq!(consumed, buf.len());
            }
            other => panic!("expected config, got {other:?}"),
        }
    }

    #[test]
    fn decode_config_before_sweep_wins() {
        let mut buf = config_frame(2_400_000, 2_500_000);
        buf.extend(sweep_frame(&payload(100)));
        assert!(matches!(
            decode_frame(&buf, POINTS),
            DecodeResult::Frame {
                frame: ScannedFrame::Config(_),
                ..
            }
        ));
    }

    #[test]
    fn decode_non_numeric_config_is_malformed() {
        let buf = b"#C2-F:abc,5700000,0000,-120\r\n";
        assert_eq!(decode_frame(buf, POINTS), DecodeResult::Malformed(buf.len()));
    }

    #[test]
    fn decode_config_with_one_field_is_malformed() {
        let buf = b"#C2-F:5500000\r\n";
        assert_eq!(decode_frame(buf, POINTS), DecodeResult::Malformed(buf.len()));
    }

    #[test]
    fn decode_unterminated_config_waits_then_gives_up() {
        let short = b"#C2-F:5500000,57";
        assert_eq!(decode_frame(short, POINTS), DecodeResult::Incomplete(0));

        let mut long = b"#C2-F:5500000,5700000".to_vec();
        long.resize(MAX_CONFIG_LINE, b'9');
        assert_eq!(decode_frame(&long, POINTS), DecodeResult::Malformed(1));
    }

    // ---------------------------------------------------------------
    // Configuration parsing
    // ---------------------------------------------------------------

    #[test]
    fn parse_fields_tolerates_whitespace_and_missing_amplitudes() {
        let config = parse_config_fields(b" 2400000 , 2500000").unwrap();
        assert_eq!(config.start_khz, 2_400_000);
        assert_eq!(config.end_khz, 2_500_000);
        assert_eq!(config.amp_top_dbm, None);
    }

    #[test]
    fn parse_fields_rejects_empty_span() {
        assert_eq!(parse_config_fields(b"2500000,2400000,0,-120"), None);
        assert_eq!(parse_config_fields(b"2500000,2500000,0,-120"), None);
    }

    #[test]
    fn parse_fields_ignores_non_ascii_bytes() {
        let config = parse_config_fields(b"55\xff00000,5700000").unwrap();
        assert_eq!(config.start_khz, 5_500_000);
    }

    #[test]
    fn find_config_skips_bad_lines() {
        let mut buf = b"junk#C2-F:x,y\r\n".to_vec();
        buf.extend(config_frame(5_100_000, 5_900_000));
        let config = find_config_frame(&buf).unwrap();
        assert_eq!((config.start_khz, config.end_khz), (5_100_000, 5_900_000));
    }

    #[test]
    fn find_config_absent() {
        assert_eq!(find_config_frame(b"#C2-F:5500000,5700000"), None);
        assert_eq!(find_config_frame(b"nothing here"), None);
    }

    #[test]
    fn identity_extraction() {
        let buf = b"\r\n#C2-M:006,255,01.15\r\nRF Explorer 6G Combo v1.15\r\n$S";
        assert_eq!(
            extract_identity(buf).as_deref(),
            Some("RF Explorer 6G Combo v1.15")
        );
        assert_eq!(extract_identity(b"RF Explorer 6G"), None);
        assert_eq!(extract_identity(b"$S\x70"), None);
    }

    // ---------------------------------------------------------------
    // Policies
    // ---------------------------------------------------------------

    #[test]
    fn two_frames_exhaustive_yields_both_in_order() {
        let mut buf = b"...".to_vec();
        buf.extend(sweep_frame(&payload(100)));
        buf.extend(b"..");
        buf.extend(sweep_frame(&payload(140)));
        buf.extend(b"...");

        let scan = scan(&buf, POINTS, ScanPolicy::Exhaustive);
        assert_eq!(sweeps(&scan), vec![payload(100), payload(140)]);
    }

    #[test]
    fn two_frames_latest_only_yields_second() {
        let mut buf = b"...".to_vec();
        buf.extend(sweep_frame(&payload(100)));
        buf.extend(b"..");
        buf.extend(sweep_frame(&payload(140)));
        buf.extend(b"...");

        let scan = scan(&buf, POINTS, ScanPolicy::LatestOnly);
        assert_eq!(sweeps(&scan), vec![payload(140)]);
        assert_eq!(scan.consumed, buf.len() - 3);
    }

    #[test]
    fn truncated_tail_is_preserved_by_exhaustive() {
        let mut buf = sweep_frame(&payload(100));
        let tail_start = buf.len();
        buf.extend(&sweep_frame(&payload(140))[..60]);

        let scan = scan_exhaustive(&buf, POINTS);
        assert_eq!(scan.sweep_count(), 1);
        assert_eq!(scan.consumed, tail_start);
    }

    #[test]
    fn truncated_tail_latest_only_discards_prefix() {
        let mut buf = sweep_frame(&payload(100));
        let tail_start = buf.len();
        buf.extend(&sweep_frame(&payload(140))[..60]);

        let scan = scan_latest(&buf, POINTS);
        assert_eq!(scan.sweep_count(), 0);
        assert_eq!(scan.consumed, tail_start);
    }

    #[test]
    fn marker_inside_payload_is_not_a_frame() {
        // Payload bytes 0x24 0x53 spell "$S" (-18 dBm, -41.5 dBm).
        let mut inner = payload(100);
        inner[10] = b'$';
        inner[11] = b'S';
        let mut buf = sweep_frame(&inner);
        buf.extend(sweep_frame(&payload(110)));

        let scan = scan_exhaustive(&buf, POINTS);
        assert_eq!(sweeps(&scan), vec![inner, payload(110)]);
        assert_eq!(scan.consumed, buf.len());
    }

    #[test]
    fn exhaustive_interleaves_config_in_stream_order() {
        let mut buf = sweep_frame(&payload(100));
        buf.extend(config_frame(5_100_000, 5_900_000));
        buf.extend(sweep_frame(&payload(110)));

        let scan = scan_exhaustive(&buf, POINTS);
        assert_eq!(scan.frames.len(), 3);
        assert!(matches!(scan.frames[0], ScannedFrame::Sweep(_)));
        assert!(matches!(scan.frames[1], ScannedFrame::Config(_)));
        assert!(matches!(scan.frames[2], ScannedFrame::Sweep(_)));
    }

    #[test]
    fn latest_only_reports_newest_config() {
        let mut buf = config_frame(2_400_000, 2_500_000);
        buf.extend(config_frame(5_100_000, 5_900_000));
        buf.extend(sweep_frame(&payload(110)));

        let scan = scan_latest(&buf, POINTS);
        assert_eq!(scan.frames.len(), 2);
        match scan.frames[0] {
            ScannedFrame::Config(config) => assert_eq!(config.start_khz, 5_100_000),
            ref other => panic!("expected config, got {other:?}"),
        }
    }

    #[test]
    fn latest_only_holds_unterminated_config_line() {
        let mut buf = b"xx".to_vec();
        let line = config_frame(5_500_000, 5_700_000);
        buf.extend(&line[..16]);

        let scan = scan_latest(&buf, POINTS);
        assert!(scan.frames.is_empty());
        assert_eq!(scan.consumed, 2);

        let mut rest = buf[scan.consumed..].to_vec();
        rest.extend(&line[16..]);
        let scan = scan_latest(&rest, POINTS);
        assert_eq!(scan.consumed, rest.len());
        match scan.frames.as_slice() {
            [ScannedFrame::Config(config)] => assert_eq!(config.start_khz, 5_500_000),
            other => panic!("expected one config, got {other:?}"),
        }
    }

    #[test]
    fn exhaustive_never_stalls_on_false_config_markers() {
        let mut buf = Vec::new();
        for _ in 0..10 {
            buf.extend(b"#C2-F:");
        }
        buf.resize(buf.len() + MAX_CONFIG_LINE, b'.');
        buf.extend(sweep_frame(&payload(77)));

        let scan = scan_exhaustive(&buf, POINTS);
        assert_eq!(sweeps(&scan), vec![payload(77)]);
    }

    // ---------------------------------------------------------------
    // Chunking independence
    // ---------------------------------------------------------------

    /// Feed `chunks` through an unbounded buffer the way the session does
    /// and collect every frame as owned data.
    fn feed(chunks: &[Vec<u8>], points: usize) -> Vec<String> {
        let mut buffer = Vec::new();
        let mut out = Vec::new();
        for chunk in chunks {
            buffer.extend_from_slice(chunk);
            let scan = scan_exhaustive(&buffer, points);
            for frame in &scan.frames {
                out.push(format!("{frame:?}"));
            }
            let consumed = scan.consumed;
            buffer.drain(..consumed);
        }
        out
    }

    fn stream_strategy() -> impl Strategy<Value = Vec<u8>> {
        let piece = prop_oneof![
            proptest::collection::vec(any::<u8>(), 0..40),
            proptest::collection::vec(any::<u8>(), 8).prop_map(|p| sweep_frame(&p)),
            (1u32..4_000_000, 1u32..4_000_000).prop_map(|(a, b)| config_frame(a, a + b)),
            Just(b"#C2-F:".to_vec()),
            Just(b"$".to_vec()),
        ];
        proptest::collection::vec(piece, 0..24).prop_map(|pieces| pieces.concat())
    }

    proptest! {
        #[test]
        fn chunking_does_not_change_decoded_frames(
            stream in stream_strategy(),
            offsets in proptest::collection::vec(any::<usize>(), 0..12),
        ) {
            let offsets: Vec<usize> = offsets
                .iter()
                .map(|o| if stream.is_empty() { 0 } else { o % stream.len() })
                .collect();
            let one_shot = feed(std::slice::from_ref(&stream), 8);
            let chunked = feed(&split_at_offsets(&stream, &offsets), 8);
            prop_assert_eq!(one_shot, chunked);
        }
    }
}
