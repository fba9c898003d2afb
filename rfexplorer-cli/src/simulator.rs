// Synthetic analyzer for --mock runs.
//
// Scripts the handshake on a MockTransport and then keeps queueing sweeps
// from a background task, deliberately split at random points so the
// session's reassembly is exercised the same way a real serial link would.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use rfexplorer_protocol::commands::cmd_query_config;
use rfexplorer_protocol::models::DeviceModel;
use rfexplorer_protocol::sweep::encode_dbm;
use rfexplorer_test_harness::MockTransport;
use rfexplorer_test_harness::frames::{config_frame, identity_line, sweep_frame};

/// Sweep period of the simulated device.
const SWEEP_PERIOD: Duration = Duration::from_millis(40);

/// Build a mock transport that answers the configuration query like the
/// given model with its default span.
pub fn scripted_transport(model: &DeviceModel) -> MockTransport {
    let mock = MockTransport::new();
    let mut response = identity_line(&format!("{} (simulated)", model.name));
    response.extend(config_frame(model.default_start_khz, model.default_end_khz));
    mock.expect(&cmd_query_config(), &response);
    mock
}

/// One synthetic sweep: a noise floor with a carrier that drifts slowly
/// across the band and fades in and out.
pub fn synthetic_payload<R: Rng>(rng: &mut R, points: usize, tick: u64) -> Vec<u8> {
    let centre = (tick / 5) as usize % points.max(1);
    let carrier_dbm = -45.0 - 15.0 * ((tick as f32) / 25.0).sin().abs();
    (0..points)
        .map(|i| {
            let distance = i.abs_diff(centre) as f32;
            let floor = -95.0 + rng.gen_range(-3.0f32..3.0);
            let signal = carrier_dbm - 6.0 * distance;
            encode_dbm(floor.max(signal))
        })
        .collect()
}

/// Feed sweeps into `mock` until `cancel` fires.
pub fn spawn_feeder(mock: MockTransport, points: usize, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::from_entropy();
        let mut ticker = tokio::time::interval(SWEEP_PERIOD);
        let mut tick: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let frame = sweep_frame(&synthetic_payload(&mut rng, points, tick));
            let cut = rng.gen_range(1..frame.len());
            mock.queue_chunks([frame[..cut].to_vec(), frame[cut..].to_vec()]);
            tick += 1;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfexplorer_protocol::models::rf_explorer_6g;
    use rfexplorer_protocol::sweep::decode_sweep;

    #[test]
    fn payload_has_carrier_above_floor() {
        let mut rng = StdRng::seed_from_u64(7);
        let payload = synthetic_payload(&mut rng, 112, 0);
        assert_eq!(payload.len(), 112);

        let readings = decode_sweep(&payload);
        assert!(readings[0] >= -45.0 - 0.5);
        assert!(readings[100] <= -92.0 + 0.5);
    }

    #[test]
    fn scripted_transport_expects_query() {
        let mock = scripted_transport(&rf_explorer_6g());
        assert_eq!(mock.remaining_expectations(), 1);
    }
}
