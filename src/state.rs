//! Messages from the producer tasks to the telemetry task.

use hall_velocity_regulator::sampler::SampleError;
use hall_velocity_regulator::Observation;

/// `Copy` so producers can drop them into a channel with `try_send`.
#[derive(Clone, Copy)]
pub enum Telemetry {
    Cycle(Observation),
    Skipped(SampleError),
    /// Centimetres, or `None` when no echo came back.
    Range(Option<f32>),
}
