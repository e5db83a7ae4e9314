use log::debug;
use loam_core::{containers::PointCloud, point::RawPoint, point::ScanPoint};

/// Direction in which the scanner head currently rotates
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RotationDirection {
    Positive,
    Negative,
}

impl RotationDirection {
    /// `1.0` for `Positive`, `-1.0` for `Negative`
    pub fn sign(self) -> f32 {
        match self {
            RotationDirection::Positive => 1.0,
            RotationDirection::Negative => -1.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            RotationDirection::Positive => RotationDirection::Negative,
            RotationDirection::Negative => RotationDirection::Positive,
        }
    }
}

impl Default for RotationDirection {
    fn default() -> Self {
        RotationDirection::Positive
    }
}

/// Everything that lives for exactly one sweep: the rotation direction and start time of the sweep, and
/// the four feature clouds that are accumulated over all scans of the sweep.
///
/// A `SweepState` is never cleared in place. A new sweep replaces the whole state with
/// [SweepState::starting_at].
#[derive(Debug, Clone, Default)]
pub struct SweepState {
    pub rotation_direction: RotationDirection,
    /// Timestamp in seconds of the message that started this sweep
    pub sweep_start: f64,
    /// Number of sweep boundaries detected before this sweep. The points seen before the first detected
    /// reversal belong to sweep `0`.
    pub sweep_index: usize,
    pub corner_sharp: PointCloud<ScanPoint>,
    pub corner_less_sharp: PointCloud<ScanPoint>,
    pub surface_flat: PointCloud<ScanPoint>,
    pub surface_less_flat: PointCloud<ScanPoint>,
}

impl SweepState {
    /// State of a fresh sweep that starts at `stamp` while rotating in `rotation_direction`
    pub fn starting_at(stamp: f64, rotation_direction: RotationDirection, sweep_index: usize) -> Self {
        Self {
            rotation_direction,
            sweep_start: stamp,
            sweep_index,
            ..Default::default()
        }
    }

    /// Total number of feature points accumulated in this sweep
    pub fn num_features(&self) -> usize {
        self.corner_sharp.len()
            + self.corner_less_sharp.len()
            + self.surface_flat.len()
            + self.surface_less_flat.len()
    }
}

/// Signed angle between the bearings of the first and last point of a message. Its sign tells in which
/// direction the scanner head moved while recording the message. Returns `None` if either point has no
/// bearing (origin or non-finite coordinates).
pub fn bearing_angle(first: &RawPoint, last: &RawPoint) -> Option<f32> {
    let first = first.bearing()?;
    let last = last.bearing()?;
    Some((last.x - first.x).atan2(last.y - first.y))
}

/// Decides whether the message with the given endpoints starts a new sweep. This is the case if the
/// scanner head rotates against the direction of the current sweep and more than `scan_period` seconds
/// have passed since the sweep started. The time gate debounces jitter around the reversal.
pub fn is_new_sweep(
    first: &RawPoint,
    last: &RawPoint,
    stamp: f64,
    sweep: &SweepState,
    scan_period: f32,
) -> bool {
    let angle = match bearing_angle(first, last) {
        Some(angle) => angle,
        None => return false,
    };
    angle * sweep.rotation_direction.sign() < 0.0
        && stamp - sweep.sweep_start > f64::from(scan_period)
}

/// Inspects the endpoints of a new message and replaces `sweep` with a fresh state if the message starts a
/// new sweep. Returns `true` if a reset happened. Empty messages never start a sweep.
pub fn detect_sweep_boundary(
    cloud: &PointCloud<RawPoint>,
    stamp: f64,
    sweep: &mut SweepState,
    scan_period: f32,
) -> bool {
    let (first, last) = match (cloud.first(), cloud.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return false,
    };
    if !is_new_sweep(first, last, stamp, sweep, scan_period) {
        return false;
    }
    let direction = sweep.rotation_direction.reversed();
    debug!(
        "New sweep {} at {:.3}s, rotation direction {:?}",
        sweep.sweep_index + 1,
        stamp,
        direction
    );
    *sweep = SweepState::starting_at(stamp, direction, sweep.sweep_index + 1);
    true
}
