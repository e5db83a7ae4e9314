use loam_core::{containers::PointCloud, point::RawPoint};

pub const HALF_SIDE: f32 = 5.0;

/// Return of a beam with the given bearing (in radians) inside an empty square room of half side length
/// `HALF_SIDE`, with the sensor in the center of the room. Sensor-native axes, the beam rotates in the
/// xy-plane.
pub fn square_room_point(angle: f32) -> RawPoint {
    let (sin, cos) = angle.sin_cos();
    let range = HALF_SIDE / cos.abs().max(sin.abs());
    RawPoint::new(range * cos, range * sin, 0.0)
}

/// A full revolution of `n` returns in the square room, starting at bearing 0. With `n` divisible by 8 the
/// four room corners are hit exactly, at the indices `n/8`, `3n/8`, `5n/8` and `7n/8`.
pub fn square_room_scan(n: usize) -> PointCloud<RawPoint> {
    (0..n)
        .map(|i| square_room_point(i as f32 * std::f32::consts::PI * 2.0 / n as f32))
        .collect()
}

/// `n` returns in the square room, rotating from `start_degrees` to `end_degrees` (both inclusive)
pub fn square_room_arc(start_degrees: f32, end_degrees: f32, n: usize) -> PointCloud<RawPoint> {
    (0..n)
        .map(|i| {
            let t = i as f32 / (n - 1) as f32;
            square_room_point((start_degrees + t * (end_degrees - start_degrees)).to_radians())
        })
        .collect()
}

/// Returns along the outline of the square room with a coarse, uniform spacing: 50 wall points between
/// every two room corners plus the 4 corners themselves, 204 points in total. Starts in the middle of the
/// wall at `x = HALF_SIDE` and rotates counter-clockwise, so the corners are at the indices 25, 76, 127
/// and 178.
pub fn square_outline() -> PointCloud<RawPoint> {
    const WALL_POINTS: usize = 50;
    let corners = [
        (HALF_SIDE, HALF_SIDE),
        (-HALF_SIDE, HALF_SIDE),
        (-HALF_SIDE, -HALF_SIDE),
        (HALF_SIDE, -HALF_SIDE),
    ];
    let wall_point = |from: usize, k: usize| {
        let (x0, y0) = corners[from];
        let (x1, y1) = corners[(from + 1) % 4];
        let t = k as f32 / (WALL_POINTS + 1) as f32;
        RawPoint::new(x0 + t * (x1 - x0), y0 + t * (y1 - y0), 0.0)
    };

    let mut points = (WALL_POINTS / 2 + 1..=WALL_POINTS)
        .map(|k| wall_point(3, k))
        .collect::<Vec<_>>();
    for (index, (x, y)) in corners.iter().enumerate() {
        points.push(RawPoint::new(*x, *y, 0.0));
        if index < 3 {
            points.extend((1..=WALL_POINTS).map(|k| wall_point(index, k)));
        }
    }
    points.extend((1..=WALL_POINTS / 2).map(|k| wall_point(3, k)));
    points.into_iter().collect()
}
