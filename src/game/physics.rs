//! Sailing physics: wind field, sail trim, and propulsion pressure
//!
//! All angle arithmetic here is done in degrees because the trim policy is
//! defined by degree thresholds; public wrappers convert to radians where
//! vessel state needs them.

/// Fixed wind magnitude over the whole world
pub const WIND_SPEED: f32 = 64.0;

/// Maximum sail angle off the hull axis, in degrees
pub const SAIL_MAX_TURN_ANGLE: f32 = 60.0;

/// Tolerance used by angle comparisons to avoid oscillation at boundaries
pub const EPSILON_DEGREES: f32 = 0.001;

/// Side length of the square world
pub const WORLD_SIZE: f32 = 10_000.0;

/// Spawn coordinate for newly joined vessels
pub const SPAWN_X: f32 = -WORLD_SIZE / 4.0;
pub const SPAWN_Y: f32 = WORLD_SIZE / 4.0;

/// Hull turn rate in degrees per second at full steering input
pub const TURN_RATE_DEG_PER_SEC: f32 = 60.0;

/// Sail state increment per tick while the trim input is held
pub const SAIL_STEP_PER_TICK: f32 = 0.25;

/// Plain 2D vector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Rotate counter-clockwise by `angle` radians
    pub fn rotated(&self, angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2 {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Unit vector in the same direction; the zero vector stays zero
    pub fn normalized(&self) -> Vec2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / mag, self.y / mag)
        }
    }
}

/// Unit vector for a heading in radians
pub fn rotation_to_vector(rotation: f32) -> Vec2 {
    let (sin, cos) = rotation.sin_cos();
    Vec2::new(cos, sin)
}

/// Bearing of a vector in degrees, in (-180, 180]
pub fn vector_to_rotation_deg(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

/// Fold a degree angle into (-180, 180]
///
/// Closed-form: `%` discards whole turns keeping the sign, then at most one
/// extra turn is removed. The epsilon keeps values sitting exactly on the
/// boundary from flipping. Total over all of f32: non-finite input (which
/// has no meaningful heading) folds to 0.
pub fn normalize_rotation_deg(rotation: f32) -> f32 {
    if !rotation.is_finite() {
        return 0.0;
    }
    let mut result = rotation % 360.0;
    if result.abs() > 180.0 + EPSILON_DEGREES {
        result -= result.signum() * 360.0;
    }
    result
}

/// Signed smallest-turn angle from `a` to `b`, in degrees
///
/// Returns 0 when either vector is zero: the bearing of a zero vector is
/// undefined and callers must not steer off it.
pub fn angle_deg(a: Vec2, b: Vec2) -> f32 {
    if a.is_zero() || b.is_zero() {
        return 0.0;
    }
    normalize_rotation_deg(vector_to_rotation_deg(b) - vector_to_rotation_deg(a))
}

/// Wind vector at a world position
///
/// The field is a vortex: the wind blows perpendicular to the line from the
/// position back to the origin (the -position vector rotated 90°), at fixed
/// magnitude. At the origin itself the direction is undefined and the zero
/// vector is returned.
pub fn wind_vector_at(position: Vec2) -> Vec2 {
    let direction = Vec2::new(-position.x, -position.y)
        .rotated(std::f32::consts::FRAC_PI_2)
        .normalized();
    Vec2::new(direction.x * WIND_SPEED, direction.y * WIND_SPEED)
}

/// Which side of the hull the wind arrives from, relative to the trim limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SailCase {
    /// Wind from ahead: sail pinned at the maximum turn angle off the hull
    Front,
    /// Wind abeam: sail held 90° off the wind line
    Side,
    /// Wind from behind: sail squared to the wind
    Rear,
}

pub fn sail_case(ship: Vec2, wind: Vec2) -> SailCase {
    let ship_wind = angle_deg(ship, wind).abs();

    if ship_wind > (180.0 - SAIL_MAX_TURN_ANGLE) + EPSILON_DEGREES {
        SailCase::Front
    } else if ship_wind > SAIL_MAX_TURN_ANGLE + EPSILON_DEGREES {
        SailCase::Side
    } else {
        SailCase::Rear
    }
}

/// Absolute sail trim rotation for a hull heading and wind vector, in degrees
///
/// After the three-way trim policy the result is flipped 180° if the sail
/// would present its face away from the wind (sail-to-wind angle beyond
/// 90° + epsilon), so pressure is always taken on the windward face.
pub fn sail_rotation_deg(ship: Vec2, wind: Vec2) -> f32 {
    let ship_wind = angle_deg(ship, wind);

    let mut result = vector_to_rotation_deg(wind);

    match sail_case(ship, wind) {
        SailCase::Front => {
            result = vector_to_rotation_deg(ship)
                - (180.0 - SAIL_MAX_TURN_ANGLE) * ship_wind.signum();
        }
        SailCase::Side => {
            result -= 90.0 * ship_wind.signum();
        }
        SailCase::Rear => {}
    }

    result = normalize_rotation_deg(result);

    let sail_wind = normalize_rotation_deg(result - vector_to_rotation_deg(wind));
    if sail_wind.abs() > 90.0 + EPSILON_DEGREES {
        result += 180.0;
    }

    normalize_rotation_deg(result)
}

/// Absolute sail trim rotation in radians
pub fn sail_rotation(ship: Vec2, wind: Vec2) -> f32 {
    sail_rotation_deg(ship, wind).to_radians()
}

/// Normalized wind pressure on a sail, scaled by wind magnitude
///
/// With c = cos(sail-to-wind angle), pressure is (c²)³ + 0.4·(1 - c²)²:
/// the cos⁶ term peaks running square before the wind, the residual term
/// models drag-driven thrust with the wind abeam.
pub fn sail_pressure_normalized(sail: Vec2, wind: Vec2) -> f32 {
    let cos = angle_deg(sail, wind).to_radians().cos();
    let c2 = cos * cos;

    (c2.powi(3) + 0.4 * (1.0 - c2).powi(2)) * wind.magnitude()
}

/// Sail pressure projected onto the hull's forward axis
pub fn projected_pressure(ship: Vec2, sail: Vec2, wind: Vec2) -> f32 {
    let ship_sail = angle_deg(ship, sail).to_radians();
    ship_sail.cos() * sail_pressure_normalized(sail, wind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32, tol: f32) {
        assert!((a - b).abs() <= tol, "expected {b}, got {a}");
    }

    #[test]
    fn wind_magnitude_is_constant_off_origin() {
        for p in [
            Vec2::new(100.0, 0.0),
            Vec2::new(-3.0, 4.0),
            Vec2::new(0.5, -2500.0),
            Vec2::new(-4000.0, -4000.0),
        ] {
            assert_close(wind_vector_at(p).magnitude(), WIND_SPEED, 1e-2);
        }
    }

    #[test]
    fn wind_at_origin_is_zero() {
        assert!(wind_vector_at(Vec2::ZERO).is_zero());
    }

    #[test]
    fn wind_is_perpendicular_to_radial() {
        let p = Vec2::new(120.0, -35.0);
        let wind = wind_vector_at(p);
        // Vortex field: wind · position == 0
        let dot = wind.x * p.x + wind.y * p.y;
        assert_close(dot / (wind.magnitude() * p.magnitude()), 0.0, 1e-4);
    }

    #[test]
    fn angle_is_zero_for_zero_vectors() {
        assert_eq!(angle_deg(Vec2::ZERO, Vec2::new(1.0, 0.0)), 0.0);
        assert_eq!(angle_deg(Vec2::new(1.0, 0.0), Vec2::ZERO), 0.0);
    }

    #[test]
    fn angle_of_vector_with_itself_is_zero() {
        let v = Vec2::new(3.0, -7.0);
        assert_close(angle_deg(v, v), 0.0, 1e-5);
    }

    #[test]
    fn angle_stays_in_half_open_range() {
        let vectors = [
            Vec2::new(1.0, 0.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, -1.0),
            Vec2::new(0.3, -0.9),
        ];
        for a in vectors {
            for b in vectors {
                let angle = angle_deg(a, b);
                assert!(angle > -180.0 - EPSILON_DEGREES && angle <= 180.0 + EPSILON_DEGREES);
            }
        }
    }

    #[test]
    fn angle_is_signed_smallest_turn() {
        let east = Vec2::new(1.0, 0.0);
        let north = Vec2::new(0.0, 1.0);
        assert_close(angle_deg(east, north), 90.0, 1e-4);
        assert_close(angle_deg(north, east), -90.0, 1e-4);
    }

    #[test]
    fn normalize_rotation_is_idempotent() {
        for r in [0.0, 179.5, -179.5, 180.0, 360.0, 725.0, -1080.0, 540.0] {
            let once = normalize_rotation_deg(r);
            let twice = normalize_rotation_deg(once);
            assert_eq!(once, twice);
            assert!(once.abs() <= 180.0 + EPSILON_DEGREES);
        }
    }

    #[test]
    fn normalize_rotation_folds_extreme_magnitudes() {
        // Wire input can carry any f32; folding must stay in range (and
        // return) regardless of magnitude
        for r in [1.0e30, -1.0e30, f32::MAX, f32::MIN, 1.0e9, -123_456.7] {
            let folded = normalize_rotation_deg(r);
            assert!(folded.is_finite());
            assert!(folded.abs() <= 180.0 + EPSILON_DEGREES, "input {r}: {folded}");
        }
        assert_eq!(normalize_rotation_deg(f32::NAN), 0.0);
        assert_eq!(normalize_rotation_deg(f32::INFINITY), 0.0);
        assert_eq!(normalize_rotation_deg(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn sail_case_thresholds() {
        let wind = Vec2::new(1.0, 0.0);
        // Hull pointing into the wind
        assert_eq!(sail_case(Vec2::new(-1.0, 0.0), wind), SailCase::Front);
        // Hull across the wind
        assert_eq!(sail_case(Vec2::new(0.0, 1.0), wind), SailCase::Side);
        // Hull running with the wind
        assert_eq!(sail_case(Vec2::new(1.0, 0.0), wind), SailCase::Rear);
    }

    #[test]
    fn sail_never_faces_away_from_wind() {
        // Sweep hull headings against a fixed wind; the trimmed sail must
        // always keep its face within 90° of the wind line.
        let wind = Vec2::new(0.0, WIND_SPEED);
        for deg in (-180..=180).step_by(5) {
            let ship = rotation_to_vector((deg as f32).to_radians());
            let sail = rotation_to_vector(sail_rotation(ship, wind));
            let sail_wind = angle_deg(sail, wind).abs();
            assert!(
                sail_wind <= 90.0 + 0.01,
                "heading {deg}°: sail-to-wind angle {sail_wind}"
            );
        }
    }

    #[test]
    fn rear_case_squares_sail_to_wind() {
        let wind = Vec2::new(1.0, 0.0);
        let ship = Vec2::new(1.0, 0.0);
        assert_close(sail_rotation_deg(ship, wind), 0.0, 1e-3);
    }

    #[test]
    fn pressure_peaks_running_downwind() {
        let wind = Vec2::new(WIND_SPEED, 0.0);
        let aligned = sail_pressure_normalized(Vec2::new(1.0, 0.0), wind);
        let abeam = sail_pressure_normalized(Vec2::new(0.0, 1.0), wind);
        assert_close(aligned, WIND_SPEED, 1e-3);
        // Beam-on the drag term leaves 0.4 of the wind magnitude
        assert_close(abeam, 0.4 * WIND_SPEED, 1e-3);
        assert!(aligned > abeam);
    }

    #[test]
    fn projected_pressure_vanishes_with_sail_square_to_hull() {
        let wind = Vec2::new(WIND_SPEED, 0.0);
        let ship = Vec2::new(1.0, 0.0);
        let sail = Vec2::new(0.0, 1.0);
        assert_close(projected_pressure(ship, sail, wind), 0.0, 1e-2);
    }
}
