//! Device-motion reporters and hats: tilt and compass.
//!
//! Pure reads over the runtime's motion sample. The cardinal test keeps
//! the source's asymmetric windows: NORTH matches within half the compass
//! threshold (wrapping through 0); SOUTH, EAST and WEST match within the
//! full threshold.

use crate::core::runtime::MotionState;

/// Minimum tilt, in degrees, for `is_tilted` to fire.
pub const TILT_THRESHOLD: f64 = 15.0;

/// Window width, in degrees, for the cardinal pointing test.
pub const COMPASS_THRESHOLD: f64 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TiltDirection {
    Forward,
    Backward,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardinalDirection {
    North,
    South,
    East,
    West,
}

/// Signed tilt angle in the given direction, in degrees.
pub fn tilt_angle(motion: &MotionState, direction: TiltDirection) -> f64 {
    match direction {
        TiltDirection::Forward => motion.pitch,
        TiltDirection::Backward => -motion.pitch,
        TiltDirection::Left => -motion.roll,
        TiltDirection::Right => motion.roll,
    }
}

/// Whether the device is tilted at least `TILT_THRESHOLD` that way.
pub fn is_tilted(motion: &MotionState, direction: TiltDirection) -> bool {
    tilt_angle(motion, direction) >= TILT_THRESHOLD
}

/// Hat form of `is_tilted`; same predicate, evaluated each tick.
pub fn when_tilted(motion: &MotionState, direction: TiltDirection) -> bool {
    is_tilted(motion, direction)
}

/// Compass heading normalized into [0, 360).
pub fn compass_angle(motion: &MotionState) -> f64 {
    motion.heading.rem_euclid(360.0)
}

/// Whether the heading points at a cardinal direction.
pub fn is_pointed(motion: &MotionState, direction: CardinalDirection) -> bool {
    let heading = compass_angle(motion);
    match direction {
        CardinalDirection::North => {
            let half = COMPASS_THRESHOLD / 2.0;
            heading <= half || heading >= 360.0 - half
        }
        CardinalDirection::South => (heading - 180.0).abs() <= COMPASS_THRESHOLD,
        CardinalDirection::East => (heading - 90.0).abs() <= COMPASS_THRESHOLD,
        CardinalDirection::West => (heading - 270.0).abs() <= COMPASS_THRESHOLD,
    }
}
