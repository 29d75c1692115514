/// Unit conversions and angle helpers shared by the performance calculations

use std::f64::consts::PI;
use std::ops::{Add, Sub};

const TWO_PI: f64 = 2.0 * PI;

/// Knots per meter/second
pub const MS_TO_KNOTS: f64 = 1.94384449;

pub fn ms_to_knots(ms: f64) -> f64 {
    ms * MS_TO_KNOTS
}

pub fn knots_to_ms(knots: f64) -> f64 {
    knots / MS_TO_KNOTS
}

/// Wrap an angle in radians into [0, 2π)
pub fn wrap_2pi(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TWO_PI);
    // rem_euclid can round up to exactly 2π for tiny negative inputs
    if wrapped >= TWO_PI { 0.0 } else { wrapped }
}

/// Wrap an angle in radians into (-π, π]
pub fn wrap_pi(angle: f64) -> f64 {
    let wrapped = wrap_2pi(angle);
    if wrapped > PI { wrapped - TWO_PI } else { wrapped }
}

/// A velocity in the local horizontal plane, east/north components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector2 {
    pub east: f64,
    pub north: f64,
}

impl Vector2 {
    /// Build a vector from a navigation bearing (0 = north, clockwise) and a magnitude
    pub fn from_bearing(bearing: f64, magnitude: f64) -> Self {
        Self {
            east: bearing.sin() * magnitude,
            north: bearing.cos() * magnitude,
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.east.hypot(self.north)
    }

    /// Navigation bearing the vector points to, in (-π, π]
    pub fn bearing(&self) -> f64 {
        self.east.atan2(self.north)
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, other: Vector2) -> Vector2 {
        Vector2 {
            east: self.east + other.east,
            north: self.north + other.north,
        }
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, other: Vector2) -> Vector2 {
        Vector2 {
            east: self.east - other.east,
            north: self.north - other.north,
        }
    }
}
