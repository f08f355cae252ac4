//! Directivity patterns of the first-order cardioid family, and the traces
//! that show them around a sensor.
//!
//! A first-order pattern is `p + (1 - p) cos(theta)` where `theta` is the
//! angle between the sensor's orientation and the direction of interest. The
//! named members of the family only differ in `p`.

use crate::alignment::{dot, normalize, translate, Vec3};
use crate::scene::{Mesh3d, Mode, Scatter3d, Trace};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid resolution along both azimuth and colatitude.
const GRID_STEPS: usize = 35;

/// Length of the orientation indicator lines, in meters.
const DIRECTION_LENGTH: f64 = 0.25;

/// Named members of the first-order cardioid family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
pub enum CardioidPattern {
    /// `cos(theta)`, equal lobes front and back
    FigureEight,
    /// Narrow front lobe with a small rear lobe
    HyperCardioid,
    /// Null directly behind the sensor
    Cardioid,
    /// Wide front lobe, no null
    SubCardioid,
    /// Equal response in every direction
    Omni,
}

impl CardioidPattern {
    /// The weight of the omnidirectional component.
    pub fn coefficient(self) -> f64 {
        match self {
            CardioidPattern::FigureEight => 0.0,
            CardioidPattern::HyperCardioid => 0.25,
            CardioidPattern::Cardioid => 0.5,
            CardioidPattern::SubCardioid => 0.75,
            CardioidPattern::Omni => 1.0,
        }
    }

    /// Magnitude of the response towards `direction` for a sensor facing
    /// `orientation`. Neither vector needs to be unit length.
    pub fn response(self, orientation: Vec3, direction: Vec3) -> f64 {
        let p = self.coefficient();
        (p + (1.0 - p) * dot(normalize(orientation), normalize(direction))).abs()
    }
}

impl fmt::Display for CardioidPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardioidPattern::FigureEight => "Figure-eight",
            CardioidPattern::HyperCardioid => "Hypercardioid",
            CardioidPattern::Cardioid => "Cardioid",
            CardioidPattern::SubCardioid => "Subcardioid",
            CardioidPattern::Omni => "Omni",
        };
        write!(f, "{}", name)
    }
}

/// Unit vector for spherical angles in degrees, colatitude measured from +z.
pub fn direction_from_angles(azimuth_deg: f64, colatitude_deg: f64) -> Vec3 {
    let az = azimuth_deg.to_radians();
    let col = colatitude_deg.to_radians();
    [col.sin() * az.cos(), col.sin() * az.sin(), col.cos()]
}

fn linspace(start: f64, stop: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = (stop - start) / (n - 1) as f64;
    (0..n).map(move |i| start + i as f64 * step)
}

/// Points on the pattern surface: every azimuth/colatitude grid direction,
/// pushed out by `scale` times the response, around `position`.
pub fn pattern_points(position: Vec3, orientation: Vec3, pattern: CardioidPattern, scale: f64) -> Vec<Vec3> {
    let surface: Vec<Vec3> = linspace(0.0, 360.0, GRID_STEPS)
        .flat_map(|az| linspace(0.0, 180.0, GRID_STEPS).map(move |col| direction_from_angles(az, col)))
        .map(|d| {
            let r = scale * pattern.response(orientation, d);
            [r * d[0], r * d[1], r * d[2]]
        })
        .collect();
    translate(&surface, position)
}

/// A translucent hull around the pattern of a sensor at `position`.
pub fn pattern_mesh(
    position: Vec3,
    orientation: Vec3,
    pattern: CardioidPattern,
    scale: f64,
    color: &str,
    group: &str,
) -> Mesh3d {
    Mesh3d::new(&pattern_points(position, orientation, pattern, scale), 0.4, 0.3, color).legendgroup(group)
}

/// The legend entry toggling every pattern mesh of `group`. Meshes have no
/// legend of their own.
pub fn pattern_legend(color: &str, group: &str) -> Scatter3d {
    Scatter3d::legend_entry(group, Mode::Markers)
        .line(color, 2.0)
        .opacity(0.3)
}

/// One short black line per sensor from its position along its direction,
/// followed by a single legend entry that toggles them together.
pub fn direction_lines(positions: &[Vec3], directions: &[Vec3], group: &str) -> Vec<Trace> {
    positions
        .iter()
        .zip(directions)
        .map(|(&p, &d)| {
            let d = normalize(d);
            let end = [
                p[0] + DIRECTION_LENGTH * d[0],
                p[1] + DIRECTION_LENGTH * d[1],
                p[2] + DIRECTION_LENGTH * d[2],
            ];
            Scatter3d::plain_line(&[p, end], "black", 4.0)
                .legendgroup(group)
                .into()
        })
        .chain(std::iter::once(
            Scatter3d::legend_entry(group, Mode::Lines).line("black", 2.0).into(),
        ))
        .collect()
}
