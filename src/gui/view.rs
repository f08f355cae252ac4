//! Flattening the room onto the dashboard's 2D charts: projections, chart
//! bounds, outlines, and value bands with their colours.

use ratatui::style::Color;

use crate::alignment::Vec3;
use crate::facility::Room;
use crate::measurements::Measurement;

/// Viridis, sampled at five evenly spaced stops.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// Which two room axes a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Looking down: x across, y up
    Top,
    /// Looking from the y = 0 wall: x across, z up
    Side,
}

impl Projection {
    /// Drop the axis this projection looks along.
    pub fn project(self, p: Vec3) -> (f64, f64) {
        match self {
            Projection::Top => (p[0], p[1]),
            Projection::Side => (p[0], p[2]),
        }
    }

    /// Axis titles, across then up.
    pub fn axis_titles(self) -> (&'static str, &'static str) {
        match self {
            Projection::Top => ("x [m]", "y [m]"),
            Projection::Side => ("x [m]", "z [m]"),
        }
    }
}

/// Chart bounds for a projection of a room, with a little margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    /// Horizontal `[min, max]`
    pub x: [f64; 2],
    /// Vertical `[min, max]`
    pub y: [f64; 2],
}

impl ViewBounds {
    const MARGIN: f64 = 0.2;

    /// Bounds that fit `room` as seen through `projection`.
    pub fn fit(room: &Room, projection: Projection) -> Self {
        let (min, max) = room.extent();
        let (x0, y0) = projection.project(min);
        let (x1, y1) = projection.project(max);
        ViewBounds {
            x: [x0 - Self::MARGIN, x1 + Self::MARGIN],
            y: [y0 - Self::MARGIN, y1 + Self::MARGIN],
        }
    }

    /// Three tick labels per axis: both ends and the middle.
    pub fn labels(&self) -> (Vec<String>, Vec<String>) {
        let ticks = |[lo, hi]: [f64; 2]| {
            [lo, (lo + hi) / 2.0, hi]
                .iter()
                .map(|v| format!("{:.1}", v))
                .collect::<Vec<String>>()
        };
        (ticks(self.x), ticks(self.y))
    }
}

/// The room outline as a closed polyline in chart coordinates.
pub fn room_outline(room: &Room, projection: Projection) -> Vec<(f64, f64)> {
    match projection {
        Projection::Top => {
            let mut outline: Vec<(f64, f64)> = room.vertices().iter().map(|v| (v[0], v[1])).collect();
            if let Some(&first) = outline.first() {
                outline.push(first);
            }
            outline
        }
        Projection::Side => {
            let (min, max) = room.extent();
            let h = room.height();
            vec![(min[0], 0.0), (min[0], h), (max[0], h), (max[0], 0.0), (min[0], 0.0)]
        }
    }
}

/// Project sensor positions.
pub fn sensor_points(positions: &[Vec3], projection: Projection) -> Vec<(f64, f64)> {
    positions.iter().map(|&p| projection.project(p)).collect()
}

/// Split measurements into `bands` equal value ranges over `[0, cmax]` and
/// project each range. Values outside the range land in the nearest band.
pub fn color_bands(
    measurements: &[Measurement],
    cmax: f64,
    bands: usize,
    projection: Projection,
) -> Vec<Vec<(f64, f64)>> {
    let mut out = vec![Vec::new(); bands];
    if bands == 0 {
        return out;
    }
    for m in measurements {
        let t = if cmax > 0.0 { m.value / cmax } else { 0.0 };
        let band = ((t * bands as f64).floor().max(0.0) as usize).min(bands - 1);
        out[band].push(projection.project(m.position));
    }
    out
}

/// Colour of band `i` of `bands`, sampled from Viridis.
pub fn band_color(i: usize, bands: usize) -> Color {
    let t = if bands > 1 {
        i as f64 / (bands - 1) as f64
    } else {
        0.0
    };
    let scaled = t.clamp(0.0, 1.0) * (VIRIDIS.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(VIRIDIS.len() - 1);
    let frac = scaled - lo as f64;
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (r0, g0, b0) = VIRIDIS[lo];
    let (r1, g1, b1) = VIRIDIS[hi];
    Color::Rgb(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::Shoebox {
            dimensions: [8.4, 4.0, 2.4],
        }
    }

    #[test]
    fn projections() {
        assert_eq!(Projection::Top.project([1.0, 2.0, 3.0]), (1.0, 2.0));
        assert_eq!(Projection::Side.project([1.0, 2.0, 3.0]), (1.0, 3.0));
    }

    #[test]
    fn bounds_cover_room() {
        let b = ViewBounds::fit(&room(), Projection::Side);
        assert!(b.x[0] < 0.0 && b.x[1] > 8.4);
        assert!(b.y[0] < 0.0 && b.y[1] > 2.4);
        let (xs, ys) = b.labels();
        assert_eq!(xs, vec!["-0.2", "4.2", "8.6"]);
        assert_eq!(ys.len(), 3);
    }

    #[test]
    fn outlines_are_closed() {
        for p in [Projection::Top, Projection::Side] {
            let outline = room_outline(&room(), p);
            assert_eq!(outline.first(), outline.last());
            assert_eq!(outline.len(), 5);
        }
    }

    #[test]
    fn bands_split_values() {
        let ms = vec![
            Measurement::new([0.0, 0.0, 0.0], 0.0),
            Measurement::new([1.0, 0.0, 0.0], 0.74),
            Measurement::new([2.0, 0.0, 0.0], 0.76),
            Measurement::new([3.0, 0.0, 0.0], 9.0),
            Measurement::new([4.0, 0.0, 0.0], -1.0),
        ];
        let bands = color_bands(&ms, 1.5, 2, Projection::Top);
        assert_eq!(bands[0], vec![(0.0, 0.0), (1.0, 0.0), (4.0, 0.0)]);
        assert_eq!(bands[1], vec![(2.0, 0.0), (3.0, 0.0)]);
    }

    #[test]
    fn band_colors_span_viridis() {
        assert_eq!(band_color(0, 5), Color::Rgb(68, 1, 84));
        assert_eq!(band_color(4, 5), Color::Rgb(253, 231, 37));
        assert_eq!(band_color(0, 1), Color::Rgb(68, 1, 84));
    }
}
