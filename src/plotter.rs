//! Builds the figures of a facility: the room, its antenna tiles and
//! microphones, anchors, and measurements.
//!
//! [TechtilePlotter] hands out traces into a [Scene] one call at a time and
//! gives the finished scene back from [TechtilePlotter::finish].
//! [plot_room_errors] is the one-shot version for the classic "errors in the
//! room" figure.

use crate::alignment::{apply, rotation_aligning, translate, Vec3};
use crate::directivity::{direction_lines, pattern_legend, pattern_mesh, CardioidPattern};
use crate::facility::{Facility, FacilityError, Room, Sensor};
use crate::measurements::Measurement;
use crate::room::wireframe;
use crate::scene::{Color, ColorBar, Layout, Marker, Mode, Scatter3d, Scene, SceneLayout, Text};
use log::debug;

/// Direction a marker faces before it is rotated onto a sensor's normal.
pub const MARKER_NORMAL: Vec3 = [0.0, 1.0, 0.0];

/// Side length of a sensor marker, in meters.
pub const MARKER_SIZE: f64 = 0.1;

const ANTENNA_COLOR: &str = "#66c2a5";
const MICROPHONE_COLOR: &str = "#fc8d62";
const ANCHOR_COLOR: &str = "#386055";
const PATTERN_SCALE: f64 = 0.3;

/// The outline of a marker in its own frame: a closed square in the x-z
/// plane, centred on the origin, facing [MARKER_NORMAL].
pub fn marker_outline(size: f64) -> [Vec3; 5] {
    let h = size / 2.0;
    [
        [-h, 0.0, -h],
        [-h, 0.0, h],
        [h, 0.0, h],
        [h, 0.0, -h],
        [-h, 0.0, -h],
    ]
}

/// The outline of the marker for `sensor`, turned to face its normal and
/// moved to its position.
pub fn oriented_marker(sensor: &Sensor, size: f64) -> Vec<Vec3> {
    let r = rotation_aligning(MARKER_NORMAL, sensor.normal);
    translate(&apply(&r, &marker_outline(size)), sensor.position)
}

/// The axis a filled marker should be projected along: whichever the normal
/// points most along.
fn fill_axis(normal: Vec3) -> u8 {
    let [x, y, z] = normal.map(f64::abs);
    if x >= y && x >= z {
        0
    } else if y >= z {
        1
    } else {
        2
    }
}

/// What to draw around each sensor besides its marker.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorDisplay {
    /// Draw this directivity pattern around every sensor
    pub pattern: Option<CardioidPattern>,
    /// Draw a short line along every sensor's normal
    pub directions: bool,
}

/// Accumulates the traces of a facility figure.
pub struct TechtilePlotter<'a> {
    facility: &'a Facility,
    scene: Scene,
}

impl<'a> TechtilePlotter<'a> {
    /// A plotter whose axes are locked to the room.
    pub fn new(facility: &'a Facility) -> Self {
        let (min, max) = facility.room.extent();
        let layout = Layout {
            scene: SceneLayout::fitted(min, max),
            ..Layout::default()
        };
        TechtilePlotter {
            facility,
            scene: Scene::new(layout),
        }
    }

    /// Set the figure title.
    pub fn title(mut self, title: &str) -> Self {
        let layout = self.scene.layout().clone().title(title);
        self.scene = self.scene.with_layout(layout);
        self
    }

    /// The room wireframe.
    pub fn room(mut self) -> Self {
        self.scene = self.scene.extend(room_traces(&self.facility.room));
        self
    }

    /// Markers for every antenna channel.
    pub fn antennas(self, display: SensorDisplay) -> Self {
        let channels: Vec<Sensor> = self.facility.channels().cloned().collect();
        self.sensors(&channels, "Antennas", ANTENNA_COLOR, display)
    }

    /// Markers for every microphone.
    pub fn microphones(self, display: SensorDisplay) -> Self {
        let microphones = self.facility.microphones.clone();
        self.sensors(&microphones, "Microphones", MICROPHONE_COLOR, display)
    }

    fn sensors(mut self, sensors: &[Sensor], group: &str, color: &str, display: SensorDisplay) -> Self {
        debug!("Plotting {} {}", sensors.len(), group.to_lowercase());

        let markers = sensors.iter().map(|s| {
            Scatter3d::lines(&oriented_marker(s, MARKER_SIZE))
                .line(color, 2.0)
                .fill(fill_axis(s.normal), color)
                .text(Text::One(s.name.clone()))
                .showlegend(false)
                .legendgroup(group)
        });
        self.scene = self
            .scene
            .extend(markers)
            .with_trace(Scatter3d::legend_entry(group, Mode::Lines).line(color, 2.0));

        if let Some(pattern) = display.pattern {
            let pattern_group = format!("{} {}", group, pattern);
            self.scene = self
                .scene
                .extend(sensors.iter().map(|s| {
                    pattern_mesh(s.position, s.normal, pattern, PATTERN_SCALE, color, &pattern_group)
                }))
                .with_trace(pattern_legend(color, &pattern_group));
        }

        if display.directions {
            let positions: Vec<Vec3> = sensors.iter().map(|s| s.position).collect();
            let normals: Vec<Vec3> = sensors.iter().map(|s| s.normal).collect();
            self.scene = self
                .scene
                .extend(direction_lines(&positions, &normals, &format!("{} directions", group)));
        }

        self
    }

    /// Square markers at the named sensors.
    pub fn anchors<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, FacilityError> {
        let positions = self.facility.anchor_positions(names)?;
        let labels = names.iter().map(|n| n.as_ref()).collect::<Vec<_>>();
        self.scene = self.scene.with_trace(anchor_trace(&positions, &labels));
        Ok(self)
    }

    /// Colour-coded measurement markers, with the colour range `[0, cmax]`.
    pub fn measurements(mut self, measurements: &[Measurement], cmax: f64) -> Self {
        self.scene = self.scene.with_trace(measurement_trace(measurements, cmax));
        self
    }

    /// Hand over the finished scene.
    pub fn finish(self) -> Scene {
        self.scene
    }
}

/// Wireframe traces for `room`.
pub fn room_traces(room: &Room) -> Vec<Scatter3d> {
    wireframe(room)
        .into_iter()
        .map(|(a, b)| Scatter3d::plain_line(&[a, b], "black", 2.0))
        .collect()
}

/// Anchor markers labelled `Anchor <name>`.
pub fn anchor_trace(positions: &[Vec3], names: &[&str]) -> Scatter3d {
    Scatter3d::markers(positions)
        .name("Anchors")
        .marker(Marker {
            size: Some(5.0),
            color: Some(ANCHOR_COLOR.into()),
            symbol: Some("square".to_owned()),
            ..Default::default()
        })
        .text(Text::Many(
            names.iter().map(|n| format!("Anchor {}", n)).collect(),
        ))
}

/// Measurement markers coloured by value on a Viridis scale.
pub fn measurement_trace(measurements: &[Measurement], cmax: f64) -> Scatter3d {
    let positions: Vec<Vec3> = measurements.iter().map(|m| m.position).collect();
    let values: Vec<f64> = measurements.iter().map(|m| m.value).collect();
    let text = measurements
        .iter()
        .enumerate()
        .map(|(i, m)| match &m.label {
            Some(label) => format!("{}<br>Error: {:.2} m", label, m.value),
            None => format!("Point {}<br>Error: {:.2} m", i, m.value),
        })
        .collect();

    Scatter3d::markers(&positions)
        .name("Error in m")
        .text(Text::Many(text))
        .marker(Marker {
            size: Some(10.0),
            color: Some(Color::Values(values)),
            colorscale: Some("Viridis".to_owned()),
            opacity: Some(0.8),
            showscale: Some(true),
            cmin: Some(0.0),
            cmax: Some(cmax),
            colorbar: Some(ColorBar { thickness: 20.0 }),
            symbol: None,
        })
}

/// The room drawn as a wireframe with errors at the measured positions and
/// the anchors used to measure them.
pub fn plot_room_errors(
    room: &Room,
    measurements: &[Measurement],
    anchor_positions: &[Vec3],
    anchor_names: &[&str],
    title: &str,
    cmax: f64,
) -> Scene {
    Scene::new(Layout::default().title(title))
        .with_trace(measurement_trace(measurements, cmax))
        .with_trace(anchor_trace(anchor_positions, anchor_names))
        .extend(room_traces(room))
}
