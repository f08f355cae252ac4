//! The physical description of a test facility: the room it is built in,
//! the tiles mounted on its walls and ceiling, and the reference microphones.
//!
//! Facilities are stored as [ron] documents. A minimal one looks like:
//!
//! ```text
//! (
//!     room: Shoebox(dimensions: (8.4, 4.0, 2.4)),
//!     tiles: [
//!         (name: "A01", channels: [
//!             (name: "A01-0", position: (0.5, 0.0, 1.2), normal: (0.0, 1.0, 0.0)),
//!         ]),
//!     ],
//!     microphones: [
//!         (name: "C07", position: (2.5, 0.0, 1.0), normal: (0.0, 1.0, 0.0)),
//!     ],
//! )
//! ```

use crate::alignment::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, fs, path::Path};

/// Something with a position and a facing: an antenna channel or a
/// microphone.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Sensor {
    /// Identifier, e.g. `A01` or `C07`
    pub name: String,
    /// Position in meters
    pub position: Vec3,
    /// Normal of the surface the sensor is mounted on
    pub normal: Vec3,
}

/// A mounting unit hosting one or more antenna channels.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Tile {
    /// Tile identifier
    pub name: String,
    /// The antenna channels on this tile
    pub channels: Vec<Sensor>,
}

/// Geometry of the room the facility lives in.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Room {
    /// A box with one corner at the origin, `(length, width, height)`.
    Shoebox {
        /// Extent along x, y and z
        dimensions: Vec3,
    },
    /// An arbitrary ground plan extruded to `height`.
    Polygon {
        /// Ground plan corners in order
        corners: Vec<[f64; 2]>,
        /// Ceiling height
        height: f64,
    },
}

impl Room {
    /// Corners of the ground plan, in order.
    pub fn vertices(&self) -> Vec<[f64; 2]> {
        match self {
            Room::Shoebox { dimensions: [l, w, _] } => {
                vec![[0.0, 0.0], [0.0, *w], [*l, *w], [*l, 0.0]]
            }
            Room::Polygon { corners, .. } => corners.clone(),
        }
    }

    /// Height of the ceiling above the floor.
    pub fn height(&self) -> f64 {
        match self {
            Room::Shoebox { dimensions } => dimensions[2],
            Room::Polygon { height, .. } => *height,
        }
    }

    /// Axis-aligned bounds of the room as `(min, max)`.
    pub fn extent(&self) -> (Vec3, Vec3) {
        let vertices = self.vertices();
        let fold = |f: fn(f64, f64) -> f64, init: f64, axis: usize| {
            vertices.iter().map(|v| v[axis]).fold(init, f)
        };
        (
            [fold(f64::min, f64::INFINITY, 0), fold(f64::min, f64::INFINITY, 1), 0.0],
            [
                fold(f64::max, f64::NEG_INFINITY, 0),
                fold(f64::max, f64::NEG_INFINITY, 1),
                self.height(),
            ],
        )
    }

    /// Checks that the room encloses a volume.
    pub fn validate(&self) -> Result<(), FacilityError> {
        let vertices = self.vertices();
        if vertices.len() < 3 {
            return Err(FacilityError::InvalidRoom(format!(
                "ground plan needs at least 3 corners, got {}",
                vertices.len()
            )));
        }
        if self.height() <= 0.0 {
            return Err(FacilityError::InvalidRoom(format!(
                "height must be positive, got {}",
                self.height()
            )));
        }
        Ok(())
    }
}

/// Errors raised while loading or querying a [Facility].
#[derive(Debug)]
pub enum FacilityError {
    /// Reading the configuration file failed.
    IoError(std::io::Error),

    /// The configuration is not valid RON for a [Facility].
    RonSpannedError(ron::de::SpannedError),

    /// A sensor was requested by a name no sensor carries.
    UnknownSensor(String),

    /// The room geometry does not enclose a volume.
    InvalidRoom(String),
}

impl fmt::Display for FacilityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use FacilityError as FE;
        let msg = match self {
            FE::IoError(error) => Cow::from(format!("io error: {}", error)),
            FE::RonSpannedError(error) => Cow::from(format!("ron error: {}", error)),
            FE::UnknownSensor(name) => Cow::from(format!("no sensor named {:?}", name)),
            FE::InvalidRoom(why) => Cow::from(format!("invalid room: {}", why)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for FacilityError {}

/// Everything there is to draw about a facility.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Facility {
    /// Room geometry
    pub room: Room,
    /// Antenna tiles
    #[serde(default)]
    pub tiles: Vec<Tile>,
    /// Reference microphones, usable as anchors
    #[serde(default)]
    pub microphones: Vec<Sensor>,
}

impl Facility {
    /// Read a [Facility] from a RON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FacilityError> {
        let text = fs::read_to_string(path.as_ref()).map_err(FacilityError::IoError)?;
        debug!("Loaded facility description from {}", path.as_ref().display());
        Self::from_str(&text)
    }

    /// Parse a [Facility] from RON text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self, FacilityError> {
        let facility: Facility = ron::from_str(text).map_err(FacilityError::RonSpannedError)?;
        facility.room.validate()?;
        Ok(facility)
    }

    /// Serialize to pretty RON.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Every antenna channel across all tiles.
    pub fn channels(&self) -> impl Iterator<Item = &Sensor> {
        self.tiles.iter().flat_map(|t| t.channels.iter())
    }

    /// Look a sensor up by name, microphones first, then antenna channels.
    pub fn sensor(&self, name: &str) -> Option<&Sensor> {
        self.microphones
            .iter()
            .chain(self.channels())
            .find(|s| s.name == name)
    }

    /// Positions of the named sensors, in the order given.
    pub fn anchor_positions<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Vec3>, FacilityError> {
        names
            .iter()
            .map(|n| {
                self.sensor(n.as_ref())
                    .map(|s| s.position)
                    .ok_or_else(|| FacilityError::UnknownSensor(n.as_ref().to_owned()))
            })
            .collect()
    }

    /// The Techtile room: an 8.4 x 4.0 x 2.4 m shoebox lined with tiles.
    ///
    /// Tiles are labelled by wall row letter and column number. The ceiling
    /// carries rows A-G, the two long walls carry rows of eight tiles each.
    /// Microphones sit at the centre of a subset of ceiling and wall tiles.
    pub fn techtile() -> Self {
        const LENGTH: f64 = 8.4;
        const WIDTH: f64 = 4.0;
        const HEIGHT: f64 = 2.4;
        const DOWN: Vec3 = [0.0, 0.0, -1.0];
        const INTO_ROOM_FROM_Y0: Vec3 = [0.0, 1.0, 0.0];
        const INTO_ROOM_FROM_YW: Vec3 = [0.0, -1.0, 0.0];

        let cols = 14;
        let col_pitch = LENGTH / cols as f64;
        let ceiling_rows = ['A', 'B', 'C', 'D', 'E', 'F', 'G'];
        let row_pitch = WIDTH / ceiling_rows.len() as f64;

        let mut tiles = Vec::new();
        let mut microphones = Vec::new();

        for (r, row) in ceiling_rows.iter().enumerate() {
            for c in 0..cols {
                let name = format!("{}{:02}", row, c + 1);
                let position = [
                    (c as f64 + 0.5) * col_pitch,
                    (r as f64 + 0.5) * row_pitch,
                    HEIGHT,
                ];
                tiles.push(Tile {
                    name: name.clone(),
                    channels: vec![Sensor {
                        name: format!("{}-0", name),
                        position,
                        normal: DOWN,
                    }],
                });
                microphones.push(Sensor {
                    name,
                    position,
                    normal: DOWN,
                });
            }
        }

        for (wall, y, normal) in [("W", 0.0, INTO_ROOM_FROM_Y0), ("V", WIDTH, INTO_ROOM_FROM_YW)] {
            for level in 0..2 {
                for c in 0..cols {
                    let name = format!("{}{}{:02}", wall, level + 1, c + 1);
                    let z = HEIGHT * (level as f64 + 1.0) / 3.0;
                    tiles.push(Tile {
                        name: name.clone(),
                        channels: vec![Sensor {
                            name: format!("{}-0", name),
                            position: [(c as f64 + 0.5) * col_pitch, y, z],
                            normal,
                        }],
                    });
                }
            }
        }

        Facility {
            room: Room::Shoebox {
                dimensions: [LENGTH, WIDTH, HEIGHT],
            },
            tiles,
            microphones,
        }
    }
}
