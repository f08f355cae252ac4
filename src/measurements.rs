//! Measured values at points in the room, e.g. positioning errors of a
//! mobile node.
//!
//! Measurements are read from plain text, one per line:
//!
//! ```text
//! # x, y, z, value[, label]
//! 1.0, 1.2, 2.0, 0.05
//! 2.0, 1.2, 2.0, 1.02, run3
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::alignment::Vec3;
use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0},
    combinator::{all_consuming, map, opt},
    number::complete::double,
    sequence::{delimited, preceded, terminated, tuple},
    Finish, IResult,
};
use std::{borrow::Cow, fmt, fs, path::Path, str::FromStr};

/// One measured value.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Where the value was measured
    pub position: Vec3,
    /// The measured value, e.g. an error in meters
    pub value: f64,
    /// Optional hover label
    pub label: Option<String>,
}

impl Measurement {
    /// A measurement without a label.
    pub fn new(position: Vec3, value: f64) -> Self {
        Measurement {
            position,
            value,
            label: None,
        }
    }
}

/// Errors raised while reading measurements.
#[derive(Debug)]
pub enum MeasurementError {
    /// Reading the file failed.
    IoError(std::io::Error),

    /// A line did not match `x,y,z,value[,label]`.
    Parse {
        /// 1-based line number
        line: usize,
        /// The offending line
        input: String,
    },
}

impl fmt::Display for MeasurementError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            MeasurementError::IoError(error) => Cow::from(format!("io error: {}", error)),
            MeasurementError::Parse { line, input } => {
                Cow::from(format!("line {}: cannot parse {:?}", line, input))
            }
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for MeasurementError {}

fn field(s: &str) -> IResult<&str, f64> {
    delimited(space0, double, space0)(s)
}

fn comma_field(s: &str) -> IResult<&str, f64> {
    preceded(char(','), field)(s)
}

fn label(s: &str) -> IResult<&str, String> {
    map(
        delimited(space0, take_while1(|c: char| c != ','), space0),
        |l: &str| l.trim_end().to_owned(),
    )(s)
}

fn parse_measurement(s: &str) -> IResult<&str, Measurement> {
    map(
        all_consuming(terminated(
            tuple((
                field,
                comma_field,
                comma_field,
                comma_field,
                opt(preceded(char(','), label)),
            )),
            space0,
        )),
        |(x, y, z, value, label)| Measurement {
            position: [x, y, z],
            value,
            label,
        },
    )(s)
}

impl FromStr for Measurement {
    type Err = nom::error::Error<String>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_measurement(s.trim_end()).finish() {
            Ok((_remaining, m)) => Ok(m),
            Err(nom::error::Error { input, code }) => Err(nom::error::Error {
                input: input.to_string(),
                code,
            }),
        }
    }
}

/// Parse every measurement in `text`.
pub fn parse_measurements(text: &str) -> Result<Vec<Measurement>, MeasurementError> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| {
            let l = l.trim();
            !l.is_empty() && !l.starts_with('#')
        })
        .map(|(i, l)| {
            l.parse::<Measurement>().map_err(|_| MeasurementError::Parse {
                line: i + 1,
                input: l.to_owned(),
            })
        })
        .collect()
}

/// Read measurements from a file.
pub fn read_measurements(path: impl AsRef<Path>) -> Result<Vec<Measurement>, MeasurementError> {
    let text = fs::read_to_string(path).map_err(MeasurementError::IoError)?;
    parse_measurements(&text)
}
