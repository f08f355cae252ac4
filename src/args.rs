//! Commandline argument parsers using clap for the techtile and monitor binaries

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::directivity::CardioidPattern;

/// Arguments of the `techtile` figure generator.
#[derive(Debug, Parser, Clone)]
#[command(version, about)]
pub struct TechtileArgs {
    #[command(subcommand)]
    /// Which figure to draw
    pub command: FigureTask,

    /// Facility description in RON. The built-in Techtile room is used when
    /// this is not given
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
}

/// The figures `techtile` can draw.
#[derive(Debug, Subcommand, Clone)]
pub enum FigureTask {
    /// Draw measured errors inside the room wireframe, with anchors
    Errors(ErrorsCommand),

    /// Draw the whole facility: room, antenna tiles and microphones
    Scene(SceneCommand),
}

/// Options of `techtile errors`.
#[derive(Debug, Args, Clone)]
pub struct ErrorsCommand {
    /// File of `x,y,z,value[,label]` lines
    #[arg(short = 'm', long = "measurements")]
    pub measurements: PathBuf,

    /// Names of the microphones or channels to mark as anchors
    #[arg(short = 'a', long = "anchors", value_delimiter = ',', num_args = 1..)]
    pub anchors: Vec<String>,

    /// Filename for the HTML figure to be written to
    #[arg(short = 'o', long = "out")]
    pub outfile: PathBuf,

    /// Figure title
    #[arg(short = 't', long = "title", default_value = "Title")]
    pub title: String,

    /// Top of the colour scale
    #[arg(long = "cmax", default_value_t = 1.5)]
    pub cmax: f64,
}

/// Options of `techtile scene`.
#[derive(Debug, Args, Clone)]
pub struct SceneCommand {
    /// Filename for the HTML figure to be written to
    #[arg(short = 'o', long = "out")]
    pub outfile: PathBuf,

    /// Optional file of `x,y,z,value[,label]` lines to overlay
    #[arg(short = 'm', long = "measurements")]
    pub measurements: Option<PathBuf>,

    /// Draw this directivity pattern around every microphone
    #[arg(short = 'p', long = "pattern", value_enum)]
    pub pattern: Option<CardioidPattern>,

    /// Draw the facing of every sensor
    #[arg(short = 'd', long = "directions")]
    pub directions: bool,

    /// Leave the antenna tiles out
    #[arg(long = "no-antennas")]
    pub no_antennas: bool,

    /// Figure title
    #[arg(short = 't', long = "title", default_value = "Techtile")]
    pub title: String,

    /// Top of the colour scale
    #[arg(long = "cmax", default_value_t = 1.5)]
    pub cmax: f64,
}

/// Arguments of the `monitor` dashboard.
#[derive(Debug, Parser, Clone)]
#[command(version, about)]
pub struct MonitorArgs {
    /// Facility description in RON. The built-in Techtile room is used when
    /// this is not given
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Watch this file of `x,y,z,value[,label]` lines. Made-up data is shown
    /// when this is not given
    #[arg(short = 'm', long = "measurements")]
    pub measurements: Option<PathBuf>,

    /// Names of the microphones or channels to mark as anchors
    #[arg(short = 'a', long = "anchors", value_delimiter = ',')]
    pub anchors: Vec<String>,

    /// Refresh interval, in milliseconds
    #[arg(long = "tick", default_value_t = 250)]
    pub tick_ms: u64,

    /// Top of the colour scale
    #[arg(long = "cmax", default_value_t = 1.5)]
    pub cmax: f64,

    /// Also keep this HTML figure up to date, reloading itself in the browser
    #[arg(long = "html")]
    pub html: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_command() {
        let args = TechtileArgs::parse_from([
            "techtile", "errors", "-m", "points.csv", "-a", "C07,G03", "E04", "-o", "3Dfig.html",
        ]);
        match args.command {
            FigureTask::Errors(cmd) => {
                assert_eq!(cmd.anchors, vec!["C07", "G03", "E04"]);
                assert_eq!(cmd.cmax, 1.5);
                assert_eq!(cmd.outfile, PathBuf::from("3Dfig.html"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(args.config.is_none());
    }

    #[test]
    fn parse_scene_command() {
        let args = TechtileArgs::parse_from([
            "techtile", "scene", "--config", "room.ron", "-o", "out.html", "-p", "hyper-cardioid", "-d",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("room.ron")));
        match args.command {
            FigureTask::Scene(cmd) => {
                assert_eq!(cmd.pattern, Some(CardioidPattern::HyperCardioid));
                assert!(cmd.directions);
                assert!(!cmd.no_antennas);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parse_monitor() {
        let args = MonitorArgs::parse_from(["monitor", "--tick", "100", "--anchors", "C07,G03"]);
        assert_eq!(args.tick_ms, 100);
        assert_eq!(args.anchors.len(), 2);
        assert!(args.measurements.is_none());
    }
}
