use clap::Parser;
use log::info;
use std::error::Error;

use techtile::{
    args::{
        FigureTask::{Errors, Scene},
        TechtileArgs,
    },
    facility::Facility,
    measurements::read_measurements,
    plotter::{plot_room_errors, SensorDisplay, TechtilePlotter},
};

// Example:
// cargo run --bin techtile --
//                          errors
//                          -m     points.csv
//                          -a     C07,G03,E04
//                          -o     3Dfig.html
//
// cargo run --bin techtile --
//                          --config demos/lab.ron
//                          scene
//                          -p     cardioid
//                          -o     scene.html

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = TechtileArgs::parse();

    let facility = match &args.config {
        Some(path) => {
            info!("Loading facility from {}", path.display());
            Facility::from_path(path)?
        }
        None => Facility::techtile(),
    };

    match args.command {
        Errors(cmd) => {
            let measurements = read_measurements(&cmd.measurements)?;
            let anchors = facility.anchor_positions(&cmd.anchors)?;
            let names: Vec<&str> = cmd.anchors.iter().map(String::as_str).collect();
            info!(
                "Plotting {} measurements against {} anchors",
                measurements.len(),
                anchors.len()
            );

            plot_room_errors(&facility.room, &measurements, &anchors, &names, &cmd.title, cmd.cmax)
                .write_html(&cmd.outfile, None)?;
            info!("Wrote {}", cmd.outfile.display());
        }

        Scene(cmd) => {
            let display = SensorDisplay {
                pattern: cmd.pattern,
                directions: cmd.directions,
            };

            let mut plotter = TechtilePlotter::new(&facility).title(&cmd.title).room();
            if !cmd.no_antennas {
                plotter = plotter.antennas(SensorDisplay {
                    pattern: None,
                    ..display
                });
            }
            plotter = plotter.microphones(display);
            if let Some(path) = &cmd.measurements {
                let measurements = read_measurements(path)?;
                info!("Overlaying {} measurements", measurements.len());
                plotter = plotter.measurements(&measurements, cmd.cmax);
            }

            plotter.finish().write_html(&cmd.outfile, None)?;
            info!("Wrote {}", cmd.outfile.display());
        }
    }

    Ok(())
}
