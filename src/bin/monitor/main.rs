mod gui;

use clap::Parser;
use log::info;
use std::{
    error::Error,
    sync::{Arc, Mutex},
    time::Duration,
};

use gui::{engage_gui, Command, Dashboard, LiveData};
use techtile::{
    args::MonitorArgs,
    facility::Facility,
    feed::{DummyFeed, FeedAccumulator, FileFeed, MeasurementSource},
    measurements::Measurement,
};

// Example:
// cargo run --bin monitor --
//                         --anchors C07,G03,E04
//                         --tick    500
//                         --html    live.html

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = MonitorArgs::parse();

    let facility = match &args.config {
        Some(path) => Facility::from_path(path)?,
        None => Facility::techtile(),
    };
    let anchors = facility.anchor_positions(&args.anchors)?;
    let tick_rate = Duration::from_millis(args.tick_ms);

    let dashboard = Dashboard {
        facility,
        anchor_names: args.anchors.clone(),
        anchors,
        cmax: args.cmax,
        html: args.html.clone(),
    };

    match &args.measurements {
        Some(path) => {
            info!("Watching {}", path.display());
            run(FileFeed::new(path), steer_file, dashboard, tick_rate)
        }
        None => {
            info!("No measurement file given, showing made-up data");
            let (min, max) = dashboard.facility.room.extent();
            let feed = DummyFeed::builder()
                .bounds(min, max)
                .period(tick_rate)
                .build();
            run(feed, steer_dummy, dashboard, tick_rate)
        }
    }
}

/// A shared source, the accumulator reading it, and how the source reacts
/// to dashboard commands.
struct Live<S: MeasurementSource> {
    source: Arc<Mutex<S>>,
    accumulator: FeedAccumulator<S>,
    steer: fn(&mut S, Command) -> bool,
}

impl<S: MeasurementSource> LiveData for Live<S> {
    fn status(&mut self) -> Vec<Measurement> {
        self.accumulator.status()
    }

    fn command(&mut self, command: Command) {
        let changed = match command {
            Command::Reset => true,
            other => match self.source.lock() {
                Ok(mut source) => (self.steer)(&mut *source, other),
                Err(_) => false,
            },
        };
        // points from before the change would linger otherwise
        if changed {
            self.accumulator.reset();
        }
    }
}

fn steer_file(_: &mut FileFeed, command: Command) -> bool {
    info!("{:?} only applies to made-up data", command);
    false
}

fn steer_dummy(feed: &mut DummyFeed, command: Command) -> bool {
    match command {
        Command::MorePoints => feed.set_num_points(feed.num_points() + 1),
        Command::FewerPoints => feed.set_num_points(feed.num_points().saturating_sub(1).max(1)),
        Command::MoreNoise => feed.set_noise((feed.noise() * 1.5).max(0.05)),
        Command::LessNoise => feed.set_noise(feed.noise() / 1.5),
        Command::Reset => {}
    }
    info!("Dummy feed: {} nodes, noise {:.2} m", feed.num_points(), feed.noise());
    true
}

fn run<S>(
    source: S,
    steer: fn(&mut S, Command) -> bool,
    dashboard: Dashboard,
    tick_rate: Duration,
) -> Result<(), Box<dyn Error>>
where
    S: MeasurementSource + 'static,
{
    let source = Arc::new(Mutex::new(source));
    let live = Live {
        accumulator: FeedAccumulator::new(source.clone()),
        source,
        steer,
    };

    // the source is dropped with `live`, stopping any feed thread
    engage_gui(Box::new(live), dashboard, tick_rate)?;
    Ok(())
}
