//! Live measurement sources for the dashboard, and the accumulator that
//! smooths what they report.

use crate::alignment::{distance, Vec3};
use crate::measurements::{parse_measurements, Measurement};
use log::{debug, warn};
use rand::prelude::*;
use std::{
    collections::{BTreeMap, VecDeque},
    fs,
    path::PathBuf,
    sync::{mpsc, Arc, Mutex},
    thread,
    time::Duration,
};

/// How many of the latest values per point are averaged.
const BUFFER_SIZE: usize = 5;

/// A clearable iterator that emits [Measurement]s as they become available.
/// Returning `None` means nothing new right now, not that the source is done.
pub trait MeasurementSource: Iterator<Item = Measurement> {
    /// Drop everything not yet consumed.
    fn clear(&mut self);

    /// Sources that emit whole snapshots bump this every time a new snapshot
    /// starts; everything emitted under an older generation is then stale.
    /// Sources that only ever add measurements keep the default.
    fn generation(&self) -> u64 {
        0
    }
}

enum Signal {
    NumPts(usize),
    Noise(f64),
    Stop,
}

/// A source that makes measurements up: a fixed set of nodes spread
/// through a box, each reported with some random position error.
pub struct DummyFeed {
    handle: Option<thread::JoinHandle<()>>,
    tx: mpsc::Sender<Signal>,
    msgs: Arc<Mutex<VecDeque<Measurement>>>,
    num_points: usize,
    noise: f64,
}

/// Configures a [DummyFeed] before its thread starts.
#[derive(Debug, Clone)]
pub struct DummyFeedBuilder {
    num_points: usize,
    noise: f64,
    bounds: (Vec3, Vec3),
    period: Duration,
}

impl Default for DummyFeedBuilder {
    fn default() -> Self {
        DummyFeedBuilder {
            num_points: 8,
            noise: 0.5,
            bounds: ([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            period: Duration::from_millis(500),
        }
    }
}

impl DummyFeedBuilder {
    /// Number of simulated nodes.
    pub fn num_points(self, num_points: usize) -> Self {
        DummyFeedBuilder { num_points, ..self }
    }

    /// Largest position error along each axis, in meters.
    pub fn noise(self, noise: f64) -> Self {
        DummyFeedBuilder { noise, ..self }
    }

    /// Box the nodes are spread through.
    pub fn bounds(self, min: Vec3, max: Vec3) -> Self {
        DummyFeedBuilder {
            bounds: (min, max),
            ..self
        }
    }

    /// Time between two rounds of measurements.
    pub fn period(self, period: Duration) -> Self {
        DummyFeedBuilder { period, ..self }
    }

    /// Start generating.
    pub fn build(self) -> DummyFeed {
        DummyFeed::start(self)
    }
}

impl DummyFeed {
    /// Configure a new feed.
    pub fn builder() -> DummyFeedBuilder {
        DummyFeedBuilder::default()
    }

    fn start(config: DummyFeedBuilder) -> Self {
        let (tx, rx) = mpsc::channel::<Signal>();
        let msgs = Arc::new(Mutex::new(VecDeque::new()));
        let th_msgs = Arc::clone(&msgs);

        let (num_points, noise) = (config.num_points, config.noise);

        let handle = thread::spawn(move || {
            let mut num_pts = config.num_points;
            let mut noise = config.noise;
            'feed: loop {
                loop {
                    match rx.try_recv() {
                        Ok(Signal::NumPts(n)) => num_pts = n,
                        Ok(Signal::Noise(n)) => noise = n,
                        Ok(Signal::Stop) | Err(mpsc::TryRecvError::Disconnected) => break 'feed,
                        Err(mpsc::TryRecvError::Empty) => break,
                    }
                }
                let truth = spread_points(num_pts, config.bounds);
                let mut round = noisy_measurements(&truth, noise);
                match th_msgs.lock() {
                    Ok(mut q) => q.append(&mut round),
                    Err(_) => break 'feed,
                }
                thread::sleep(config.period);
            }
            debug!("Dummy feed stopped");
        });

        DummyFeed {
            handle: Some(handle),
            tx,
            msgs,
            num_points,
            noise,
        }
    }

    /// Number of simulated nodes, as last requested.
    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// Largest position error, as last requested.
    pub fn noise(&self) -> f64 {
        self.noise
    }

    /// Change the number of simulated nodes from the next round on.
    pub fn set_num_points(&mut self, num_points: usize) {
        if self.tx.send(Signal::NumPts(num_points)).is_err() {
            warn!("Dummy feed is not running");
            return;
        }
        self.num_points = num_points;
    }

    /// Change the largest position error from the next round on.
    pub fn set_noise(&mut self, noise: f64) {
        if self.tx.send(Signal::Noise(noise)).is_err() {
            warn!("Dummy feed is not running");
            return;
        }
        self.noise = noise;
    }

    /// Stop the generator thread and wait for it.
    pub fn stop(&mut self) {
        let _ = self.tx.send(Signal::Stop);
        if let Some(thread) = self.handle.take() {
            if thread.join().is_err() {
                warn!("Dummy feed thread panicked");
            }
        }
    }
}

impl Drop for DummyFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Iterator for DummyFeed {
    type Item = Measurement;
    fn next(&mut self) -> Option<Self::Item> {
        self.msgs.lock().ok()?.pop_front()
    }
}

impl MeasurementSource for DummyFeed {
    fn clear(&mut self) {
        if let Ok(mut q) = self.msgs.lock() {
            q.clear();
        }
    }
}

/// `n` points on a helix through the box, so they are spread in all three
/// directions and stay put between rounds.
fn spread_points(n: usize, (min, max): (Vec3, Vec3)) -> Vec<Vec3> {
    let centre = [(min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0];
    let radius = [(max[0] - min[0]) / 3.0, (max[1] - min[1]) / 3.0];
    (0..n)
        .map(|i| {
            let t = (i as f64 + 0.5) / n as f64;
            let angle = t * 2.0 * std::f64::consts::PI;
            [
                centre[0] + radius[0] * angle.cos(),
                centre[1] + radius[1] * angle.sin(),
                min[2] + t * (max[2] - min[2]),
            ]
        })
        .collect()
}

/// Perturb each point and report the size of the perturbation as its value.
fn noisy_measurements(truth: &[Vec3], noise: f64) -> VecDeque<Measurement> {
    let mut rng = thread_rng();
    truth
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let jitter = |rng: &mut ThreadRng| {
                if noise > 0.0 {
                    rng.gen_range(-noise..noise)
                } else {
                    0.0
                }
            };
            let measured = [p[0] + jitter(&mut rng), p[1] + jitter(&mut rng), p[2] + jitter(&mut rng)];
            Measurement {
                position: measured,
                value: distance(measured, p),
                label: Some(format!("Node {}", i)),
            }
        })
        .collect()
}

/// A source that watches a measurement file, emitting its contents again
/// whenever they change. Every change starts a new [generation](MeasurementSource::generation):
/// the file is the whole truth, not an addition to what came before.
pub struct FileFeed {
    path: PathBuf,
    last: Option<String>,
    pending: VecDeque<Measurement>,
    generation: u64,
}

impl FileFeed {
    /// Watch `path`. Nothing is read until the feed is first polled.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileFeed {
            path: path.into(),
            last: None,
            pending: VecDeque::new(),
            generation: 0,
        }
    }

    fn poll(&mut self) {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Cannot read {}: {}", self.path.display(), e);
                return;
            }
        };
        if self.last.as_deref() == Some(text.as_str()) {
            return;
        }
        match parse_measurements(&text) {
            Ok(ms) => {
                debug!("{} changed, {} measurements", self.path.display(), ms.len());
                self.pending = ms.into();
                self.generation += 1;
            }
            Err(e) => warn!("Ignoring {}: {}", self.path.display(), e),
        }
        self.last = Some(text);
    }
}

impl Iterator for FileFeed {
    type Item = Measurement;
    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_empty() {
            self.poll();
        }
        self.pending.pop_front()
    }
}

impl MeasurementSource for FileFeed {
    /// Also forgets the last read, so the next poll emits the file again.
    fn clear(&mut self) {
        self.pending.clear();
        self.last = None;
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

/// Identifies "the same point" across rounds: its label if it has one,
/// else its position rounded to the millimetre.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum PointKey {
    Label(String),
    Position([i64; 3]),
}

impl From<&Measurement> for PointKey {
    fn from(m: &Measurement) -> Self {
        match &m.label {
            Some(label) => PointKey::Label(label.clone()),
            None => PointKey::Position(m.position.map(|c| (c * 1000.0).round() as i64)),
        }
    }
}

/// Consumes a [MeasurementSource] and keeps the latest few measurements of
/// every point. Query it with [FeedAccumulator::status].
pub struct FeedAccumulator<S>
where
    S: MeasurementSource,
{
    source: Arc<Mutex<S>>,
    history: BTreeMap<PointKey, VecDeque<Measurement>>,
    generation: u64,
}

impl<S> FeedAccumulator<S>
where
    S: MeasurementSource,
{
    /// Accumulate from a shared source.
    pub fn new(source: Arc<Mutex<S>>) -> Self {
        FeedAccumulator {
            source,
            history: BTreeMap::new(),
            generation: 0,
        }
    }

    /// One measurement per point: the mean position and value of its
    /// latest few reports, ordered by point.
    pub fn status(&mut self) -> Vec<Measurement> {
        if let Ok(mut source) = self.source.lock() {
            let fresh: Vec<Measurement> = source.by_ref().collect();
            if source.generation() != self.generation {
                debug!("New snapshot, dropping {} points", self.history.len());
                self.history.clear();
                self.generation = source.generation();
            }
            for m in fresh {
                let v = self.history.entry(PointKey::from(&m)).or_default();
                v.push_back(m);
                if v.len() > BUFFER_SIZE {
                    v.pop_front();
                }
            }
        }

        self.history
            .values()
            .filter_map(|v| {
                let last = v.back()?;
                let n = v.len() as f64;
                let mut position = [0.0; 3];
                let mut value = 0.0;
                for m in v {
                    for (acc, c) in position.iter_mut().zip(m.position) {
                        *acc += c / n;
                    }
                    value += m.value / n;
                }
                Some(Measurement {
                    position,
                    value,
                    label: last.label.clone(),
                })
            })
            .collect()
    }

    /// Forget everything seen so far.
    pub fn reset(&mut self) {
        self.history.clear();
        if let Ok(mut source) = self.source.lock() {
            source.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// A source fed by hand.
    struct VecSource(VecDeque<Measurement>);

    impl Iterator for VecSource {
        type Item = Measurement;
        fn next(&mut self) -> Option<Measurement> {
            self.0.pop_front()
        }
    }

    impl MeasurementSource for VecSource {
        fn clear(&mut self) {
            self.0.clear();
        }
    }

    fn labelled(label: &str, value: f64) -> Measurement {
        Measurement {
            position: [value, 0.0, 0.0],
            value,
            label: Some(label.to_owned()),
        }
    }

    #[test]
    fn averages_latest_reports() {
        let source = Arc::new(Mutex::new(VecSource(VecDeque::new())));
        let mut acc = FeedAccumulator::new(source.clone());
        assert!(acc.status().is_empty());

        source.lock().unwrap().0.extend((1..=7).map(|i| labelled("a", i as f64)));
        source.lock().unwrap().0.push_back(labelled("b", 1.0));

        let status = acc.status();
        assert_eq!(status.len(), 2);
        // only the last five of a's seven reports count: 3..=7
        assert!((status[0].value - 5.0).abs() < 1e-12);
        assert!((status[0].position[0] - 5.0).abs() < 1e-12);
        assert_eq!(status[1].label.as_deref(), Some("b"));
    }

    #[test]
    fn unlabelled_points_keyed_by_position() {
        let source = Arc::new(Mutex::new(VecSource(VecDeque::from(vec![
            Measurement::new([1.0, 1.0, 1.0], 0.2),
            Measurement::new([1.0, 1.0, 1.0], 0.4),
            Measurement::new([2.0, 1.0, 1.0], 1.0),
        ]))));
        let mut acc = FeedAccumulator::new(source);
        let status = acc.status();
        assert_eq!(status.len(), 2);
        assert!((status[0].value - 0.3).abs() < 1e-12);
    }

    #[test]
    fn reset_forgets() {
        let source = Arc::new(Mutex::new(VecSource(VecDeque::from(vec![labelled("a", 1.0)]))));
        let mut acc = FeedAccumulator::new(source.clone());
        assert_eq!(acc.status().len(), 1);
        source.lock().unwrap().0.push_back(labelled("b", 1.0));
        acc.reset();
        assert!(acc.status().is_empty());
    }

    #[test]
    fn spread_points_inside_bounds() {
        let (min, max) = ([0.0, 0.0, 0.0], [8.4, 4.0, 2.4]);
        let pts = spread_points(10, (min, max));
        assert_eq!(pts.len(), 10);
        for p in pts {
            for axis in 0..3 {
                assert!(p[axis] >= min[axis] && p[axis] <= max[axis]);
            }
        }
    }

    #[test]
    fn noise_bounds_error() {
        let truth = spread_points(20, ([0.0; 3], [1.0; 3]));
        let ms = noisy_measurements(&truth, 0.1);
        assert_eq!(ms.len(), 20);
        assert!(ms.iter().all(|m| m.value <= 0.1 * 3f64.sqrt()));

        let exact = noisy_measurements(&truth, 0.0);
        assert!(exact.iter().all(|m| m.value == 0.0));
    }

    #[test]
    fn dummy_feed_produces_measurements() {
        let mut feed = DummyFeed::builder()
            .num_points(3)
            .period(Duration::from_millis(5))
            .build();
        let mut seen = Vec::new();
        for _ in 0..200 {
            seen.extend(feed.by_ref());
            if seen.len() >= 3 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        feed.stop();
        assert!(seen.len() >= 3);
        assert_eq!(seen[0].label.as_deref(), Some("Node 0"));
    }

    #[test]
    fn file_feed_reemits_on_change() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1,1,1,0.5").unwrap();
        file.flush().unwrap();

        let mut feed = FileFeed::new(file.path());
        assert_eq!(feed.by_ref().count(), 1);
        // unchanged file, nothing new
        assert_eq!(feed.by_ref().count(), 0);

        writeln!(file, "2,1,1,0.7").unwrap();
        file.flush().unwrap();
        assert_eq!(feed.by_ref().count(), 2);
    }

    #[test]
    fn status_follows_rewritten_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let source = Arc::new(Mutex::new(FileFeed::new(file.path())));
        let mut acc = FeedAccumulator::new(source);

        fs::write(file.path(), "1,1,1,0.5\n").unwrap();
        assert_eq!(acc.status(), vec![Measurement::new([1.0, 1.0, 1.0], 0.5)]);

        // moved point: the old position is gone
        fs::write(file.path(), "2,2,2,0.9\n").unwrap();
        assert_eq!(acc.status(), vec![Measurement::new([2.0, 2.0, 2.0], 0.9)]);

        // changed value replaces the old one
        fs::write(file.path(), "2,2,2,0.1\n").unwrap();
        assert_eq!(acc.status(), vec![Measurement::new([2.0, 2.0, 2.0], 0.1)]);

        // unchanged file keeps what is shown
        assert_eq!(acc.status().len(), 1);

        fs::write(file.path(), "# nothing measured yet\n").unwrap();
        assert!(acc.status().is_empty());
    }

    #[test]
    fn reset_rereads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1,1,1,0.5").unwrap();
        file.flush().unwrap();

        let mut acc = FeedAccumulator::new(Arc::new(Mutex::new(FileFeed::new(file.path()))));
        assert_eq!(acc.status().len(), 1);
        acc.reset();
        assert_eq!(acc.status().len(), 1);
    }

    #[test]
    fn dummy_feed_follows_controls() {
        let mut feed = DummyFeed::builder()
            .num_points(4)
            .noise(0.5)
            .period(Duration::from_millis(2))
            .build();
        feed.set_num_points(1);
        feed.set_noise(0.0);
        assert_eq!(feed.num_points(), 1);
        assert_eq!(feed.noise(), 0.0);

        // let the thread pick the signals up, then drop older rounds
        thread::sleep(Duration::from_millis(50));
        feed.clear();
        thread::sleep(Duration::from_millis(50));
        let seen: Vec<Measurement> = feed.by_ref().collect();
        feed.stop();

        assert!(!seen.is_empty());
        assert!(seen.iter().all(|m| m.label.as_deref() == Some("Node 0")));
        assert!(seen.iter().all(|m| m.value == 0.0));
    }

    #[test]
    fn stopped_dummy_feed_ignores_controls() {
        let mut feed = DummyFeed::builder().num_points(2).build();
        feed.stop();
        feed.set_num_points(7);
        feed.set_noise(2.0);
        assert_eq!(feed.num_points(), 2);
        assert_eq!(feed.noise(), 0.5);
    }

    #[test]
    fn file_feed_survives_missing_file() {
        let mut feed = FileFeed::new("/definitely/not/here.csv");
        assert_eq!(feed.next(), None);
    }
}
