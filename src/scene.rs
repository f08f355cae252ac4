//! A description of a 3D figure, built up from immutable trace records and
//! rendered on demand.
//!
//! The records follow the figure schema of [plotly.js](https://plotly.com/javascript/),
//! so a [Scene] serializes straight to the `{data, layout}` JSON that
//! `Plotly.newPlot` takes. [Scene::to_html] wraps that JSON in a standalone
//! page that pulls plotly.js from its CDN.
//!
//! ```
//! use techtile::scene::{Layout, Scene, Scatter3d};
//!
//! let scene = Scene::new(Layout::default())
//!     .with_trace(Scatter3d::markers(&[[1.0, 2.0, 0.5]]).name("probe"));
//! assert_eq!(scene.traces().len(), 1);
//! ```

// Field names follow the plotly.js attribute reference.
#![allow(missing_docs)]

use crate::alignment::Vec3;
use serde::Serialize;
use std::{borrow::Cow, fmt, fs, path::Path, time::Duration};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

/// Errors raised while rendering a [Scene].
#[derive(Debug)]
pub enum SceneError {
    /// Writing the rendered figure failed.
    IoError(std::io::Error),

    /// The figure could not be turned into JSON.
    JsonError(serde_json::Error),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            SceneError::IoError(error) => Cow::from(format!("io error: {}", error)),
            SceneError::JsonError(error) => Cow::from(format!("json error: {}", error)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for SceneError {}

/// How a [Scatter3d] draws its points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// One marker per point
    #[serde(rename = "markers")]
    Markers,
    /// A polyline through the points
    #[serde(rename = "lines")]
    Lines,
}

/// A colour: either one for the whole trace, or a value per point mapped
/// through a colour scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Color {
    /// A CSS colour string such as `black` or `#386055`
    Solid(String),
    /// Values mapped through the marker's colour scale
    Values(Vec<f64>),
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Color::Solid(value.to_owned())
    }
}

/// Hover text, one for the whole trace or one per point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Text {
    /// Shared by every point
    One(String),
    /// One entry per point
    Many(Vec<String>),
}

/// Colour bar shown next to the figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorBar {
    /// Width in pixels
    pub thickness: f64,
}

/// Marker styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showscale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorbar: Option<ColorBar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// Line styling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub color: String,
    pub width: f64,
}

/// Markers or lines through a sequence of 3D points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scatter3d {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoverinfo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    /// Fill the polygon projected along this axis (0 = x, 1 = y, 2 = z)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surfaceaxis: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surfacecolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectgaps: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legendgroup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

fn unzip3(points: &[Vec3]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut x = Vec::with_capacity(points.len());
    let mut y = Vec::with_capacity(points.len());
    let mut z = Vec::with_capacity(points.len());
    for p in points {
        x.push(p[0]);
        y.push(p[1]);
        z.push(p[2]);
    }
    (x, y, z)
}

impl Scatter3d {
    fn with_mode(points: &[Vec3], mode: Mode) -> Self {
        let (x, y, z) = unzip3(points);
        Scatter3d {
            x,
            y,
            z,
            mode,
            name: None,
            text: None,
            hoverinfo: None,
            marker: None,
            line: None,
            surfaceaxis: None,
            surfacecolor: None,
            connectgaps: None,
            showlegend: None,
            legendgroup: None,
            opacity: None,
        }
    }

    /// One marker per point.
    pub fn markers(points: &[Vec3]) -> Self {
        Self::with_mode(points, Mode::Markers)
    }

    /// A polyline through the points.
    pub fn lines(points: &[Vec3]) -> Self {
        Self::with_mode(points, Mode::Lines)
    }

    /// A plain, unlabelled, non-interactive line, as used for wireframes.
    pub fn plain_line(points: &[Vec3], color: &str, width: f64) -> Self {
        Self::lines(points)
            .line(color, width)
            .hoverinfo("none")
            .connectgaps(false)
            .showlegend(false)
    }

    /// A trace with no points that only exists to put `name` in the legend,
    /// toggling every trace of the same legend group.
    pub fn legend_entry(name: &str, mode: Mode) -> Self {
        Self::with_mode(&[], mode)
            .name(name)
            .hoverinfo("none")
            .showlegend(true)
            .legendgroup(name)
    }

    pub fn name(self, name: &str) -> Self {
        Scatter3d {
            name: Some(name.to_owned()),
            ..self
        }
    }

    pub fn text(self, text: Text) -> Self {
        Scatter3d {
            text: Some(text),
            ..self
        }
    }

    pub fn hoverinfo(self, hoverinfo: &str) -> Self {
        Scatter3d {
            hoverinfo: Some(hoverinfo.to_owned()),
            ..self
        }
    }

    pub fn marker(self, marker: Marker) -> Self {
        Scatter3d {
            marker: Some(marker),
            ..self
        }
    }

    pub fn line(self, color: &str, width: f64) -> Self {
        Scatter3d {
            line: Some(Line {
                color: color.to_owned(),
                width,
            }),
            ..self
        }
    }

    /// Fill the outline, projected along `axis`, with `color`.
    pub fn fill(self, axis: u8, color: &str) -> Self {
        Scatter3d {
            surfaceaxis: Some(axis),
            surfacecolor: Some(color.to_owned()),
            ..self
        }
    }

    pub fn connectgaps(self, connectgaps: bool) -> Self {
        Scatter3d {
            connectgaps: Some(connectgaps),
            ..self
        }
    }

    pub fn showlegend(self, showlegend: bool) -> Self {
        Scatter3d {
            showlegend: Some(showlegend),
            ..self
        }
    }

    pub fn legendgroup(self, group: &str) -> Self {
        Scatter3d {
            legendgroup: Some(group.to_owned()),
            ..self
        }
    }

    pub fn opacity(self, opacity: f64) -> Self {
        Scatter3d {
            opacity: Some(opacity),
            ..self
        }
    }
}

/// A surface spanned over a point cloud by an alpha hull.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mesh3d {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub alphahull: f64,
    pub opacity: f64,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legendgroup: Option<String>,
}

impl Mesh3d {
    /// Hull the given points.
    pub fn new(points: &[Vec3], alphahull: f64, opacity: f64, color: &str) -> Self {
        let (x, y, z) = unzip3(points);
        Mesh3d {
            x,
            y,
            z,
            alphahull,
            opacity,
            color: color.to_owned(),
            name: None,
            legendgroup: None,
        }
    }

    pub fn legendgroup(self, group: &str) -> Self {
        Mesh3d {
            name: Some(group.to_owned()),
            legendgroup: Some(group.to_owned()),
            ..self
        }
    }
}

/// One drawable record of a [Scene].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Trace {
    #[serde(rename = "scatter3d")]
    Scatter3d(Scatter3d),
    #[serde(rename = "mesh3d")]
    Mesh3d(Mesh3d),
}

impl From<Scatter3d> for Trace {
    fn from(value: Scatter3d) -> Self {
        Trace::Scatter3d(value)
    }
}

impl From<Mesh3d> for Trace {
    fn from(value: Mesh3d) -> Self {
        Trace::Mesh3d(value)
    }
}

/// An `{x, y, z}` triple as the layout schema spells it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Vec3> for Xyz {
    fn from([x, y, z]: Vec3) -> Self {
        Xyz { x, y, z }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
}

impl Axis {
    pub fn titled(text: &str) -> Self {
        Axis {
            title: Some(Title {
                text: text.to_owned(),
            }),
            range: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Camera {
    pub up: Xyz,
    pub center: Xyz,
    pub eye: Xyz,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            up: [0.0, 0.0, 1.0].into(),
            center: [0.0, 0.0, 0.0].into(),
            eye: [-1.0, -1.75, 1.1].into(),
        }
    }
}

/// The 3D viewport of a [Layout].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneLayout {
    pub aspectmode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspectratio: Option<Xyz>,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub zaxis: Axis,
    pub camera: Camera,
}

impl Default for SceneLayout {
    fn default() -> Self {
        SceneLayout {
            aspectmode: "auto".to_owned(),
            aspectratio: None,
            xaxis: Axis::titled("x [m]"),
            yaxis: Axis::titled("y [m]"),
            zaxis: Axis::titled("z [m]"),
            camera: Camera::default(),
        }
    }
}

impl SceneLayout {
    /// Lock the axes to the box `min..max`, scaled so a meter is the same
    /// length along every axis.
    pub fn fitted(min: Vec3, max: Vec3) -> Self {
        let span = |i: usize| max[i] - min[i];
        SceneLayout {
            aspectmode: "manual".to_owned(),
            aspectratio: Some([span(0), span(1), span(2)].into()),
            xaxis: Axis {
                range: Some([min[0], max[0]]),
                ..Axis::titled("x [m]")
            },
            yaxis: Axis {
                range: Some([min[1], max[1]]),
                ..Axis::titled("y [m]")
            },
            zaxis: Axis {
                range: Some([min[2], max[2]]),
                ..Axis::titled("z [m]")
            },
            camera: Camera::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub yanchor: String,
    pub y: f64,
    pub xanchor: String,
    pub x: f64,
}

/// Page-level figure settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    pub height: u32,
    pub paper_bgcolor: String,
    pub plot_bgcolor: String,
    pub legend: Legend,
    pub scene: SceneLayout,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            title: None,
            height: 800,
            paper_bgcolor: "rgba(0,0,0,0)".to_owned(),
            plot_bgcolor: "rgba(0,0,0,0)".to_owned(),
            legend: Legend {
                yanchor: "top".to_owned(),
                y: 0.9,
                xanchor: "left".to_owned(),
                x: 0.1,
            },
            scene: SceneLayout::default(),
        }
    }
}

impl Layout {
    pub fn title(self, text: &str) -> Self {
        Layout {
            title: Some(Title {
                text: text.to_owned(),
            }),
            ..self
        }
    }
}

#[derive(Serialize)]
struct Figure<'a> {
    data: &'a [Trace],
    layout: &'a Layout,
}

/// An ordered list of traces under a layout. Traces are never modified
/// once added; the scene is rendered fresh each time it is asked for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    layout: Layout,
    traces: Vec<Trace>,
}

impl Scene {
    /// An empty scene.
    pub fn new(layout: Layout) -> Self {
        Scene {
            layout,
            traces: Vec::new(),
        }
    }

    /// Append a trace.
    pub fn with_trace(mut self, trace: impl Into<Trace>) -> Self {
        self.traces.push(trace.into());
        self
    }

    /// Append several traces, keeping their order.
    pub fn extend<T: Into<Trace>>(mut self, traces: impl IntoIterator<Item = T>) -> Self {
        self.traces.extend(traces.into_iter().map(Into::into));
        self
    }

    /// Replace the layout.
    pub fn with_layout(self, layout: Layout) -> Self {
        Scene { layout, ..self }
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The `{data, layout}` figure as JSON.
    pub fn figure_json(&self) -> Result<String, SceneError> {
        serde_json::to_string(&Figure {
            data: &self.traces,
            layout: &self.layout,
        })
        .map_err(SceneError::JsonError)
    }

    /// A standalone HTML page showing the figure. With `refresh`, the page
    /// reloads itself at that interval, which is how the live dashboard
    /// pushes new data to a browser.
    pub fn to_html(&self, refresh: Option<Duration>) -> Result<String, SceneError> {
        // keep "</script>" inside string values from closing the tag early
        let json = self.figure_json()?.replace("</", "<\\/");
        let title = self
            .layout
            .title
            .as_ref()
            .map(|t| escape_html(&t.text))
            .unwrap_or_else(|| "Techtile".to_owned());
        let refresh = refresh
            .map(|d| format!("<meta http-equiv=\"refresh\" content=\"{}\" />\n", d.as_secs().max(1)))
            .unwrap_or_default();

        Ok(format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n\
             <meta charset=\"utf-8\" />\n\
             {refresh}\
             <title>{title}</title>\n\
             <script src=\"{PLOTLY_CDN}\" charset=\"utf-8\"></script>\n\
             </head>\n\
             <body>\n\
             <div id=\"techtile\"></div>\n\
             <script>\n\
             var figure = {json};\n\
             Plotly.newPlot(\"techtile\", figure.data, figure.layout);\n\
             </script>\n\
             </body>\n\
             </html>\n"
        ))
    }

    /// Render to HTML and write it to `path`. The page is written next to
    /// `path` first and moved into place, so a browser polling the file
    /// never sees half of it.
    pub fn write_html(&self, path: impl AsRef<Path>, refresh: Option<Duration>) -> Result<(), SceneError> {
        let path = path.as_ref();
        let html = self.to_html(refresh)?;
        let staging = path.with_extension("html.partial");
        fs::write(&staging, html).map_err(SceneError::IoError)?;
        fs::rename(&staging, path).map_err(SceneError::IoError)
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn figure(scene: &Scene) -> Value {
        serde_json::from_str(&scene.figure_json().unwrap()).unwrap()
    }

    #[test]
    fn traces_keep_order() {
        let scene = Scene::new(Layout::default())
            .with_trace(Scatter3d::markers(&[[0.0, 0.0, 0.0]]).name("first"))
            .extend(vec![
                Scatter3d::lines(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]).name("second"),
                Scatter3d::lines(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]).name("third"),
            ])
            .with_trace(Mesh3d::new(&[[0.0, 0.0, 0.0]], 0.4, 0.3, "red"));

        let names: Vec<_> = scene
            .traces()
            .iter()
            .map(|t| match t {
                Trace::Scatter3d(s) => s.name.clone().unwrap(),
                Trace::Mesh3d(_) => "mesh".to_owned(),
            })
            .collect();
        assert_eq!(names, vec!["first", "second", "third", "mesh"]);
    }

    #[test]
    fn scatter_schema() {
        let scene = Scene::new(Layout::default()).with_trace(
            Scatter3d::markers(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).marker(Marker {
                color: Some(Color::Values(vec![0.1, 0.2])),
                colorscale: Some("Viridis".to_owned()),
                ..Default::default()
            }),
        );
        let fig = figure(&scene);
        let trace = &fig["data"][0];
        assert_eq!(trace["type"], "scatter3d");
        assert_eq!(trace["mode"], "markers");
        assert_eq!(trace["x"], serde_json::json!([1.0, 4.0]));
        assert_eq!(trace["z"], serde_json::json!([3.0, 6.0]));
        assert_eq!(trace["marker"]["color"], serde_json::json!([0.1, 0.2]));
        assert!(trace.get("line").is_none());
        assert!(trace["marker"].get("size").is_none());
    }

    #[test]
    fn mesh_schema() {
        let scene = Scene::new(Layout::default())
            .with_trace(Mesh3d::new(&[[0.0, 0.0, 1.0]], 0.4, 0.3, "#66c2a5").legendgroup("Cardioid"));
        let fig = figure(&scene);
        let trace = &fig["data"][0];
        assert_eq!(trace["type"], "mesh3d");
        assert_eq!(trace["alphahull"], 0.4);
        assert_eq!(trace["legendgroup"], "Cardioid");
    }

    #[test]
    fn fitted_layout() {
        let layout = Layout {
            scene: SceneLayout::fitted([0.0, 0.0, 0.0], [8.4, 4.0, 2.4]),
            ..Default::default()
        };
        let fig = figure(&Scene::new(layout));
        assert_eq!(fig["layout"]["scene"]["aspectmode"], "manual");
        assert_eq!(fig["layout"]["scene"]["aspectratio"]["x"], 8.4);
        assert_eq!(fig["layout"]["scene"]["xaxis"]["range"], serde_json::json!([0.0, 8.4]));
        assert_eq!(fig["layout"]["scene"]["camera"]["eye"]["y"], -1.75);
        assert_eq!(fig["data"], serde_json::json!([]));
    }

    #[test]
    fn html_embeds_figure() {
        let scene = Scene::new(Layout::default().title("Errors <b>"))
            .with_trace(Scatter3d::markers(&[[0.0, 0.0, 0.0]]).name("</script>"));
        let html = scene.to_html(None).unwrap();
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("<title>Errors &lt;b&gt;</title>"));
        assert!(html.contains("Plotly.newPlot"));
        assert!(!html.contains("\"</script>\""));
        assert!(!html.contains("http-equiv"));

        let live = scene.to_html(Some(Duration::from_secs(2))).unwrap();
        assert!(live.contains("content=\"2\""));
    }

    #[test]
    fn write_html_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("3Dfig.html");
        Scene::new(Layout::default())
            .write_html(&path, None)
            .unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
        assert!(!path.with_extension("html.partial").exists());
    }
}
