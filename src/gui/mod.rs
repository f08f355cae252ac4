//! Pieces of the terminal dashboard that do not need a terminal: projecting
//! the room and its measurements onto a chart, and the error type of the
//! dashboard loop.

mod error;
mod view;

pub use error::TechtileGuiError;
pub use view::{band_color, color_bands, room_outline, sensor_points, Projection, ViewBounds};
