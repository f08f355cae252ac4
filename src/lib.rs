//! Techtile is a measurement room lined with tiles, each carrying antennas,
//! plus a set of reference microphones. Experiments in the room produce
//! values at points in space, positioning errors of a mobile node being the
//! usual example.
//!
//! This crate draws that: the room as a wireframe, the tiles and
//! microphones as small squares facing the way they are mounted, optional
//! directivity patterns around them, and measured values as colour-coded
//! markers. Figures are built as a [scene::Scene] and written out as
//! standalone HTML pages that render them with plotly.js.
//!
//! There are two binaries:
//!
//! - `techtile` draws static figures from a facility description and a
//!   measurement file.
//! - `monitor` is a terminal dashboard that redraws top and side views of the
//!   room as new measurements arrive, optionally keeping an HTML figure in
//!   sync for a browser.

#![warn(missing_docs)]
pub mod args;
pub mod alignment;
pub mod directivity;
pub mod facility;
pub mod feed;
pub mod gui;
pub mod measurements;
pub mod plotter;
pub mod room;
pub mod scene;
