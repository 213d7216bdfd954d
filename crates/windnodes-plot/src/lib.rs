//! Windnodes Plot - 3D scatter rendering of categorized node clouds
//!
//! This crate is the rendering side of windnodes. An [`Extraction`] is
//! drawn as two independent 3D figures, one per display group, each with a
//! legend listing the categories plotted into it.
//!
//! Backends implement [`PlotBackend`]; the bundled [`SvgBackend`] writes
//! static SVG charts with `plotters`.
//!
//! [`Extraction`]: windnodes_core::Extraction

pub mod figure;
#[cfg(feature = "svg")]
pub mod svg;

pub use figure::{render, Figure, PlotBackend, PlotError};
#[cfg(feature = "svg")]
pub use svg::{SvgBackend, SvgFigure, SvgOptions};
