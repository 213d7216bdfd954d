//! Plotting collaborator contract and the render driver

use thiserror::Error;
use tracing::{debug, info};
use windnodes_core::{Bounds, DisplayGroup, Extraction, PointCloud};

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Rendering failed: {0}")]
    Render(String),
}

/// A plotting backend hands out one figure per display group
pub trait PlotBackend {
    type Figure: Figure;

    /// Acquire a fresh figure with its own 3D axes
    fn open_figure(&mut self, group: DisplayGroup, title: &str) -> Result<Self::Figure, PlotError>;
}

/// 3D axes that accumulate labelled scatter series
pub trait Figure {
    /// Fix the axis limits to `bounds`; backends may pick their own otherwise
    fn set_limits(&mut self, _bounds: Bounds) {}

    /// Add a labelled point cloud to the axes
    fn scatter(&mut self, label: &str, points: &PointCloud) -> Result<(), PlotError>;

    /// Draw the legend of every plotted label and release the figure
    fn finish(self) -> Result<(), PlotError>;
}

/// Render an extraction into one figure per display group
///
/// Both figures are always produced, in [`DisplayGroup::ALL`] order, even
/// when a group received no category.
pub fn render<B: PlotBackend>(backend: &mut B, extraction: &Extraction) -> Result<(), PlotError> {
    for group in DisplayGroup::ALL {
        let mut figure = backend.open_figure(group, group.title())?;
        if let Some(bounds) = extraction.group_bounds(group) {
            figure.set_limits(bounds);
        }
        let mut plotted = 0usize;
        for entry in extraction.by_group(group) {
            debug!(%group, category = %entry.category, points = entry.points.len(), "Plotting category");
            figure.scatter(&entry.category, &entry.points)?;
            plotted += 1;
        }
        figure.finish()?;
        info!(%group, categories = plotted, "Figure rendered");
    }
    Ok(())
}
