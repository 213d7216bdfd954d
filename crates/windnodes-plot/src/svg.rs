//! SVG figures drawn with `plotters` 3D charts

use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use windnodes_core::{Bounds, DisplayGroup, PointCloud};

use crate::figure::{Figure, PlotBackend, PlotError};

/// Output settings for [`SvgBackend`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvgOptions {
    /// Directory receiving one `<group>.svg` per display group
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Marker radius in pixels
    #[serde(default = "default_point_size")]
    pub point_size: u32,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            width: default_width(),
            height: default_height(),
            point_size: default_point_size(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./plots")
}

fn default_width() -> u32 {
    1024
}

fn default_height() -> u32 {
    768
}

fn default_point_size() -> u32 {
    3
}

/// Writes each figure to its own SVG file
#[derive(Debug, Clone)]
pub struct SvgBackend {
    options: SvgOptions,
}

impl SvgBackend {
    /// Create the backend, making sure the output directory exists
    pub fn new(options: SvgOptions) -> Result<Self, PlotError> {
        std::fs::create_dir_all(&options.output_dir)?;
        Ok(Self { options })
    }

    /// File a display group is rendered to
    pub fn path_for(&self, group: DisplayGroup) -> PathBuf {
        self.options.output_dir.join(format!("{}.svg", group.as_str()))
    }
}

impl PlotBackend for SvgBackend {
    type Figure = SvgFigure;

    fn open_figure(&mut self, group: DisplayGroup, title: &str) -> Result<SvgFigure, PlotError> {
        Ok(SvgFigure {
            path: self.path_for(group),
            title: title.to_string(),
            size: (self.options.width, self.options.height),
            point_size: self.options.point_size,
            limits: None,
            series: Vec::new(),
        })
    }
}

/// A pending SVG chart; drawing happens in [`Figure::finish`]
#[derive(Debug)]
pub struct SvgFigure {
    path: PathBuf,
    title: String,
    size: (u32, u32),
    point_size: u32,
    limits: Option<Bounds>,
    series: Vec<(String, PointCloud)>,
}

impl SvgFigure {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn draw(&self) -> Result<(), PlotError> {
        let root = SVGBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let [x, y, z] = axis_ranges(self.limits);
        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 28))
            .margin(20)
            .build_cartesian_3d(x, y, z)
            .map_err(render_error)?;
        chart.with_projection(|mut pb| {
            pb.yaw = 0.6;
            pb.pitch = 0.35;
            pb.scale = 0.8;
            pb.into_matrix()
        });
        chart.configure_axes().draw().map_err(render_error)?;

        let size = self.point_size;
        for (i, (label, points)) in self.series.iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            chart
                .draw_series(
                    points
                        .finite()
                        .map(|p| Circle::new((p[0], p[1], p[2]), size, color.filled())),
                )
                .map_err(render_error)?
                .label(label.as_str())
                .legend(move |(x, y)| Circle::new((x, y), size, color.filled()));
        }

        if !self.series.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .border_style(&BLACK)
                .background_style(&WHITE.mix(0.8))
                .draw()
                .map_err(render_error)?;
        }

        root.present().map_err(render_error)?;
        Ok(())
    }
}

impl Figure for SvgFigure {
    fn set_limits(&mut self, bounds: Bounds) {
        self.limits = Some(bounds);
    }

    fn scatter(&mut self, label: &str, points: &PointCloud) -> Result<(), PlotError> {
        self.series.push((label.to_string(), points.clone()));
        Ok(())
    }

    fn finish(self) -> Result<(), PlotError> {
        self.draw()?;
        info!(path = %self.path.display(), series = self.series.len(), "Wrote figure");
        Ok(())
    }
}

fn render_error<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Render(e.to_string())
}

/// Padded per-axis ranges; degenerate axes get a unit half-width
fn axis_ranges(bounds: Option<Bounds>) -> [std::ops::Range<f64>; 3] {
    let bounds = bounds.unwrap_or(Bounds {
        min: [-1.0; 3],
        max: [1.0; 3],
    });
    let extent = bounds.extent();
    let pad = extent.iter().copied().fold(0f64, f64::max) * 0.05;
    std::array::from_fn(|axis| {
        let half = if extent[axis] > 0.0 { pad } else { pad.max(1.0) };
        (bounds.min[axis] - half)..(bounds.max[axis] + half)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::render;
    use windnodes_core::{extract, CategorySet, Dataset, GroupRule, Node};

    fn assert_range(r: &std::ops::Range<f64>, start: f64, end: f64) {
        assert!((r.start - start).abs() < 1e-9, "{r:?} does not start at {start}");
        assert!((r.end - end).abs() < 1e-9, "{r:?} does not end at {end}");
    }

    #[test]
    fn test_axis_ranges_pad_and_default() {
        let ranges = axis_ranges(None);
        ranges.iter().for_each(|r| assert_range(r, -1.1, 1.1));

        let [x, y, z] = axis_ranges(Some(Bounds {
            min: [0.0, 0.0, 5.0],
            max: [10.0, 20.0, 5.0],
        }));
        assert_range(&x, -1.0, 11.0);
        assert_range(&y, -1.0, 21.0);
        // flat axis still gets a visible span
        assert_range(&z, 4.0, 6.0);
    }

    fn options(dir: &Path) -> SvgOptions {
        SvgOptions {
            output_dir: dir.join("plots"),
            width: 640,
            height: 480,
            ..SvgOptions::default()
        }
    }

    #[test]
    fn test_figure_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = SvgBackend::new(options(dir.path())).unwrap();
        assert!(dir.path().join("plots").is_dir());

        let figure = backend
            .open_figure(DisplayGroup::PrimaryMirror, "Primary mirror")
            .unwrap();
        assert_eq!(figure.path(), dir.path().join("plots/primary_mirror.svg"));
        assert_eq!(
            backend.path_for(DisplayGroup::Structure),
            dir.path().join("plots/structure.svg")
        );
    }

    #[test]
    fn test_render_writes_both_figures() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = SvgBackend::new(options(dir.path())).unwrap();

        let dataset = Dataset::new(vec![
            Node::new("Topend_1", Some([0.0, 0.0, 1.0])),
            Node::new("crane_2", Some([4.0, -2.0, 3.0])),
            Node::new("crane_3", Some([f64::NAN, 0.0, 0.0])),
            Node::new("arm_1", Some([1.0, 1.0, 1.0])),
        ]);
        let set = CategorySet::new(["Topend", "M1cov", "crane"]).unwrap();
        let extraction = extract(&dataset, &set, &GroupRule::default()).unwrap();
        render(&mut backend, &extraction).unwrap();

        let structure =
            std::fs::read_to_string(backend.path_for(DisplayGroup::Structure)).unwrap();
        assert!(structure.contains("<svg"));
        assert!(structure.contains("Structure"));
        assert!(structure.contains(">Topend<"));
        assert!(structure.contains(">crane<"));

        // no primary mirror category matched, the figure is still written
        let primary =
            std::fs::read_to_string(backend.path_for(DisplayGroup::PrimaryMirror)).unwrap();
        assert!(primary.contains("Primary mirror"));
        assert!(!primary.contains("Topend"));
    }
}
