//! Windnodes Core - CFD node datasets and categorized point-cloud extraction
//!
//! This crate provides the data side of windnodes:
//! - Loading of pickled (or JSON) node datasets from CFD wind-load cases
//! - Structural-component categories and their display-group routing
//! - Extraction of one OSS point cloud per category

pub mod category;
pub mod dataset;
pub mod extract;
pub mod point_cloud;

pub use category::{
    Categorization, CategoryError, CategorySet, DisplayGroup, GroupRule, DEFAULT_CATEGORIES,
};
pub use dataset::{Dataset, DatasetError, DatasetFormat, DatasetFormatError, Location, Node};
pub use extract::{extract, extract_value, CategoryPointCloud, CategorySummary, Extraction};
pub use point_cloud::{Bounds, Point3, PointCloud};
