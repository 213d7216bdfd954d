//! Categorized node extraction
//!
//! Splits the located nodes of a [`Dataset`] into per-category point clouds
//! and routes every category to a [`DisplayGroup`]. Matching is by substring
//! and non-exclusive: a node whose identifier contains two category names
//! appears in both clouds.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::category::{CategorySet, DisplayGroup, GroupRule};
use crate::dataset::{Dataset, DatasetFormatError};
use crate::point_cloud::{Bounds, Point3, PointCloud};

/// Point cloud of one category and the figure it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPointCloud {
    pub category: String,
    pub group: DisplayGroup,
    pub points: PointCloud,
}

/// Per-category statistics for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub group: DisplayGroup,
    pub count: usize,
    pub centroid: Point3,
    /// `None` when no point of the category is finite
    pub bounds: Option<Bounds>,
}

/// Ordered extraction output, one entry per category with at least one match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extraction {
    entries: Vec<CategoryPointCloud>,
}

impl Extraction {
    pub fn entries(&self) -> &[CategoryPointCloud] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<CategoryPointCloud> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryPointCloud> {
        self.entries.iter()
    }

    /// Entries of one display group, in category order
    pub fn by_group(&self, group: DisplayGroup) -> impl Iterator<Item = &CategoryPointCloud> {
        self.entries.iter().filter(move |e| e.group == group)
    }

    /// Bounds of every point plotted into `group`
    pub fn group_bounds(&self, group: DisplayGroup) -> Option<Bounds> {
        self.by_group(group)
            .filter_map(|e| e.points.bounds())
            .reduce(|a, b| a.union(&b))
    }

    pub fn summaries(&self) -> Vec<CategorySummary> {
        self.entries
            .iter()
            .filter_map(|e| {
                Some(CategorySummary {
                    category: e.category.clone(),
                    group: e.group,
                    count: e.points.len(),
                    centroid: e.points.centroid()?,
                    bounds: e.points.bounds(),
                })
            })
            .collect()
    }
}

impl IntoIterator for Extraction {
    type Item = CategoryPointCloud;
    type IntoIter = std::vec::IntoIter<CategoryPointCloud>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Extract the per-category point clouds of a validated dataset
///
/// Categories are visited in order; a category with no located node
/// containing its name produces no entry. Only the locations of selected
/// nodes are checked, so a malformed `OSS` on a node no category matches
/// is ignored.
pub fn extract(
    dataset: &Dataset,
    categories: &CategorySet,
    rule: &GroupRule,
) -> Result<Extraction, DatasetFormatError> {
    let mut entries = Vec::new();
    for category in categories.iter() {
        let points = dataset
            .located_nodes()
            .filter(|(id, _)| id.contains(category))
            .map(|(id, location)| location.point(id))
            .collect::<Result<PointCloud, _>>()?;
        if points.is_empty() {
            debug!(category, "No located node matches category");
            continue;
        }
        let group = rule.group_of(category);
        debug!(category, %group, points = points.len(), "Extracted category");
        entries.push(CategoryPointCloud {
            category: category.to_string(),
            group,
            points,
        });
    }
    info!(
        categories = categories.len(),
        extracted = entries.len(),
        points = entries.iter().map(|e| e.points.len()).sum::<usize>(),
        "Node extraction complete"
    );
    Ok(Extraction { entries })
}

/// Validate an untyped dataset and extract it
///
/// Fails when the dataset structure is malformed or a selected node has a
/// malformed location; nothing is extracted in that case.
pub fn extract_value(
    value: &Value,
    categories: &CategorySet,
    rule: &GroupRule,
) -> Result<Extraction, DatasetFormatError> {
    let dataset = Dataset::from_value(value.clone())?;
    extract(&dataset, categories, rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Node;
    use serde_json::json;

    fn categories(names: &[&str]) -> CategorySet {
        CategorySet::new(names.iter().copied()).unwrap()
    }

    fn sample_dataset() -> Dataset {
        Dataset::new(vec![
            Node::new("Topend_1", Some([0.0, 0.0, 1.0])),
            Node::new("M1cov1", Some([1.0, 0.0, 0.0])),
            Node::new("M1covin1", Some([2.0, 0.0, 0.0])),
            Node::new("LGSS2", Some([0.0, 3.0, 0.0])),
            Node::new("M1Baffle_x", None),
            Node::new("crane+Y", Some([4.0, 4.0, 4.0])),
            Node::new("arm2", Some([-1.0, 0.0, 2.0])),
        ])
    }

    #[test]
    fn test_two_structure_categories() {
        let dataset = json!({
            "nodes": [["Topend_1", {"OSS": [0, 0, 1]}], ["crane_2", {"OSS": [1, 1, 1]}]]
        });
        let out = extract_value(&dataset, &categories(&["Topend", "crane"]), &GroupRule::default())
            .unwrap();
        assert_eq!(
            out.into_entries(),
            vec![
                CategoryPointCloud {
                    category: "Topend".to_string(),
                    group: DisplayGroup::Structure,
                    points: vec![[0.0, 0.0, 1.0]].into(),
                },
                CategoryPointCloud {
                    category: "crane".to_string(),
                    group: DisplayGroup::Structure,
                    points: vec![[1.0, 1.0, 1.0]].into(),
                },
            ]
        );
    }

    #[test]
    fn test_node_without_oss_is_excluded() {
        let dataset = json!({"nodes": [["M1Baffle_x", {}]]});
        let out =
            extract_value(&dataset, &categories(&["M1Baffle"]), &GroupRule::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_unmatched_category_has_no_entry() {
        let dataset = json!({"nodes": [["arm_9", {"OSS": [2, 2, 2]}]]});
        let out = extract_value(&dataset, &categories(&["Topend"]), &GroupRule::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_nodes_is_a_format_error() {
        let result = extract_value(&json!({}), &categories(&["Topend"]), &GroupRule::default());
        assert_eq!(result, Err(DatasetFormatError::MissingNodes));

        let result = extract_value(
            &json!({"nodes": "Topend_1"}),
            &categories(&["Topend"]),
            &GroupRule::default(),
        );
        assert_eq!(result, Err(DatasetFormatError::NodesNotSequence));
    }

    #[test]
    fn test_bad_location_only_fails_when_selected() {
        let dataset = json!({
            "nodes": [["Topend_1", {"OSS": [0, 0, 0]}], ["unrelated_9", {"OSS": [0, 1]}]]
        });
        let out = extract_value(&dataset, &categories(&["Topend"]), &GroupRule::default()).unwrap();
        assert_eq!(out.len(), 1);

        let result = extract_value(&dataset, &categories(&["unrelated"]), &GroupRule::default());
        assert_eq!(
            result,
            Err(DatasetFormatError::InvalidCoordinate { id: "unrelated_9".to_string() })
        );
    }

    #[test]
    fn test_non_finite_coordinates_are_stacked() {
        let dataset = Dataset::new(vec![
            Node::new("Topend_1", Some([0.0, 0.0, 0.0])),
            Node::new("unrelated_9", Some([f64::NAN, 0.0, 1.0])),
            Node::new("crane_2", Some([f64::INFINITY, 1.0, 1.0])),
        ]);
        let out = extract(&dataset, &categories(&["Topend", "crane"]), &GroupRule::default())
            .unwrap();
        assert_eq!(out.entries()[0].points.points(), &[[0.0, 0.0, 0.0]]);
        assert_eq!(out.entries()[1].points.points(), &[[f64::INFINITY, 1.0, 1.0]]);

        let out = extract(&dataset, &categories(&["unrelated"]), &GroupRule::default()).unwrap();
        let p = out.entries()[0].points.points()[0];
        assert!(p[0].is_nan());
        assert_eq!(&p[1..], &[0.0, 1.0]);
    }

    #[test]
    fn test_overlapping_categories_share_nodes() {
        let dataset = sample_dataset();
        let out = extract(&dataset, &categories(&["M1cov", "M1covin"]), &GroupRule::default())
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.entries()[0].points.points(), &[[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        assert_eq!(out.entries()[1].points.points(), &[[2.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_output_follows_category_order() {
        let dataset = sample_dataset();
        let out = extract(
            &dataset,
            &categories(&["crane", "Topend", "GIR", "LGSS", "arm"]),
            &GroupRule::default(),
        )
        .unwrap();
        let order: Vec<_> = out.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(order, vec!["crane", "Topend", "LGSS", "arm"]);
    }

    #[test]
    fn test_extraction_properties() {
        let dataset = sample_dataset();
        let set = CategorySet::default();
        let rule = GroupRule::default();
        let out = extract(&dataset, &set, &rule).unwrap();

        for entry in out.iter() {
            // every point comes from a located node containing the category
            for p in entry.points.iter() {
                assert!(dataset
                    .located_nodes()
                    .any(|(id, q)| id.contains(entry.category.as_str()) && q.point(id) == Ok(*p)));
            }
            // group law
            let primary = entry.category.starts_with("M1") || entry.category.starts_with("LGSS");
            assert_eq!(entry.group == DisplayGroup::PrimaryMirror, primary);
        }

        // categories absent from every identifier never show up
        for category in set.iter() {
            if !dataset.nodes.iter().any(|n| n.id.contains(category)) {
                assert!(out.iter().all(|e| e.category != category));
            }
        }

        // no hidden state between calls
        assert_eq!(extract(&dataset, &set, &rule), Ok(out));
    }

    #[test]
    fn test_group_views_and_summaries() {
        let dataset = sample_dataset();
        let out = extract(&dataset, &CategorySet::default(), &GroupRule::default()).unwrap();

        let primary: Vec<_> = out
            .by_group(DisplayGroup::PrimaryMirror)
            .map(|e| e.category.as_str())
            .collect();
        assert_eq!(primary, vec!["M1cov", "LGSS"]);
        let structure: Vec<_> = out
            .by_group(DisplayGroup::Structure)
            .map(|e| e.category.as_str())
            .collect();
        assert_eq!(structure, vec!["Topend", "arm", "crane"]);

        let bounds = out.group_bounds(DisplayGroup::PrimaryMirror).unwrap();
        assert_eq!(bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(bounds.max, [2.0, 3.0, 0.0]);

        let summaries = out.summaries();
        assert_eq!(summaries.len(), out.len());
        let cov = summaries.iter().find(|s| s.category == "M1cov").unwrap();
        assert_eq!(cov.count, 2);
        assert_eq!(cov.centroid, [1.5, 0.0, 0.0]);
    }
}
