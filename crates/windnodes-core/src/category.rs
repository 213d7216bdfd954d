//! Structural-component categories and display-group routing
//!
//! Categories are matched against node identifiers by substring. The names
//! follow the CFD monitor naming of the telescope model (`Topend`, `M1cov3`,
//! `LGSS2`, `crane+Y`, ...), so a category name is usually the common stem of
//! a family of monitors.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Stems of the CFD monitors of the 2025 wind-load cases, in legend order
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Topend",
    "M2seg",
    "M2baffle",
    "Tup",
    "Tbot",
    "arm",
    "M1Baffle",
    "M1cov",
    "LGSS",
    "Cring",
    "GIR",
    "plat",
    "M1c_",
    "M1p",
    "M1s_",
    "crane",
    "cabletruss",
];

/// Category name prefixes routed to the primary mirror figure
pub const DEFAULT_PRIMARY_PREFIXES: &[&str] = &["M1", "LGSS"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CategoryError {
    #[error("Category names must not be empty")]
    EmptyName,
    #[error("Duplicate category: {0}")]
    Duplicate(String),
}

/// The figure a category is plotted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayGroup {
    /// M1 segments, cells, covers and the laser guide star units
    PrimaryMirror,
    /// Everything else: top-end, trusses, C-rings, platforms, crane
    Structure,
}

impl DisplayGroup {
    pub const ALL: [DisplayGroup; 2] = [DisplayGroup::PrimaryMirror, DisplayGroup::Structure];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayGroup::PrimaryMirror => "primary_mirror",
            DisplayGroup::Structure => "structure",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DisplayGroup::PrimaryMirror => "Primary mirror",
            DisplayGroup::Structure => "Structure",
        }
    }
}

impl fmt::Display for DisplayGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefix rule assigning categories to display groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRule {
    pub primary_prefixes: Vec<String>,
}

impl Default for GroupRule {
    fn default() -> Self {
        Self {
            primary_prefixes: DEFAULT_PRIMARY_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl GroupRule {
    pub fn group_of(&self, category: &str) -> DisplayGroup {
        if self
            .primary_prefixes
            .iter()
            .any(|prefix| category.starts_with(prefix.as_str()))
        {
            DisplayGroup::PrimaryMirror
        } else {
            DisplayGroup::Structure
        }
    }
}

/// Ordered list of distinct, non-empty category names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CategorySet {
    names: Vec<String>,
}

impl CategorySet {
    pub fn new<I, S>(names: I) -> Result<Self, CategoryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for name in &names {
            if name.is_empty() {
                return Err(CategoryError::EmptyName);
            }
            if !seen.insert(name.as_str()) {
                return Err(CategoryError::Duplicate(name.clone()));
            }
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self {
            names: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for CategorySet {
    type Error = CategoryError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<CategorySet> for Vec<String> {
    fn from(set: CategorySet) -> Self {
        set.names
    }
}

/// Category list together with its group rule
///
/// This is the `[categories]` table of the configuration file:
///
/// ```toml
/// names = ["Topend", "M1cov", "LGSS"]
/// primary_prefixes = ["M1", "LGSS"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Categorization {
    #[serde(default)]
    pub names: CategorySet,
    #[serde(default = "default_primary_prefixes")]
    pub primary_prefixes: Vec<String>,
}

fn default_primary_prefixes() -> Vec<String> {
    GroupRule::default().primary_prefixes
}

impl Default for Categorization {
    fn default() -> Self {
        Self {
            names: CategorySet::default(),
            primary_prefixes: default_primary_prefixes(),
        }
    }
}

impl Categorization {
    pub fn rule(&self) -> GroupRule {
        GroupRule {
            primary_prefixes: self.primary_prefixes.clone(),
        }
    }
}
