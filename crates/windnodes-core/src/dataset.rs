//! CFD node dataset loading
//!
//! A dataset is a mapping whose `"nodes"` field is an ordered sequence of
//! `(identifier, attributes)` pairs. The attributes of a node may carry an
//! `"OSS"` entry, the node location as a 3-vector in the OSS frame.
//!
//! Datasets are usually Python pickles written by the CFD post-processing
//! scripts; JSON files with the same shape are also accepted. Node locations
//! are read as raw floats, everything else is normalized into
//! [`serde_json::Value`]s.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_pickle::{DeOptions, HashableValue, Value as PickleValue};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::point_cloud::Point3;

/// Top-level key holding the node sequence
pub const NODES_KEY: &str = "nodes";
/// Node attribute holding the OSS coordinates
pub const OSS_KEY: &str = "OSS";

/// Structural problems with a decoded dataset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetFormatError {
    #[error("Dataset is not a mapping")]
    NotAMapping,
    #[error("Dataset has no \"nodes\" field")]
    MissingNodes,
    #[error("\"nodes\" is not a sequence of (id, attributes) pairs")]
    NodesNotSequence,
    #[error("Node entry {index} is not an (id, attributes) pair")]
    InvalidEntry { index: usize },
    #[error("Node entry {index} has a non-string identifier")]
    InvalidIdentifier { index: usize },
    #[error("Node {id}: OSS is not a 3-element numeric coordinate")]
    InvalidCoordinate { id: String },
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to decode pickle: {0}")]
    PickleError(#[from] serde_pickle::Error),
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Malformed dataset: {0}")]
    Format(#[from] DatasetFormatError),
}

/// On-disk encoding of a dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    #[default]
    Pickle,
    Json,
}

impl DatasetFormat {
    /// Guess the encoding from the file extension (`.json`, anything else is pickle)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DatasetFormat::Json,
            _ => DatasetFormat::Pickle,
        }
    }
}

/// The `OSS` attribute of a node as found in the dataset
///
/// Anything other than three numbers is kept as `Malformed` and only
/// reported once an extraction selects the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Point(Point3),
    Malformed(Value),
}

impl Location {
    fn from_json(value: Value) -> Self {
        match json_point(&value) {
            Some(p) => Location::Point(p),
            None => Location::Malformed(value),
        }
    }

    fn from_pickle(value: PickleValue) -> Self {
        match pickle_point(&value) {
            Some(p) => Location::Point(p),
            None => Location::Malformed(pickle_to_json(value)),
        }
    }

    /// Coordinate of node `id`, or `InvalidCoordinate`
    pub fn point(&self, id: &str) -> Result<Point3, DatasetFormatError> {
        match self {
            Location::Point(p) => Ok(*p),
            Location::Malformed(_) => Err(DatasetFormatError::InvalidCoordinate {
                id: id.to_string(),
            }),
        }
    }
}

/// A mesh node with its optional OSS location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub oss: Option<Location>,
    /// Remaining attributes, kept as-is
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, oss: Option<Point3>) -> Self {
        Self {
            id: id.into(),
            oss: oss.map(Location::Point),
            attributes: Map::new(),
        }
    }

    fn from_entry(index: usize, entry: Value) -> Result<Self, DatasetFormatError> {
        let Value::Array(pair) = entry else {
            return Err(DatasetFormatError::InvalidEntry { index });
        };
        let [id, attributes]: [Value; 2] = pair
            .try_into()
            .map_err(|_| DatasetFormatError::InvalidEntry { index })?;
        let Value::String(id) = id else {
            return Err(DatasetFormatError::InvalidIdentifier { index });
        };
        let Value::Object(mut attributes) = attributes else {
            return Err(DatasetFormatError::InvalidEntry { index });
        };

        // Python `None` is treated as a missing location
        let oss = match attributes.remove(OSS_KEY) {
            None | Some(Value::Null) => None,
            Some(value) => Some(Location::from_json(value)),
        };

        Ok(Self { id, oss, attributes })
    }

    fn from_pickle_entry(index: usize, entry: PickleValue) -> Result<Self, DatasetFormatError> {
        let (PickleValue::List(pair) | PickleValue::Tuple(pair)) = entry else {
            return Err(DatasetFormatError::InvalidEntry { index });
        };
        let [id, attributes]: [PickleValue; 2] = pair
            .try_into()
            .map_err(|_| DatasetFormatError::InvalidEntry { index })?;
        let id = match id {
            PickleValue::String(s) => s,
            PickleValue::Bytes(b) => String::from_utf8_lossy(&b).into_owned(),
            _ => return Err(DatasetFormatError::InvalidIdentifier { index }),
        };
        let PickleValue::Dict(attributes) = attributes else {
            return Err(DatasetFormatError::InvalidEntry { index });
        };

        // The location is read from the pickle floats directly so that NaN
        // and infinities survive; the other attributes go through JSON
        let mut oss = None;
        let mut rest = Map::new();
        for (key, value) in attributes {
            let key = key_to_string(key);
            if key == OSS_KEY {
                oss = match value {
                    PickleValue::None => None,
                    value => Some(Location::from_pickle(value)),
                };
            } else {
                rest.insert(key, pickle_to_json(value));
            }
        }

        Ok(Self {
            id,
            oss,
            attributes: rest,
        })
    }
}

fn json_point(value: &Value) -> Option<Point3> {
    match value.as_array()?.as_slice() {
        [x, y, z] => Some([x.as_f64()?, y.as_f64()?, z.as_f64()?]),
        _ => None,
    }
}

fn pickle_point(value: &PickleValue) -> Option<Point3> {
    let (PickleValue::List(items) | PickleValue::Tuple(items)) = value else {
        return None;
    };
    match items.as_slice() {
        [x, y, z] => Some([pickle_number(x)?, pickle_number(y)?, pickle_number(z)?]),
        _ => None,
    }
}

fn pickle_number(value: &PickleValue) -> Option<f64> {
    match value {
        PickleValue::F64(f) => Some(*f),
        PickleValue::I64(i) => Some(*i as f64),
        PickleValue::Int(i) => i.to_string().parse().ok(),
        _ => None,
    }
}

/// A validated node dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub nodes: Vec<Node>,
    /// Top-level fields other than `"nodes"`, never interpreted
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl Dataset {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            extra: Map::new(),
        }
    }

    /// Validate an untyped dataset value
    pub fn from_value(value: Value) -> Result<Self, DatasetFormatError> {
        let Value::Object(mut root) = value else {
            return Err(DatasetFormatError::NotAMapping);
        };
        let nodes = root.remove(NODES_KEY).ok_or(DatasetFormatError::MissingNodes)?;
        let Value::Array(entries) = nodes else {
            return Err(DatasetFormatError::NodesNotSequence);
        };
        let nodes = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| Node::from_entry(index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { nodes, extra: root })
    }

    /// Validate a decoded pickle value
    pub fn from_pickle_value(value: PickleValue) -> Result<Self, DatasetFormatError> {
        let PickleValue::Dict(root) = value else {
            return Err(DatasetFormatError::NotAMapping);
        };
        let mut root: BTreeMap<String, PickleValue> = root
            .into_iter()
            .map(|(k, v)| (key_to_string(k), v))
            .collect();
        let nodes = root.remove(NODES_KEY).ok_or(DatasetFormatError::MissingNodes)?;
        let (PickleValue::List(entries) | PickleValue::Tuple(entries)) = nodes else {
            return Err(DatasetFormatError::NodesNotSequence);
        };
        let nodes = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| Node::from_pickle_entry(index, entry))
            .collect::<Result<Vec<_>, _>>()?;
        let extra = root
            .into_iter()
            .map(|(k, v)| (k, pickle_to_json(v)))
            .collect();

        Ok(Self { nodes, extra })
    }

    /// Parse a dataset from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(value)?)
    }

    /// Decode a dataset from pickle bytes
    pub fn from_pickle_slice(bytes: &[u8]) -> Result<Self, DatasetError> {
        let value = serde_pickle::value_from_slice(bytes, DeOptions::new())?;
        Ok(Self::from_pickle_value(value)?)
    }

    /// Decode a dataset from a pickle stream
    pub fn from_pickle_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let value = serde_pickle::value_from_reader(reader, DeOptions::new())?;
        Ok(Self::from_pickle_value(value)?)
    }

    /// Load a dataset file in a single blocking read
    pub fn from_file(path: &Path, format: DatasetFormat) -> Result<Self, DatasetError> {
        info!(path = %path.display(), ?format, "Loading node dataset");
        let now = Instant::now();
        let dataset = match format {
            DatasetFormat::Pickle => Self::from_pickle_slice(&std::fs::read(path)?)?,
            DatasetFormat::Json => Self::from_json_str(&std::fs::read_to_string(path)?)?,
        };
        info!(
            nodes = dataset.nodes.len(),
            located = dataset.located_nodes().count(),
            elapsed_ms = now.elapsed().as_millis() as u64,
            "Dataset loaded"
        );
        if !dataset.extra.is_empty() {
            debug!(fields = ?dataset.extra.keys().collect::<Vec<_>>(), "Ignoring extra dataset fields");
        }
        Ok(dataset)
    }

    /// Nodes carrying an OSS location, in dataset order
    pub fn located_nodes(&self) -> impl Iterator<Item = (&str, &Location)> {
        self.nodes
            .iter()
            .filter_map(|n| n.oss.as_ref().map(|l| (n.id.as_str(), l)))
    }
}

/// Normalize a decoded pickle into JSON
///
/// Tuples, lists and sets become arrays; dict keys are stringified.
fn pickle_to_json(value: PickleValue) -> Value {
    match value {
        PickleValue::None => Value::Null,
        PickleValue::Bool(b) => Value::Bool(b),
        PickleValue::I64(i) => Value::from(i),
        PickleValue::Int(i) => float_to_json(i.to_string().parse().unwrap_or(f64::NAN)),
        PickleValue::F64(f) => float_to_json(f),
        PickleValue::Bytes(b) => Value::String(String::from_utf8_lossy(&b).into_owned()),
        PickleValue::String(s) => Value::String(s),
        PickleValue::List(items) | PickleValue::Tuple(items) => {
            Value::Array(items.into_iter().map(pickle_to_json).collect())
        }
        PickleValue::Set(items) | PickleValue::FrozenSet(items) => Value::Array(
            items
                .into_iter()
                .map(|item| pickle_to_json(item.into_value()))
                .collect(),
        ),
        PickleValue::Dict(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (key_to_string(k), pickle_to_json(v)))
                .collect(),
        ),
    }
}

fn key_to_string(key: HashableValue) -> String {
    match key {
        HashableValue::String(s) => s,
        HashableValue::Bytes(b) => String::from_utf8_lossy(&b).into_owned(),
        other => pickle_to_json(other.into_value()).to_string(),
    }
}

// Opaque attributes only: NaN and infinities have no JSON form and become null
fn float_to_json(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
