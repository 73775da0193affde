//! Error types.
//!
//! Every variant maps to a stable snake_case `code()` that bindings can
//! forward to callers without parsing messages.

use crate::model::Position;
use thiserror::Error;

/// A topology document that cannot be turned into tiles.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed topology json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("topology has no object named '{0}'")]
    MissingObject(String),

    #[error("topology object '{0}' has no geometries")]
    EmptyGeometries(String),

    #[error("geometry '{geometry}' references arc {index}, but only {arcs} arcs exist")]
    InvalidArc { geometry: String, index: i64, arcs: usize },

    #[error("geometry '{geometry}' is not a hexagon ({points} distinct points)")]
    MalformedHexagon { geometry: String, points: usize },

    #[error("unsupported geometry type '{0}'")]
    UnsupportedGeometry(String),

    #[error("coordinate out of range in arc {0}")]
    NonFiniteCoordinate(usize),

    #[error("topology exceeds ingestion limit: {0}")]
    LimitExceeded(&'static str),

    #[error("cannot infer grid spacing: {0}")]
    InferenceAmbiguity(String),
}

impl DecodeError {
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::Json(_) => "invalid_json",
            DecodeError::MissingObject(_) => "missing_object",
            DecodeError::EmptyGeometries(_) => "empty_geometries",
            DecodeError::InvalidArc { .. } => "invalid_arc",
            DecodeError::MalformedHexagon { .. } => "malformed_hexagon",
            DecodeError::UnsupportedGeometry(_) => "unsupported_geometry",
            DecodeError::NonFiniteCoordinate(_) => "non_finite",
            DecodeError::LimitExceeded(_) => "limit_exceeded",
            DecodeError::InferenceAmbiguity(_) => "inference_ambiguity",
        }
    }
}

/// Rejected edit on the tile store.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GridError {
    #[error("position ({}, {}) is already occupied", .0.x, .0.y)]
    Occupied(Position),

    #[error("position ({}, {}) is outside the grid", .0.x, .0.y)]
    OutOfBounds(Position),

    #[error("no tile at ({}, {})", .0.x, .0.y)]
    NoTile(Position),
}

impl GridError {
    pub fn code(&self) -> &'static str {
        match self {
            GridError::Occupied(_) => "occupied",
            GridError::OutOfBounds(_) => "out_of_bounds",
            GridError::NoTile(_) => "no_tile",
        }
    }
}

#[derive(Error, Debug)]
pub enum CartogramError {
    #[error("no dataset selected")]
    NoDataset,

    #[error("dataset has no rows matching the base map")]
    EmptyBaseMap,

    #[error("distorter failed: {0}")]
    Distorter(String),
}

impl CartogramError {
    pub fn code(&self) -> &'static str {
        match self {
            CartogramError::NoDataset => "no_dataset",
            CartogramError::EmptyBaseMap => "empty_base_map",
            CartogramError::Distorter(_) => "distorter",
        }
    }
}

#[derive(Error, Debug)]
pub enum TilegramError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Cartogram(#[from] CartogramError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TilegramError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        TilegramError::Config(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            TilegramError::Decode(e) => e.code(),
            TilegramError::Grid(e) => e.code(),
            TilegramError::Cartogram(e) => e.code(),
            TilegramError::Config(_) => "config",
            TilegramError::Serialization(_) => "serialization",
        }
    }
}
