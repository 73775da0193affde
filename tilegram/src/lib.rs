pub mod model;
pub mod config;
pub mod error;
pub mod geometry {
    pub mod grid;
    pub mod limits;
    pub mod math;
    pub mod shape;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod populate;
    pub mod regions;
    pub mod ring;
}
pub mod codec {
    pub mod decode;
    pub mod encode;
    pub mod infer;
}
pub mod cartogram;
pub mod dataset;
pub mod grid;
pub mod metrics;
pub mod svg;
pub mod topology;

pub use algorithms::populate::populate_tiles;
pub use algorithms::regions::{FeatureLookup, RegionMap};
pub use cartogram::{CartogramController, CartogramState, Distorter, IterationTask};
pub use codec::decode::{decode, decode_str, DecodedTilegram};
pub use codec::encode::{encode, EncodeOptions, CODEC_VERSION, TILES_OBJECT};
pub use config::Settings;
pub use dataset::{DataValidationWarning, Dataset, DatasetRow};
pub use error::{CartogramError, DecodeError, GridError, TilegramError};
pub use geometry::grid::GridGeometry;
pub use geometry::shape::{HexOrientation, HexShape};
pub use grid::Grid;
pub use model::{Position, Region, Tile, TileCounts, TileSize, Vec2};
pub use topology::Topology;
