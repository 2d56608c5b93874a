//! Écriture des FeatureCollections sur disque

pub mod geojson;

pub use self::geojson::{output_path, write_feature_collection, TARGET_SUFFIX};
