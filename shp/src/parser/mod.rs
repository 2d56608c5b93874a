//! Parsers des composants d'un shapefile

pub mod dbf;
pub mod prj;
pub mod shp;
