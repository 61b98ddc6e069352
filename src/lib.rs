//! Converts an OpenStreetMap XML export into five CSV tables (nodes,
//! node_tags, ways, way_nodes, way_tags) ready for bulk loading into SQL.

pub mod audit;
pub mod config;
pub mod data;
pub mod errors;
pub mod etl;
