pub mod activity;
pub mod cell;
pub mod column;
pub mod config;
pub mod region;
pub mod segment;
pub mod segment_update;
pub mod spatial_pooler;
pub mod stats;
pub mod synapses;
pub mod temporal_pooler;
pub mod topology;
