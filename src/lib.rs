pub mod batch;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod feature_export;
pub mod feature_store;
pub mod features;
pub mod game_source;
pub mod geometry;
pub mod manpower;
pub mod payload;
pub mod timeline;
