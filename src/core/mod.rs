//! Core library modules for butterfly-graph
//!
//! Graph construction, component extraction and serialization. Nothing in
//! here touches the terminal.

pub mod builder;
pub mod components;
pub mod error;
pub mod geo;
pub mod graph;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod speed;

