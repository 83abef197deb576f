//! Spatiotemporal indexing and aggregation for heterogeneous tabular data.
//!
//! The workflow is three calls: [`index`] attaches a geometry and a
//! `time_start`/`time_end` pair to every record, [`aggregate`] groups the
//! indexed records at a spatial then a temporal granularity, and
//! [`evaluate_consistency`] scores the result.

pub mod agg;
pub mod dataset;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod notice;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod spatial;
pub mod spatial_agg;
pub mod temporal;
pub mod temporal_agg;
pub mod util;
pub mod validate;
pub mod value;

pub use agg::AggSpec;
pub use dataset::{columns, Dataset, DEFAULT_CRS};
pub use error::Error;
pub use geometry::Geometry;
pub use loader::{read_csv, read_csv_indexed, read_json, read_json_indexed, IndexOptions, LoadReport};
pub use notice::{Notice, Outcome};
pub use options::{
    AggFunction, Metric, SpatialGranularity, SpatialType, TemporalFormat, TemporalGranularity,
};
pub use output::{preview, write_csv, write_json};
pub use pipeline::{aggregate, evaluate_consistency, index};
pub use validate::{validate_aggregation_parameters, validate_data};
pub use value::{Column, Value};
