pub mod annotation_queries;
pub mod instrument_queries;
