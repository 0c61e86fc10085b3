// Topicmill: topic modeling pipeline for delimited text records
//
// This is the library root. Each module corresponds to one stage of the
// pipeline: text normalization, corpus building, topic modeling, and
// topic assignment aggregation.

pub mod aggregate;
pub mod config;
pub mod corpus;
pub mod layout;
pub mod output;
pub mod status;
pub mod text;
pub mod topics;
