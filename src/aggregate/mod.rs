pub mod aggregator;
pub mod categories;
pub mod composition;
pub mod counts;
