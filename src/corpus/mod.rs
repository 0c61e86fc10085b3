// Corpus building — source records to training corpus and word listings.

pub mod builder;
pub mod record;
