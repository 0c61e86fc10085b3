// Text normalization — word lists, the cleaning pipeline, and the shared
// vocabulary frequency table.

pub mod frequency;
pub mod normalizer;
pub mod wordlist;
