// Topic modelling — the engine seam, the bundled Gibbs-sampled LDA engine,
// and the artifacts a training run persists.

pub mod lda;
pub mod report;
pub mod traits;
