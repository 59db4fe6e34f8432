pub mod compositor;
pub mod config;
pub mod crop;
pub mod dataset;
pub mod episode;
pub mod morphology;
pub mod normalize;

mod sampling;
