pub mod basket;
pub mod engagement;
pub mod ingest;
pub mod lease;
pub mod sampler;
