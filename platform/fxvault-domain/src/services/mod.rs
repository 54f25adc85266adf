pub mod chunking;
pub mod infer;
pub mod quality;
pub mod reconstruct;
pub mod resample;
