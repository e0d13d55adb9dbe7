// src/engine/mod.rs

pub mod sampler;
pub mod scoring;
