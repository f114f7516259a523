//! Random outing generation for stress testing and benchmarks.

pub mod generator;
