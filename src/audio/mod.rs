//! Audio post-processing applied after neural synthesis.

pub mod processor;
