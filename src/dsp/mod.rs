//! Numerical signal reconstruction used by the Matcha vocoder path.

pub mod istft;
