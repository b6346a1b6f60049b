//! Text Module - Input Normalization
//!
//! Pure functions only. Safe to call from any number of request tasks.

pub mod normalize;
pub mod stopwords;

pub use normalize::clean_text;
