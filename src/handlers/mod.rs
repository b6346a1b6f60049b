//! HTTP handlers

pub mod predict;
pub mod preflight;
pub mod status;
