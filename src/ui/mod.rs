//! UI layer: panels and the central profile plot.

pub mod panels;
pub mod plot;
