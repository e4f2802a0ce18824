//! Data layer: core types, loading, binning, and profile statistics.
//!
//! ```text
//!  .parquet / .json / .csv          survey .json
//!        │                               │
//!        ▼                               ▼
//!   ┌──────────┐                   ┌──────────┐
//!   │  loader  │                   │  survey  │
//!   └──────────┘                   └──────────┘
//!        │                               │
//!        ▼                               ▼
//!   SightlineSet                  Vec<SurveyPoint>
//!        │
//!        ▼
//!   ┌──────────┐  angle/radius   ┌──────────┐
//!   │ binning  │ ──────────────▶ │ profile  │ → ProfileBand (median, IQR)
//!   └──────────┘     bin ids     └──────────┘
//! ```

pub mod binning;
pub mod loader;
pub mod model;
pub mod profile;
pub mod survey;
