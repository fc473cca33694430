//! Marketing campaign analytics: load a campaign export, validate it, group
//! and rank its metrics, project ROI forward, and write a per-client PDF.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod font;
pub mod insights;
pub mod labels;
pub mod loader;
pub mod model;
pub mod output;
pub mod pdf;
pub mod projection;
pub mod report;
pub mod schema;
pub mod session;
pub mod types;
pub mod util;
pub mod views;

pub use error::{CampaignError, Result, SchemaError};
pub use session::Session;
pub use types::{CampaignTable, Column, Dimension, GroupKey, Metric};
