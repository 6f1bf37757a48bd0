//! Inventory analysis reports: text parsing for the `send-analysis-report` email.

pub mod dimensions;
pub mod parser;

pub use dimensions::{FixtureDimensions, parse_dimensions};
pub use parser::{AnalysisReport, Diagnostic, DiagnosticLevel, Score, parse_report};
