//! assessly-report: submission review reports.
//!
//! Builds a review of stored submissions and renders it as JSON or as a
//! self-contained HTML page.

pub mod html;
pub mod review;

pub use html::{generate_html, write_html_report};
pub use review::{ReviewReport, ReviewRow, ReviewSummary};
