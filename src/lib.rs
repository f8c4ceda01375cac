// Reporting core for the sports-facility management system: fetch raw
// check-in/check-out events from the backend, filter and aggregate them
// client-side, render a chart, and export the summary as spreadsheet, PDF,
// Word, and CSV documents.
pub mod chart;
pub mod client;
pub mod export;
pub mod reports;
pub mod types;
pub mod util;
pub mod view;
