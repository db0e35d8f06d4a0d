pub mod analyzer;
pub mod extraction;
pub mod orchestrator;
pub mod parser;

pub use analyzer::ValueAnalyzer;
pub use orchestrator::ReportAnalyzer;
