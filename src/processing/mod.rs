//! Keyword normalization, alignment scoring, and ATS scoring

pub mod keywords;
pub mod records;
pub mod alignment;
pub mod ats_scorer;

pub use alignment::AlignmentScorer;
pub use ats_scorer::ATSScoringEngine;
pub use keywords::KeywordExtractor;
