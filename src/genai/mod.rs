//! Generative-AI collaborator
//!
//! Asks Gemini to compare how a place is represented on map reviews,
//! rental listings, event listings and social media.

mod client;
pub mod models;

pub use client::GeminiClient;
pub use models::{AnalysisResult, PublicNature, Source};
