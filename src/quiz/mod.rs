// src/quiz/mod.rs

//! Quiz attempt engine: identifier lookup, answer normalization, answer-key
//! resolution, scoring and the attempt lifecycle.

pub mod attempt;
pub mod error;
pub mod lookup;
pub mod normalize;
pub mod options;
pub mod scoring;

pub use error::QuizError;
pub use lookup::QuizRef;
