// src/models/mod.rs

pub mod attempt;
pub mod content;
pub mod question;
pub mod quiz;
pub mod user;
