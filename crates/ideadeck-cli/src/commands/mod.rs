//! Command handlers

pub mod card;
pub mod category;
pub mod config;
pub mod status;
