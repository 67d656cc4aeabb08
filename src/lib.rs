//! Tastetrip — conversational travel-preference wizard.

pub mod cli;
pub mod config;
pub mod error;
pub mod itinerary;
pub mod wizard;
