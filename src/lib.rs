//! Live room availability: reconciles scraped booking-site slots with a room
//! catalog, falling back to a catalog search when live data has no match.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod model;
pub mod observability;
pub mod source;
