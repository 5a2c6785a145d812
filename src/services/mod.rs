//! Business logic services

pub mod features;
pub mod classifier;
pub mod rewards;
pub mod verification;
pub mod vision;
