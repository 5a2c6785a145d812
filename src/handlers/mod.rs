//! HTTP handlers

pub mod health;
pub mod scans;
pub mod products;
pub mod suppliers;
pub mod users;
pub mod alerts;
