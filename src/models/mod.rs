//! Data models

pub mod supplier;
pub mod product;
pub mod scan;
pub mod alert;
pub mod user;
pub mod badge;
pub mod provenance;

pub use supplier::*;
pub use product::*;
pub use scan::*;
pub use alert::*;
pub use user::*;
pub use badge::*;
pub use provenance::*;
