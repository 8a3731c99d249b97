//! Gateway assembly and routing

mod builder;
pub mod router;

pub use builder::{Hermod, HermodBuilder};
pub use router::{GatewayStats, Router};
