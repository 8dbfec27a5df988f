pub mod stats;

pub use stats::{IqrBounds, StatsHelper};
