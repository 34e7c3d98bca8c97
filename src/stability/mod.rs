pub mod circuit_breaker;
pub mod config;
pub mod counters;
pub mod errors;
pub mod registry;
pub mod scheduler;
pub mod snapshot;
pub mod state;

pub use circuit_breaker::Breaker;
pub use config::{BreakerConfig, ProbePolicy, ResolvedConfig};
pub use errors::BreakerError;
pub use registry::BreakerRegistry;
pub use snapshot::BreakerSnapshot;
pub use state::CircuitState;
