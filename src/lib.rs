pub mod config;
pub mod stability;

// Re-export commonly used types
pub use config::{AppConfig, BreakerSettings};
pub use stability::{
    Breaker, BreakerConfig, BreakerError, BreakerRegistry, BreakerSnapshot, CircuitState,
    ProbePolicy,
};
