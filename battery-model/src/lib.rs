pub mod cell;
pub mod layout;
pub mod requirements;

// Re-export commonly used items for convenience
pub use cell::BatteryCell;
pub use requirements::{OptimizedBy, Requirements};
