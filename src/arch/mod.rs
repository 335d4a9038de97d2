//! GPU architecture capability model
//!
//! - [`family`] - closed set of supported families and their constant tables
//! - [`metadata`] - registry keys and dynamic agent records
//! - [`profile`] - the immutable per-run profile with occupancy and peak formulas
//!
//! # Example
//!
//! ```rust
//! use rocmlens::arch::ArchitectureProfile;
//!
//! let arch = ArchitectureProfile::from_registry("gfx90a", 104).unwrap();
//! let occupancy = arch.compute_occupancy(64, 0, 256);
//! assert!(occupancy > 0.0 && occupancy <= 1.0);
//! ```

pub mod family;
pub mod metadata;
pub mod profile;

pub use family::{ArchFamily, FamilyTable};
pub use metadata::{AgentMetadata, ArchitectureSource};
pub use profile::{ArchitectureProfile, OccupancyEstimate, OccupancyLimiter};
