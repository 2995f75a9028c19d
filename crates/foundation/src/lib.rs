pub mod bounds;
pub mod coord;
pub mod lang;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use coord::*;
pub use lang::*;
