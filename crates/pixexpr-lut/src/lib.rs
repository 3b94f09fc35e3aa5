//! Pixexpr LUT — applying pixexpr programs to sample planes.
//!
//! Builds lookup tables from compiled expressions, or evaluates them per
//! sample when a table is impossible or too large, and wraps both behind a
//! per-plane filter configured from JSON.
//!
//! ```text
//!   LutConfig ──> LutFilter<T> ──process(plane, dst, sources)──> Plane<T>
//!                   │
//!                   ├─ SingleLut   x             8..16 bit
//!                   ├─ MultiLut    x y [z [a]]   8 bit
//!                   ├─ SpatialLut  coordinates   any depth
//!                   └─ ContextPool realtime      any depth, threaded
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod plane;
pub mod realtime;
pub mod spatial;
pub mod table;

// Re-exports for convenience.
pub use config::{LutConfig, PlaneOperator, RealtimeConfig, SpatialMode};
pub use error::LutError;
pub use filter::{LutFilter, LutKind};
pub use plane::{Plane, Sample};
pub use realtime::ContextPool;
pub use spatial::SpatialLut;
pub use table::{MultiLut, SingleLut};
