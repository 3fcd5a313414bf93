//! # rf-math-pool — Pre-generated slot outcome pools
//!
//! Builds a finite, ordered pool of resolved spin outcomes ("tickets") whose
//! aggregate return-to-player and hit rate match configured targets, plus a
//! manifest describing how the pool was made.
//!
//! ## Features
//!
//! - **Hit-rate targeting**: rescales the zero-win weight mass
//! - **RTP calibration**: analytic seed + Monte-Carlo bisection under the cap
//! - **Deterministic generation**: one seeded ChaCha8 stream per pool
//! - **Pool retune**: final whole-pool correction toward the RTP target
//! - **Artifacts**: CSV, JSONL and a JSON manifest
//!
//! ## Architecture
//!
//! ```text
//! PoolConfig
//!     │
//!     ├── apply_hit_rate (base weights)
//!     ├── calibrate_rtp  (multiplier scale)
//!     │
//!     v
//! OutcomeSampler ─► TicketBuilder × N ─► retune_pool
//!                                           │
//!                                           v
//!                         GeneratedPool ─► ArtifactSet ─► directory
//! ```

pub mod builder;
pub mod calibrate;
pub mod config;
pub mod error;
pub mod export;
pub mod paylines;
pub mod retune;
pub mod sampler;
pub mod serialize;
pub mod stats;
pub mod ticket;
pub mod weights;

pub use builder::*;
pub use calibrate::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use paylines::*;
pub use retune::*;
pub use sampler::*;
pub use serialize::*;
pub use stats::*;
pub use ticket::*;
pub use weights::*;
