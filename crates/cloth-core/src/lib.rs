//! Verlet cloth simulation against an animated, point-sampled collider.
//!
//! Three layers, leaves first:
//! - [`segment`]: exact closest points between two segments, used for swept
//!   collision.
//! - [`grid`]: per-frame spatial hash over collider samples.
//! - [`solver`]: particle integration, Jakobsen constraint relaxation,
//!   ground and body collision, mesh writeback.

pub mod collider;
pub mod config;
pub mod constraints;
pub mod error;
pub mod grid;
pub mod mesh;
pub mod particle;
pub mod segment;
pub mod solver;
pub mod topology;

pub use collider::{ColliderSample, ColliderSampler};
pub use config::{ClothConfig, CollisionModel, Timestep};
pub use error::{ClothError, ClothResult};
pub use grid::ColliderIndex;
pub use mesh::{ClothMesh, MeshFrame, MeshSink};
pub use segment::{segment_distance, Segment, SegmentDistance};
pub use solver::{ClothSolver, SolverState, StepReport};
