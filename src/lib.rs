//! Finite-capacity allocation core for production scheduling.
//!
//! Decides whether and when one resource's time can satisfy an activity's
//! phased requirement (clean, setup, run, post-processing, storage, clean),
//! and commits the result into the resource's schedule. The outer
//! discrete-event loop that picks *which* activity to try next lives
//! outside this crate.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Activity`, `Resource`, `CapacityInterval`,
//!   `RequiredCapacity`, `UsageProfile`, `Block`, changeover and trigger tables
//! - **`timeline`**: Ordered capacity intervals with cursor lookups and the
//!   pure `rebuild` that merges committed blocks in as occupied time
//! - **`search`**: Forward/backward capacity search and phase chaining
//! - **`setup`**: Required-capacity calculation with sequence-dependent
//!   setup and graded cleanout triggers
//! - **`attention`**: Attention sharing on multitasking resources
//! - **`reservation`**: Advisory holds consulted before a commit
//! - **`sequencing`**: Left-neighbor state and sawtooth scoring
//! - **`scheduler`**: `ResourceSimulationState` and the block scheduler
//! - **`validation`**: Configuration checks
//!
//! # Data Flow
//!
//! ```text
//! compute_required_capacity ─▶ find_chain ─▶ admission (reservations / attention)
//!                                                   │
//!                                        schedule ◀─┘ (or the caller discards)
//! ```
//!
//! # Example
//!
//! ```
//! use u_capacity::config::EngineConfig;
//! use u_capacity::models::{Activity, CapacityInterval, Resource};
//! use u_capacity::scheduler::{ResourceSimulationState, SearchContext};
//! use u_capacity::timeline::CapacityTimeline;
//!
//! let timeline = CapacityTimeline::new(vec![
//!     CapacityInterval::online(0, 480),
//!     CapacityInterval::offline(480, 960),
//!     CapacityInterval::online(960, 1440),
//! ])
//! .unwrap();
//! let mut state = ResourceSimulationState::new(Resource::single("M1"), timeline, EngineConfig::default());
//! state.initialize(Vec::new()).unwrap();
//!
//! let activity = Activity::new("O1", "J1").with_run_time(600);
//! let left = state.left_neighbor(0);
//! let window = state
//!     .find_schedulable_window(&activity, 0, 0, &left, &SearchContext::new(0))
//!     .unwrap();
//! let success = window.success().cloned().unwrap();
//! assert_eq!((success.start, success.finish), (0, 1080));
//!
//! let mut events = Vec::new();
//! let block = state.schedule(&activity, 0, &window.required, &success, &mut events).unwrap();
//! assert_eq!(block.run_ticks(), 600);
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Allahverdi et al. (2008), "A survey of scheduling problems with setup times or costs"

pub mod attention;
pub mod config;
pub mod error;
pub mod models;
pub mod reservation;
pub mod scheduler;
pub mod search;
pub mod sequencing;
pub mod setup;
pub mod timeline;
pub mod validation;

pub use error::{CapacityError, CapacityResult};
