//! # Fetchflow Testing
//!
//! Testing utilities and mock collaborators for fetchflow.
//!
//! This crate provides:
//! - [`mocks::MockTransport`]: a scripted transport that replays queued
//!   responses (optionally after a delay, for racing concurrent tasks)
//! - [`mocks::RecordingNotifier`]: captures every notification
//! - [`TransitionTest`]: a fluent Given-When-Then harness for slice
//!   transitions
//!
//! ## Example
//!
//! ```
//! use fetchflow_testing::TransitionTest;
//! use fetchflow_core::Signal;
//! use serde_json::json;
//!
//! TransitionTest::new("widgets")
//!     .when_signal(|s| Signal::bare(s.request()))
//!     .when_signal(|s| Signal::new(s.success(), json!({"items": []})))
//!     .then_state(|state| {
//!         assert!(!state.loading);
//!         assert!(state.error.is_none());
//!     })
//!     .run();
//! ```

pub mod mocks;

pub use mocks::{MockTransport, RecordedCall, RecordingNotifier};
pub use transition_test::TransitionTest;
