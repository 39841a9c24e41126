// THEORY:
// This file is the main entry point for the `motion_sentry` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the
// public API that will be exposed to external consumers (like the demo
// runner binary).
//
// The primary goal is to export the `SentryPipeline` and its associated data
// structures (`SentryConfig`, `FrameReport`, `AlertEvent`, etc.) as the
// clean, high-level interface for the engine, plus the async boundary
// (`LiveDetector`) that hosts it. The complex internal modules
// (`core_modules`) stay encapsulated behind those two surfaces.

pub mod async_pipeline;
pub mod config;
pub mod core_modules;
pub mod pipeline;
