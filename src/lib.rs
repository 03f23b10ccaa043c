// The binary entry point is main.rs; the library exposes the module tree so
// integration tests and benchmarks can drive the app without a terminal.

pub mod api;
pub mod app;
pub mod classify;
pub mod config;
pub mod content;
pub mod event;
pub mod nav;
pub mod router;
pub mod store;
pub mod ui;
