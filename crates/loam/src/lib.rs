//! Loam - workflow-orchestration CLI built around mode plugins.
//!
//! A *mode* is an interchangeable workflow phase (discovery, planning,
//! build) with its own lifecycle and durable state. This crate wires the
//! built-in modes, the TOML config layer, and the CLI commands on top of
//! the `loam-modes` registry/factory and the `loam-state` engine.

pub mod builtin;
pub mod commands;
pub mod config;
