//! CLIPGRAPH - animation clip relationship inference
//!
//! Re-exports all modules for use by the binary target.

// Core: naming grammar and relationship resolution
pub mod clip_name;
pub mod resolver;

// I/O shims and driver
pub mod cli;
pub mod config;
pub mod report;
pub mod runner;
pub mod scan;

pub use clip_name::{ClipKey, ParsedClip, Transition, parse};
pub use resolver::{Clip, ClipGraph, ClipIndex, Diagnostic, resolve};
