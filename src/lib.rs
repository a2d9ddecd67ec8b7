//! Endpoint resolution, capability binding and settings migration for
//! multi-channel Z-Wave field devices.
//!
//! A device is initialized in a fixed sequence:
//! 1. [`topology`] resolves endpoint roles from the node's endpoint graph
//! 2. [`migration`] moves legacy settings into the current schema, once
//! 3. [`capabilities`] binds declared capabilities to endpoints
//! 4. [`inputs`] decides which inputs are enabled and where they report
//!
//! [`device::Device`] runs that sequence and applies settings changes through
//! [`settings`], turning user values into parameter writes via [`codec`].

pub mod capabilities;
pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod inputs;
pub mod migration;
pub mod models;
pub mod settings;
pub mod store;
pub mod topology;
pub mod transport;
