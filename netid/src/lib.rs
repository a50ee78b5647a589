//! Inspect, spoof and restore a host's MAC addresses and DHCPv6 DUID.
//!
//! The byte-level codecs live in `netid-core`; this crate applies their
//! values to live interfaces and keeps enough state to undo the change.
//!
//! # Architecture
//!
//! ## Applying identifiers
//!
//! - [`engine`]: Apply-verify-retry state machine shared by MAC and DUID
//!   writes
//! - [`identity`]: Top-level set / randomize / restore / reset operations
//! - [`sync`]: Rebuild the DUID from the interface's current MAC
//! - [`store`]: One-time record of the pre-change value per identifier kind
//!
//! ## Platform access
//!
//! - [`backend`]: The `Backend` capability trait plus the file, Linux and
//!   unsupported-platform implementations, selected once at startup
//! - [`target`]: Interface + identifier kind, and the `Identifier` trait that
//!   lets the engine treat MACs and DUIDs alike
//!
//! ## Support
//!
//! - [`config`]: TOML configuration with an embedded default
//! - [`error`]: `IdentityError` and its categories
//! - [`history`]: Capped JSON log of applied changes
//! - [`report`]: Colored terminal rendering
//!
//! # Workflow
//!
//! 1. **Load** configuration and pick a backend for the platform
//! 2. **Capture** the current value as the original, if none is recorded yet
//! 3. **Write** the new value through the backend
//! 4. **Verify** it by reading back, retrying with backoff
//! 5. **Restore** the recorded original later, or **reset** to let the OS
//!    regenerate it
//!
//! # Examples
//!
//! ```ignore
//! use netid::config::load_config;
//! use netid::identity::IdentityManager;
//!
//! let (config, _) = load_config(None)?;
//! let manager = IdentityManager::from_config(&config);
//! let outcome = manager.randomize_mac("eth0", true, true)?;
//! println!("{} -> {}", outcome.target, outcome.value);
//! ```

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod identity;
pub mod report;
pub mod store;
pub mod sync;
pub mod target;
