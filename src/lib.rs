//! # vrpconf - Idempotent configuration core for Huawei VRP devices
//!
//! `vrpconf` turns a declarative set of intents and the device's running
//! configuration into the minimal ordered list of VRP CLI commands needed to
//! converge. It does not talk to devices: a transport layer captures
//! `display current-configuration` and pushes the returned commands.
//!
//! ## Features
//!
//! - **Indentation-scoped diffing**: sub-commands are only compared within their own block
//! - **Shape-keyed undo overrides**: irregular negations such as `undo clock timezone`
//! - **Check mode**: dry-run results that are computed but flagged as not to be pushed
//! - **Save policy**: append `save` always, only on change, or never
//! - **Extensible kinds**: register new renderers without touching the diff engine
//!
//! ## Quick Start
//!
//! ```rust
//! use vrpconf::config::ReconcileOptions;
//! use vrpconf::intent::{DesiredState, IntentParams, VlanParams};
//! use vrpconf::reconciler::reconcile;
//!
//! fn main() -> Result<(), vrpconf::error::ReconcileError> {
//!     let intents = vec![
//!         VlanParams {
//!             id: 20,
//!             name: Some("Eng".to_string()),
//!             state: DesiredState::Present,
//!         }
//!         .into_intent()?,
//!     ];
//!
//!     let result = reconcile(&intents, &["#", "vlan 10", "#"], &ReconcileOptions::default())?;
//!     assert_eq!(result.commands, vec!["vlan 20", "name Eng", "save"]);
//!     print!("{result}");
//!     Ok(())
//! }
//! ```
//!
//! ## Main Components
//!
//! - [`normalize`] - Running config lines and indentation blocks
//! - [`render::Renderer`] - Intent kind registry and undo derivation
//! - [`catalog`] - Built-in VRP intent kinds and their schemas
//! - [`diff::DiffEngine`] - Ordered add/remove computation
//! - [`reconciler::Reconciler`] - Render, normalize, diff, save policy
//! - [`script::CommandScript`] - View-aware steps and rollback planning
//! - [`error::ReconcileError`] - Error types for every operation
//! - [`config`] - VRP dialect constants and options

pub mod backup;
pub mod catalog;
pub mod conditions;
pub mod config;
pub mod diff;
pub mod error;
pub mod facts;
pub mod intent;
pub mod normalize;
pub mod reconciler;
pub mod render;
pub mod script;

pub use config::{ReconcileOptions, SaveWhen};
pub use diff::{DiffResult, PreviewEntry};
pub use error::ReconcileError;
pub use intent::{Intent, IntentParams};
pub use reconciler::{Reconciler, reconcile};
pub use render::{CommandPair, Renderer};
