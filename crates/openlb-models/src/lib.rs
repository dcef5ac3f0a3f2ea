#![deny(missing_docs)]

//! # openlb Models
//!
//! Wire and domain types shared by the openlb SDK and CLI.
//!
//! ## Type groups
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`auth`] | Keystone v2/v3 request bodies, token responses, [`AccessInfo`] |
//! | [`catalog`] | Unified [`ServiceCatalog`] and endpoint lookup |
//! | [`lb`] | LBaaS resource schema (load balancers, nodes, monitors, ...) |
//! | [`node_spec`] | `ip:port[:weight=N][:backup=BOOL]` node argument parsing |
//!
//! Everything here is plain data: no I/O, no HTTP. The SDK drives the
//! requests; these types only describe what goes over the wire.

pub mod auth;
pub mod catalog;
pub mod lb;
pub mod node_spec;

// Re-export the common types at crate root for convenience.
pub use auth::*;
pub use catalog::*;
pub use lb::*;
pub use node_spec::*;
