//! Deploy-or-upgrade orchestration for registry-backed proxy modules, with
//! optional routing of state-changing calls through a Safe multisig.

pub mod artifacts;
pub mod config;
pub mod context;
pub mod deploy;
pub mod dispatcher;
pub mod error;
pub mod facets;
pub mod manifest;
pub mod proxy;
pub mod registry;
pub mod roles;
pub mod safe;
pub mod signature;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::Error;
