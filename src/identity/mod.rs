//! Identity module for the egress catalog
//!
//! An identity is one VPN location the sweep can present to the target. The
//! catalog is an ordered, immutable list; its order is the round-robin order
//! rotation walks through.

mod catalog;
mod pool;

pub use catalog::DEFAULT_IDENTITIES;
pub use pool::{Identity, IdentityPool, Selection};

use thiserror::Error;

/// Errors raised by catalog lookups
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Identity index {index} out of range (catalog size {size})")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("Identity catalog is empty")]
    EmptyCatalog,
}
