//! DAO Factory - proposal coordination and multi-contract deployment
//!
//! Collects a whitelist of participants for a proposed DAO, computes token
//! allocations and deploys the token, treasury and governance contracts,
//! waiting for on-chain confirmation between steps before distributing the
//! supply.
//!
//! Key principles:
//! - All token arithmetic is arbitrary precision with floor division
//! - Proposal state only moves forward; FAILED is terminal
//! - The chain is an opaque remote behind [`chain::ChainClient`]
//! - Partial deployment progress is always preserved

pub mod chain;
pub mod config;
pub mod dao;
pub mod deploy;
pub mod factory;

pub use config::{ConfigError, FactoryConfig};
pub use factory::{DaoFactory, ErrorKind, FactoryError};
