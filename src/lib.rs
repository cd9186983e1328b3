//! Supply chain harness - drives a supply-chain contract and its token
//! through a scripted sequence on a local chain
//!
//! # Architecture
//!
//! ## Chain side
//! - [`chain`] - Local dev node bootstrap and contract deployment
//! - [`contracts`] - ABI-driven contract calls over JSON-RPC
//! - [`abi`] - Argument coercion and value rendering
//! - [`deployment`] - Contract addresses and compiled artifacts
//!
//! ## Participants
//! - [`accounts`] - `accounts.json` and the six demo participants
//! - [`crypto`] - secp256k1 key checks
//! - [`statuses`] - Role and product-status codes
//!
//! ## Storage side
//! - [`storage`] - Content-addressed metadata store, HTTP shim and client
//!
//! ## Orchestration
//! - [`workflow`] - The enrollment, minting, upload and status-change sequence
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Chain side
// ============================================================================
pub mod abi;
pub mod chain;
pub mod contracts;
pub mod deployment;

// ============================================================================
// Participants
// ============================================================================
pub mod accounts;
pub mod crypto;
pub mod statuses;

// ============================================================================
// Storage side
// ============================================================================
pub mod storage;

// ============================================================================
// Orchestration
// ============================================================================
pub mod workflow;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
