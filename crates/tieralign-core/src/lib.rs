//! Tieralign Core Types and Definitions
//!
//! This crate provides the foundational types for modeling hierarchically
//! nested annotation tiers. It includes:
//!
//! - **Identifiers**: Efficient string-interned names ([`identifier::Id`])
//! - **Entries**: The flat interval/point value shapes exchanged with
//!   external TextGrid readers and writers ([`entry`] module)
//! - **Hierarchy**: The annotation-class registry relating container and
//!   contained tags ([`hierarchy`] module)
//! - **Chains**: Dynamic construction of Top/Bottom-bounded tag chains
//!   ([`chain`] module)

pub mod chain;
pub mod entry;
pub mod hierarchy;
pub mod identifier;
