//! core
//!
//! Core domain types, schemas, and supporting infrastructure.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ContentId, RepoPath
//! - [`status`] - Change records for the staging area
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for gitstate storage
//! - [`lock`] - Cross-process lock for staging operations
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Nothing here talks to a backend

pub mod config;
pub mod lock;
pub mod paths;
pub mod status;
pub mod types;
