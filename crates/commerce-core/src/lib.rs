// ABOUTME: Core types and constants for the commerce insights server
// ABOUTME: Foundation crate with error handling, pagination clamps, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

#![deny(unsafe_code)]

//! # Commerce Core
//!
//! Foundation crate shared by the server and its tests. It changes rarely,
//! which keeps incremental builds of the main crate cheap.
//!
//! ## Modules
//!
//! - **errors**: `AppError`, `ErrorCode`, and HTTP rendering
//! - **constants**: stored-procedure names, defaults, and API messages
//! - **pagination**: page/limit normalization and numeric clamps

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Offset pagination and bounded numeric parameters
pub mod pagination;
