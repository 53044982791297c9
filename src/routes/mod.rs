// ABOUTME: Route module organization for the commerce insights HTTP endpoints
// ABOUTME: Groups route definitions by dashboard area with thin handlers over the data and chat layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! Route module
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate to the data and service layers.

/// Chat turns, conversations, and message history
pub mod chat;
/// Finance views: products, KPIs, summary, sales, and Pareto
pub mod finanzas;
/// Health check and readiness routes
pub mod health;
/// Meta Ads summary and rankings
pub mod marketing;
/// Leads webhook, clients, and contact status
pub mod operativo;

pub use chat::ChatRoutes;
pub use finanzas::FinanzasRoutes;
pub use health::HealthRoutes;
pub use marketing::MarketingRoutes;
pub use operativo::OperativoRoutes;
