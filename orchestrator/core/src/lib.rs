// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Tempo Orchestrator Core
//!
//! Provisions and tears down the per-agent compute service behind the
//! shared voice load balancer. The cloud provider is the only source of
//! truth: every invocation re-derives resource names from the agent id and
//! reconciles against what it observes.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, deployment use cases, provider adapters and the invocation API

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
