// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Agent identity and configuration, derived resource names, the prompt
//! sanitizer, listener priority allocation and the cloud ports.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and rules shared by every use case

pub mod agent;
pub mod cloud;
pub mod compute;
pub mod config;
pub mod deployment;
pub mod naming;
pub mod prompt;
pub mod routing;
pub mod service;
