// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod bench;
pub mod serve;
pub mod stats;
pub mod validate;
