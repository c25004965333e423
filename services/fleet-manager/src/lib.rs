//! Fleet manager control plane: stage VM decommissioning.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod api;
pub mod application;
pub mod domain;
pub mod infra;
