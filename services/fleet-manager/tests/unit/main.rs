//! Unit tests for the fleet manager
//!
//! These tests use in-memory collaborators and run fast without external I/O.

mod api;
