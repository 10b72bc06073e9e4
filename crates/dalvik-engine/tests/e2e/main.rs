//! End-to-end tests for the Dalvik interpreter
//!
//! Each test assembles methods with `CodeWriter`, loads them into a
//! `SandboxRuntime` and checks the outcome of running them.
//!
//! Run with: `cargo test --test e2e`


mod arrays;
mod exceptions;
mod invoke;
mod objects;
