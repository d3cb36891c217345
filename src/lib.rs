//! Workspace anchor package.
//!
//! Exists so workspace-wide dev tooling (git hooks) has a package to hang
//! off. All functionality lives in the `crates/` members.
