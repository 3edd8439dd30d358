//! Query compilation: canonical filter -> per-source predicate

pub mod compiler;
pub mod predicate;

pub use compiler::{compile, CompilePolicy, Compiled};
pub use predicate::Predicate;
