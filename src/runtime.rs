//! Runtime model shared by the executor: values, scopes, class descriptors,
//! and the comparison/arithmetic kernel.
pub mod class;
pub mod context;
pub mod error;
pub mod ops;
pub mod scope;
pub mod value;
