//! CLI command implementations.

pub(crate) mod mirror;

pub(crate) use mirror::MirrorArgs;
