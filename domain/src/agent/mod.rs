//! Agent identities and the static agent hierarchy.

pub mod hierarchy;
pub mod identity;
