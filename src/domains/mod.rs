//! Domains module containing business logic organized by bounded contexts.

pub mod things;
pub mod tools;
