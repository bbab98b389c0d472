//! Ingredient name translation service.
//!
//! Resolves English ingredient names to Chinese by checking a persistent
//! cache, then a static dictionary (exact, then substring match), and finally
//! falling back to a placeholder that marks the term for manual translation.
//! Every non-cached result is written back to the cache.

pub mod cache;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod server;
pub mod translation;
