//! Route handlers.

pub mod assets;
pub mod index;
pub mod upload;
