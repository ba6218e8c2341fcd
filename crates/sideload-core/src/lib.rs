//! # sideload-core
//!
//! Core crate for sideload. Contains the configuration schema, the
//! unified error system with the typed lifecycle/upload/asset/hold errors,
//! and the capability seams the host plugs into: [`traits::ResourceHold`]
//! for keeping the machine awake and [`traits::Notifier`] for receiving
//! finished artifacts.
//!
//! This crate has **no** internal dependencies on other sideload crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
