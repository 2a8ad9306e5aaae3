//! Core types for Hello Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;

pub use email::{Email, EmailError, MAX_EMAIL_LENGTH};
pub use id::*;
pub use price::Price;
pub use role::Role;
