//! Use-case services orchestrating extension loading.
//!
//! # Responsibility
//! - Combine path resolution, manifests, host calls and resource providers.
//! - Keep every step on its designated execution context.

pub mod extension_service;
