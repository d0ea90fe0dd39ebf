//! Core building blocks for shelfd: layered settings, the module
//! lifecycle trait, and the registry that drives startup and shutdown.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
