//! Parameter validation subsystem.
//!
//! # Data Flow
//! ```text
//! Decoded parameter (P: Params)
//!     → validator.rs (check declared rules, collect violations)
//!     → mapper.rs (violation → external field name → message)
//!         → content_type.rs (content type → tag namespace)
//!         → schema.rs (field tags: names, message overrides)
//!         → locale.rs (translated fallback messages)
//!     → FieldMessages handed to the error handler
//! ```
//!
//! # Design Decisions
//! - Parameter shapes are declared statically; no runtime introspection
//! - The validator is an explicit service object, never a global
//! - Message overrides live next to the field they describe

pub mod content_type;
pub mod locale;
pub mod mapper;
pub mod schema;
pub mod validator;

pub use content_type::TagNamespace;
pub use locale::Locale;
pub use mapper::{ErrorMapper, FieldMessages, MapError};
pub use schema::{FieldSpec, FieldValue, Params, Rule, Violation};
pub use validator::Validator;
