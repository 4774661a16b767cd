//! Creation and validation of resources described by definitions.
//!
//! Both operations are built on [`ResourceDefinition::apply_definition`][crate::definition::ResourceDefinition::apply_definition]
//! with level-specific callbacks:
//! - [`create_resource`] lifts a definition to the level of the given manager,
//!   creates every container and object along the way, then lowers back down, and
//! - [`validate_resource`] compares real resources against a definition at the same level,
//!   recording every divergence as a soft failure on the context.

mod create;
mod validate;

pub use create::*;
pub use validate::*;
