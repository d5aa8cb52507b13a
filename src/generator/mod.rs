//! Definition generation from structured metadata

mod routine_generator;
mod view_generator;

pub use routine_generator::{generate_function_definition, generate_procedure_definition};
pub use view_generator::{generate_create_view, generate_view_definition};
