//! Schema snapshot model and name index

mod schema;
mod schema_index;

pub use schema::{
    Column, ColumnSource, ProcedureParameter, RelationshipEdge, ScalarFunction, SchemaGraph,
    StoredProcedure, TableNode, Trigger, ViewNode, UNKNOWN_DATA_TYPE,
};
pub use schema_index::SchemaIndex;
