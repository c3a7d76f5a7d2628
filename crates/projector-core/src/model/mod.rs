//! Relational model as plain data
//!
//! The model is an explicit edge table built once at load time:
//! `{class name: [edge { field, target, cardinality, join }]}`. Traversal
//! reads this table; it never introspects rows to discover relationships.

pub mod instance;
pub mod naming;
pub mod schema;

pub use instance::Instance;
pub use naming::var_name;
pub use schema::{
    Cardinality, Edge, EntityClass, Join, ModelDescription, ModelSchema, TableRewrite,
};
