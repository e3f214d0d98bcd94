//! Request and argument validation.
//!
//! [`RequestValidator`] checks JSON-RPC parameter objects against the schema
//! registered for their method. [`ArgumentValidator`] applies the narrower
//! preconditions individual operations rely on: collaborators present,
//! endpoints parseable, identifiers of the expected width.

mod arguments;
mod request;

pub use arguments::ArgumentValidator;
pub use request::{BUILTIN_SCHEMAS, ERROR_MSG_KEYWORD, RequestValidator, SchemaRegistry};
