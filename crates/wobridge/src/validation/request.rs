//! Schema-driven validation of JSON-RPC parameters.

use std::collections::HashMap;
use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError, Validator};
use serde_json::Value;
use tracing::{debug, error};

use crate::envelope::RequestId;
use crate::error::ProxyError;

const VALIDATION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::validation");

/// Schema annotation holding the diagnostic for a violated node.
pub const ERROR_MSG_KEYWORD: &str = "error_msg";

/// Schemas shipped with the crate, keyed by method name.
pub const BUILTIN_SCHEMAS: [(&str, &str); 7] = [
    (
        "WorkOrderSubmit",
        include_str!("../../schemas/WorkOrderSubmit.json"),
    ),
    (
        "WorkOrderGetResult",
        include_str!("../../schemas/WorkOrderGetResult.json"),
    ),
    (
        "WorkOrderComplete",
        include_str!("../../schemas/WorkOrderComplete.json"),
    ),
    (
        "EncryptionKeyGet",
        include_str!("../../schemas/EncryptionKeyGet.json"),
    ),
    (
        "EncryptionKeySet",
        include_str!("../../schemas/EncryptionKeySet.json"),
    ),
    (
        "EncryptionKeyStart",
        include_str!("../../schemas/EncryptionKeyStart.json"),
    ),
    (
        "EncryptionKeyRetrieve",
        include_str!("../../schemas/EncryptionKeyRetrieve.json"),
    ),
];

enum RegisteredSchema {
    Compiled {
        document: Value,
        validator: Box<Validator>,
    },
    Malformed {
        message: String,
    },
}

impl fmt::Debug for RegisteredSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compiled { document, .. } => f
                .debug_struct("Compiled")
                .field("document", document)
                .finish_non_exhaustive(),
            Self::Malformed { message } => f
                .debug_struct("Malformed")
                .field("message", message)
                .finish(),
        }
    }
}

/// Request schemas keyed by JSON-RPC method name.
///
/// Registration never fails. A schema that does not parse or compile is
/// kept as a malformed entry and reported on every validation of its
/// method.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, RegisteredSchema>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every schema in [`BUILTIN_SCHEMAS`].
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for (method, text) in BUILTIN_SCHEMAS {
            registry.register(method, text);
        }
        registry
    }

    /// Registers the schema document `text` for `method`, replacing any
    /// earlier registration.
    pub fn register(&mut self, method: impl Into<String>, text: &str) {
        let entry = match serde_json::from_str::<Value>(text) {
            Ok(document) => compile(document),
            Err(parse_error) => RegisteredSchema::Malformed {
                message: parse_error.to_string(),
            },
        };
        self.insert(method.into(), entry);
    }

    /// Registers an already parsed schema for `method`.
    pub fn register_value(&mut self, method: impl Into<String>, document: Value) {
        self.insert(method.into(), compile(document));
    }

    /// Returns `true` when a schema is registered for `method`.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.schemas.contains_key(method)
    }

    /// Returns the number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` when no schemas are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    fn insert(&mut self, method: String, entry: RegisteredSchema) {
        if let RegisteredSchema::Malformed { message } = &entry {
            error!(
                target: VALIDATION_TARGET,
                method = %method,
                error = %message,
                "registered schema is malformed"
            );
        }
        self.schemas.insert(method, entry);
    }

    fn get(&self, method: &str) -> Option<&RegisteredSchema> {
        self.schemas.get(method)
    }
}

fn compile(document: Value) -> RegisteredSchema {
    match jsonschema::options().build(&document) {
        Ok(validator) => RegisteredSchema::Compiled {
            document,
            validator: Box::new(validator),
        },
        Err(compile_error) => RegisteredSchema::Malformed {
            message: compile_error.to_string(),
        },
    }
}

/// Validates JSON-RPC parameters against per-method schemas.
///
/// Validation is read-only and deterministic: identical input yields an
/// identical diagnostic.
#[derive(Debug)]
pub struct RequestValidator {
    registry: SchemaRegistry,
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new(SchemaRegistry::with_builtin())
    }
}

impl RequestValidator {
    /// Creates a validator over `registry`.
    #[must_use]
    pub const fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Registry consulted by the validator.
    #[must_use]
    pub const fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Checks `params` against the schema registered for `method`.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::SchemaNotRegistered`] when `method` has no
    /// schema, and [`ProxyError::InvalidParameterFormatOrValue`] when
    /// `params` is not a non-empty object, violates the schema, or the
    /// schema itself is malformed.
    pub fn validate(
        &self,
        method: &str,
        params: &Value,
        request_id: &RequestId,
    ) -> Result<(), ProxyError> {
        let invalid = |data: String| ProxyError::invalid_parameter(Some(request_id.clone()), data);

        let Some(object) = params.as_object() else {
            return Err(invalid("Parameters must be a JSON object".to_owned()));
        };
        if object.is_empty() {
            return Err(invalid("Empty dictionary object received".to_owned()));
        }

        let Some(entry) = self.registry.get(method) else {
            error!(
                target: VALIDATION_TARGET,
                method,
                "no schema registered for method"
            );
            return Err(ProxyError::schema_not_registered(method));
        };

        match entry {
            RegisteredSchema::Malformed { message } => Err(invalid(message.clone())),
            RegisteredSchema::Compiled {
                document,
                validator,
            } => validator.validate(params).map_err(|violation| {
                let diagnostic = describe(document, &violation);
                debug!(
                    target: VALIDATION_TARGET,
                    method,
                    instance_path = %violation.instance_path,
                    diagnostic = %diagnostic,
                    "parameters rejected by schema"
                );
                invalid(diagnostic)
            }),
        }
    }
}

/// Picks the diagnostic for a schema violation.
///
/// Unexpected and missing fields are reported in the engine's words. Every
/// other violation is reported with the annotation of the schema node that
/// owns the failing keyword, falling back to the engine's words when the
/// node carries none.
fn describe(document: &Value, violation: &ValidationError<'_>) -> String {
    match &violation.kind {
        ValidationErrorKind::AdditionalProperties { .. } | ValidationErrorKind::Required { .. } => {
            violation.to_string()
        }
        _ => annotation(document, &violation.schema_path.to_string())
            .map_or_else(|| violation.to_string(), str::to_owned),
    }
}

fn annotation<'a>(document: &'a Value, keyword_path: &str) -> Option<&'a str> {
    let (node_path, _keyword) = keyword_path.rsplit_once('/')?;
    document
        .pointer(node_path)?
        .get(ERROR_MSG_KEYWORD)?
        .as_str()
}
