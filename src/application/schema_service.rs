//! JSON-schema validation of request bodies and the configuration file.
//!
//! Schemas are compiled once at construction and looked up by file name,
//! e.g. `login.requestbody.schema.json`.

use crate::domain::error::DomainError;
use anyhow::{Context, Result};
use jsonschema::Validator;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

pub const CONFIG_SCHEMA: &str = "config.schema.json";
pub const COURSE_SCHEMA: &str = "course.requestbody.schema.json";
pub const COURSE_CHANGE_SCHEMA: &str = "coursechange.requestbody.schema.json";
pub const COURSE_DATE_SCHEMA: &str = "coursedate.requestbody.schema.json";
pub const COURSE_DATE_CHANGE_SCHEMA: &str = "coursedatechange.requestbody.schema.json";
pub const BOOKING_SCHEMA: &str = "coursedatebooking.requestbody.schema.json";
pub const LOGIN_SCHEMA: &str = "login.requestbody.schema.json";
pub const SIGNUP_SCHEMA: &str = "signup.requestbody.schema.json";

const BUNDLED_SCHEMAS: &[(&str, &str)] = &[
    (CONFIG_SCHEMA, include_str!("../../schemas/config.schema.json")),
    (COURSE_SCHEMA, include_str!("../../schemas/course.requestbody.schema.json")),
    (
        COURSE_CHANGE_SCHEMA,
        include_str!("../../schemas/coursechange.requestbody.schema.json"),
    ),
    (
        COURSE_DATE_SCHEMA,
        include_str!("../../schemas/coursedate.requestbody.schema.json"),
    ),
    (
        COURSE_DATE_CHANGE_SCHEMA,
        include_str!("../../schemas/coursedatechange.requestbody.schema.json"),
    ),
    (
        BOOKING_SCHEMA,
        include_str!("../../schemas/coursedatebooking.requestbody.schema.json"),
    ),
    (LOGIN_SCHEMA, include_str!("../../schemas/login.requestbody.schema.json")),
    (SIGNUP_SCHEMA, include_str!("../../schemas/signup.requestbody.schema.json")),
];

pub struct SchemaService {
    validators: HashMap<String, Validator>,
}

impl SchemaService {
    /// Compiles every schema shipped with the crate.
    pub fn bundled() -> Result<Self> {
        let mut schemas = Vec::with_capacity(BUNDLED_SCHEMAS.len());
        for (name, source) in BUNDLED_SCHEMAS {
            let schema: Value = serde_json::from_str(source)
                .with_context(|| format!("schema {} is not valid JSON", name))?;
            schemas.push((name.to_string(), schema));
        }
        Self::from_schemas(schemas)
    }

    pub fn from_schemas(schemas: impl IntoIterator<Item = (String, Value)>) -> Result<Self> {
        let mut validators = HashMap::new();
        for (name, schema) in schemas {
            let validator = jsonschema::validator_for(&schema)
                .map_err(|e| anyhow::anyhow!("schema {} does not compile: {}", name, e))?;
            debug!(schema = %name, "Schema compiled");
            validators.insert(name, validator);
        }
        Ok(Self { validators })
    }

    /// Checks `instance` against the named schema. All violations are joined
    /// into a single validation error.
    #[instrument(skip(self, instance))]
    pub fn validate(&self, schema: &str, instance: &Value) -> Result<()> {
        let validator = self
            .validators
            .get(schema)
            .ok_or_else(|| DomainError::Internal(format!("Unknown schema {}", schema)))?;

        let errors: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();

        if errors.is_empty() {
            return Ok(());
        }

        warn!(schema = schema, violations = errors.len(), "Schema validation failed");
        Err(DomainError::Validation(errors.join("; ")).into())
    }
}
