//! Transform and validate a schema instance in a single pass.
//!
//! Every field is coerced and checked against all of its constraints; failures
//! are collected, never short-circuited.

use crate::{
    coerce::CSV_SEPARATOR,
    constraint::UNKNOWN_PROPERTY,
    field::Field,
    schema::{Schema, NESTED_SEPARATOR},
    value::{ConfigValues, Value},
};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorOptions {
    /// Report properties the schema does not declare instead of passing them through
    pub forbid_unknown: bool,
}

/// Env and config name prefixes of a (possibly nested) schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub env_prefix: String,
    pub config_prefix: String,
}

impl Scope {
    fn child(&self, field: &Field) -> Self {
        Self {
            env_prefix: format!("{}{}{}", self.env_prefix, field.env_name, NESTED_SEPARATOR),
            config_prefix: format!("{}{}.", self.config_prefix, field.property),
        }
    }
}

/// One property that failed at least one constraint
#[derive(Debug, Clone)]
pub struct FieldFailure<'s> {
    pub property: String,
    pub value: Value,
    /// `(constraint name, message)` in evaluation order
    pub constraints: Vec<(String, String)>,
    /// Schema declaring the property
    pub target: &'s Schema,
    pub scope: Scope,
}

/// Overlay mapped values on a fresh default instance of `schema`
pub fn instantiate(schema: &Schema, mapped: ConfigValues) -> ConfigValues {
    let mut instance = schema.defaults();

    for (key, value) in mapped {
        let value = match (schema.field(&key).and_then(Field::nested), value) {
            (Some(nested), Value::Object(child)) => Value::Object(instantiate(nested, child)),
            (_, value) => value,
        };
        instance.insert(key, value);
    }

    instance
}

/// Coerce and validate `instance`, returning the coerced values or every failure
pub fn transform_and_validate(
    schema: &Schema,
    instance: ConfigValues,
    options: ValidatorOptions,
) -> Result<ConfigValues, Vec<FieldFailure<'_>>> {
    let mut failures = Vec::new();
    let output = validate_scope(schema, instance, options, &Scope::default(), &mut failures);

    debug!(
        schema = schema.name(),
        failures = failures.len(),
        "validated config instance"
    );

    if failures.is_empty() {
        Ok(output)
    } else {
        Err(failures)
    }
}

fn validate_scope<'s>(
    schema: &'s Schema,
    mut instance: ConfigValues,
    options: ValidatorOptions,
    scope: &Scope,
    failures: &mut Vec<FieldFailure<'s>>,
) -> ConfigValues {
    let mut output = ConfigValues::new();

    let unknown: Vec<String> = instance
        .keys()
        .filter(|key| schema.field(key).is_none())
        .cloned()
        .collect();
    for key in unknown {
        let value = instance.shift_remove(&key).unwrap_or_default();
        if options.forbid_unknown {
            failures.push(FieldFailure {
                constraints: vec![(
                    UNKNOWN_PROPERTY.to_string(),
                    format!("property {} should not exist", key),
                )],
                property: key,
                value,
                target: schema,
                scope: scope.clone(),
            });
        } else {
            output.insert(key, value);
        }
    }

    for field in schema.fields() {
        let raw = instance.shift_remove(&field.property).unwrap_or_default();
        let value = field.coercer.apply(raw, field.array, CSV_SEPARATOR);

        // absence alone never fails an optional field
        if field.optional && value.is_undefined() {
            output.insert(field.property.clone(), value);
            continue;
        }

        let violated: Vec<(String, String)> = field
            .constraints
            .iter()
            .filter(|constraint| match &value {
                Value::List(items) if field.array => !items.iter().all(|item| constraint.check(item)),
                other => !constraint.check(other),
            })
            .map(|constraint| (constraint.name().to_string(), constraint.message()))
            .collect();

        if !violated.is_empty() {
            failures.push(FieldFailure {
                property: field.property.clone(),
                value: value.clone(),
                constraints: violated,
                target: schema,
                scope: scope.clone(),
            });
            output.insert(field.property.clone(), value);
            continue;
        }

        let value = match (field.nested(), value) {
            (Some(nested), Value::Object(child)) => Value::Object(validate_scope(
                nested,
                child,
                options,
                &scope.child(field),
                failures,
            )),
            (_, value) => value,
        };
        output.insert(field.property.clone(), value);
    }

    output
}
