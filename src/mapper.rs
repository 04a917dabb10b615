use crate::{
    schema::{Schema, NESTED_SEPARATOR},
    value::{ConfigValues, Value},
};
use indexmap::IndexMap;
use tracing::debug;

/// Variables as parsed from the env file, in file order
pub type RawEnv = IndexMap<String, String>;

/// Rename env variables to config property names
///
/// Every variable referenced by a mapping entry is consumed (whether or not a
/// value is present). Variables nobody references are kept under their own
/// name so validation can report them as unknown. On a name clash the mapped
/// value wins.
pub fn map_env(raw: &RawEnv, schema: &Schema) -> ConfigValues {
    let mut leftover = raw.clone();
    let mapped = map_scope(raw, schema, "", &mut leftover);

    debug!(
        schema = schema.name(),
        mapped = mapped.len(),
        unmapped = leftover.len(),
        "mapped env variables"
    );

    let mut result: ConfigValues = leftover
        .into_iter()
        .map(|(key, value)| (key, Value::Str(value)))
        .collect();
    result.extend(mapped);
    result
}

fn map_scope(raw: &RawEnv, schema: &Schema, env_prefix: &str, leftover: &mut RawEnv) -> ConfigValues {
    let mut mapped = ConfigValues::new();

    for mapping in schema.registry().lookup() {
        let env_name = format!("{}{}", env_prefix, mapping.env_name);
        if let Some(raw_value) = raw.get(&env_name) {
            mapped.insert(mapping.property_name.clone(), Value::Str(raw_value.clone()));
        }
        leftover.shift_remove(&env_name);
    }

    for field in schema.fields() {
        let Some(nested) = field.nested() else {
            continue;
        };
        let prefix = format!("{}{}{}", env_prefix, field.env_name, NESTED_SEPARATOR);
        let child = map_scope(raw, nested, &prefix, leftover);
        if !child.is_empty() && !mapped.contains_key(&field.property) {
            mapped.insert(field.property.clone(), Value::Object(child));
        }
    }

    mapped
}
