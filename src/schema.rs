use crate::{
    field::{Field, FieldSpec},
    registry::MappingRegistry,
    value::{ConfigValues, Value},
};
use std::{fs, path::Path};

/// Separator between an object field's env name and its nested variables (`DB__HOST`)
pub const NESTED_SEPARATOR: &str = "__";

/// Errors in a schema declaration
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("field `{property}` is declared more than once in schema `{schema}`")]
    DuplicateField { schema: String, property: String },

    #[error("field `{property}` has an invalid match pattern: {source}")]
    InvalidPattern {
        property: String,
        source: regex::Error,
    },
}

/// Descriptor of a config schema: every field, its mapping and its rules
///
/// Built once per schema type and reused for every load.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    registry: MappingRegistry,
    fields: Vec<Field>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            registry: MappingRegistry::new(),
            fields: Vec::new(),
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, property: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.property == property)
    }

    /// A fresh instance holding every declared default
    ///
    /// Required object fields start out as an object of their own defaults,
    /// optional ones only exist once one of their variables is set.
    pub fn defaults(&self) -> ConfigValues {
        self.fields
            .iter()
            .map(|field| {
                let value = match field.nested() {
                    Some(nested) if field.default.is_undefined() && !field.optional => {
                        Value::Object(nested.defaults())
                    }
                    _ => field.default.clone(),
                };
                (field.property.clone(), value)
            })
            .collect()
    }

    /// Markdown summary of every environment variable the schema reads
    pub fn docs_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {} Environment Variables\n\n", self.name));
        md.push_str("| Variable | Required | Type | Description | Default |\n");
        md.push_str("|----------|----------|------|-------------|---------|\n");
        self.push_doc_rows(&mut md, "");

        md
    }

    fn push_doc_rows(&self, md: &mut String, env_prefix: &str) {
        for field in &self.fields {
            let env_name = format!("{}{}", env_prefix, field.env_name);
            if let Some(nested) = field.nested() {
                nested.push_doc_rows(md, &format!("{}{}", env_name, NESTED_SEPARATOR));
                continue;
            }

            let required_str = if field.optional { "No" } else { "Yes" };
            let description = if field.description.is_empty() {
                "-"
            } else {
                field.description.as_str()
            };
            let default_display = if field.default.is_undefined() {
                "-".to_string()
            } else {
                field.default.to_string()
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                env_name,
                required_str,
                field.type_label(),
                description,
                default_display
            ));
        }
    }

    /// Write [`Schema::docs_markdown`] to a file
    pub fn write_docs(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        fs::write(path, self.docs_markdown())
    }
}

/// Collects field annotations into a [`Schema`]
///
/// # Example
/// ```rust
/// use envfile_loadr::{FieldSpec, Schema};
///
/// let schema = Schema::builder("EnvSchema")
///     .field(FieldSpec::boolean("DEBUG").optional().default(false))
///     .field(FieldSpec::enumeration("LEVEL", ["info", "debug"]))
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.fields().len(), 2);
/// ```
pub struct SchemaBuilder {
    name: String,
    registry: MappingRegistry,
    fields: Vec<Field>,
    error: Option<SchemaError>,
}

impl SchemaBuilder {
    /// Annotate a field. The first declaration error is kept and returned by `build`.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        if self.error.is_some() {
            return self;
        }

        if self.fields.iter().any(|f| f.property == spec.property()) {
            self.error = Some(SchemaError::DuplicateField {
                schema: self.name.clone(),
                property: spec.property().to_string(),
            });
            return self;
        }

        match spec.annotate(&mut self.registry) {
            Ok(field) => self.fields.push(field),
            Err(e) => self.error = Some(e),
        }
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        Ok(Schema {
            name: self.name,
            registry: self.registry,
            fields: self.fields,
        })
    }
}
