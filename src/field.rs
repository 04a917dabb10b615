use crate::{
    coerce::Coercer,
    constraint::Constraint,
    registry::MappingRegistry,
    schema::{Schema, SchemaError},
    value::{EnvEnum, Value},
};
use regex::Regex;

/// Semantic kind of a config field
#[derive(Debug, Clone)]
pub enum FieldKind {
    Boolean,
    Int,
    Float,
    String,
    /// Accepted values in declaration order
    Enum(Vec<String>),
    Object(Box<Schema>),
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Enum(_) => "enum",
            Self::Object(_) => "object",
        }
    }

    fn coercer(&self) -> Coercer {
        match self {
            Self::Boolean => Coercer::Boolean,
            Self::Int | Self::Float => Coercer::Number,
            Self::String => Coercer::String,
            Self::Enum(_) => Coercer::Enum,
            Self::Object(_) => Coercer::Object,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

/// Declaration of a single field: kind plus annotation options
///
/// # Example
/// ```rust
/// use envfile_loadr::{FieldSpec, Schema};
///
/// let schema = Schema::builder("ServerConfig")
///     .field(FieldSpec::int("port").env("PORT").optional().min(1.0).max(65535.0).default(8080))
///     .field(FieldSpec::string("host").env("HOST").matches("^[a-z.]+$"))
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.registry().env_name_of("port"), Some("PORT"));
/// ```
#[derive(Debug, Clone)]
pub struct FieldSpec {
    property: String,
    kind: FieldKind,
    env_name: Option<String>,
    description: String,
    optional: bool,
    array: bool,
    default: Value,
    min: Option<f64>,
    max: Option<f64>,
    type_bounds: (Option<f64>, Option<f64>),
    pattern: Option<String>,
}

impl FieldSpec {
    pub fn new(property: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            property: property.into(),
            kind,
            env_name: None,
            description: String::new(),
            optional: false,
            array: false,
            default: Value::Undefined,
            min: None,
            max: None,
            type_bounds: (None, None),
            pattern: None,
        }
    }

    pub fn boolean(property: impl Into<String>) -> Self {
        Self::new(property, FieldKind::Boolean)
    }

    pub fn int(property: impl Into<String>) -> Self {
        Self::new(property, FieldKind::Int)
    }

    pub fn float(property: impl Into<String>) -> Self {
        Self::new(property, FieldKind::Float)
    }

    pub fn string(property: impl Into<String>) -> Self {
        Self::new(property, FieldKind::String)
    }

    pub fn enumeration<I, S>(property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            property,
            FieldKind::Enum(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Enumeration field accepting the values of `E`
    pub fn enum_of<E: EnvEnum>(property: impl Into<String>) -> Self {
        Self::enumeration(property, E::VALUES.iter().copied())
    }

    pub fn object(property: impl Into<String>, schema: &Schema) -> Self {
        Self::new(property, FieldKind::Object(Box::new(schema.clone())))
    }

    /// Read the value from `env_name` instead of the property name
    pub fn env(mut self, env_name: impl Into<String>) -> Self {
        self.env_name = Some(env_name.into());
        self
    }

    pub fn doc(mut self, description: impl Into<String>) -> Self {
        self.description = description.into().trim().to_string();
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Accept a CSV list instead of a single value
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Range of the target Rust type, checked where no explicit bound is set
    pub fn implied_bounds(mut self, bounds: (Option<f64>, Option<f64>)) -> Self {
        self.type_bounds = bounds;
        self
    }

    /// Regex the (string) value must match, e.g. `^(ok|ko)$` for a full match
    pub fn matches(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    /// Apply the annotation: register the mapping, mark optionality and build
    /// the field rules in their fixed order (coercer, type check, bounds, pattern).
    pub(crate) fn annotate(self, registry: &mut MappingRegistry) -> Result<Field, SchemaError> {
        let env_name = self.env_name.unwrap_or_else(|| self.property.clone());
        registry.register(env_name.clone(), self.property.clone());

        if self.optional {
            registry.mark_optional(self.property.clone());
        }

        let coercer = self.kind.coercer();

        let mut constraints = Vec::new();
        match &self.kind {
            FieldKind::Boolean => constraints.push(Constraint::IsBoolean),
            FieldKind::Int => constraints.push(Constraint::IsInt),
            FieldKind::Float => constraints.push(Constraint::IsNumber),
            FieldKind::String => {
                constraints.push(Constraint::IsString);
                if !self.optional {
                    constraints.push(Constraint::NotEmpty);
                }
            }
            FieldKind::Enum(values) => constraints.push(Constraint::IsEnum(values.clone())),
            FieldKind::Object(schema) => {
                constraints.push(Constraint::Nested(schema.name().to_string()))
            }
        }

        if self.kind.is_numeric() {
            // explicit bounds never reach past what the Rust type holds
            let (type_min, type_max) = self.type_bounds;
            let max = match (self.max, type_max) {
                (Some(max), Some(limit)) => Some(Constraint::Max(max.min(limit))),
                (Some(max), None) => Some(Constraint::Max(max)),
                (None, limit) => limit.map(Constraint::TypeMax),
            };
            let min = match (self.min, type_min) {
                (Some(min), Some(limit)) => Some(Constraint::Min(min.max(limit))),
                (Some(min), None) => Some(Constraint::Min(min)),
                (None, limit) => limit.map(Constraint::TypeMin),
            };
            constraints.extend(max);
            constraints.extend(min);
        }

        if let (FieldKind::String, Some(pattern)) = (&self.kind, &self.pattern) {
            let regex = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
                property: self.property.clone(),
                source,
            })?;
            constraints.push(Constraint::Matches(regex));
        }

        Ok(Field {
            property: self.property,
            env_name,
            description: self.description,
            kind: self.kind,
            optional: self.optional,
            array: self.array,
            default: self.default,
            coercer,
            constraints,
        })
    }
}

/// A declared field with its rules, as stored in a [`Schema`]
#[derive(Debug, Clone)]
pub struct Field {
    pub property: String,
    pub env_name: String,
    pub description: String,
    pub kind: FieldKind,
    pub optional: bool,
    pub array: bool,
    pub default: Value,
    pub coercer: Coercer,
    pub constraints: Vec<Constraint>,
}

impl Field {
    pub fn nested(&self) -> Option<&Schema> {
        match &self.kind {
            FieldKind::Object(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn type_label(&self) -> String {
        if self.array {
            format!("{}[]", self.kind.type_name())
        } else {
            self.kind.type_name().to_string()
        }
    }
}
