//! Declared parameter shapes.
//!
//! A parameter type lists its fields once, statically, with the same
//! information struct tags would carry: external names per namespace,
//! message overrides (`err-required = "..."`) and the rules to check.
//!
//! ```ignore
//! impl Params for Hit {
//!     const FIELDS: &'static [FieldSpec] = &[
//!         FieldSpec::new("heartbeat")
//!             .tags(&[("json", "heartbeat"), ("form", "heartbeat"), ("err-min", "heartbeat must be greater than 0")])
//!             .rules(&[Rule::Min(1.0)]),
//!     ];
//!
//!     fn value(&self, field: &str) -> FieldValue<'_> {
//!         match field {
//!             "heartbeat" => FieldValue::Int(self.heartbeat.into()),
//!             _ => FieldValue::Missing,
//!         }
//!     }
//! }
//! ```

use std::fmt;

use serde::de::DeserializeOwned;

use crate::validation::content_type::TagNamespace;

/// A validation rule attached to a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Present and not the zero value.
    Required,
    /// Numbers: value >= n. Text: at least n characters.
    Min(f64),
    /// Numbers: value <= n. Text: at most n characters.
    Max(f64),
    /// Numbers: value == n. Text: exactly n characters.
    Len(usize),
    Email,
    /// Value is one of the listed literals.
    OneOf(&'static [&'static str]),
}

impl Rule {
    /// Rule name as used in message override tags.
    pub fn tag(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::Len(_) => "len",
            Rule::Email => "email",
            Rule::OneOf(_) => "oneof",
        }
    }

    /// Rule parameter rendered for messages.
    pub fn param(&self) -> String {
        match self {
            Rule::Required | Rule::Email => String::new(),
            Rule::Min(n) | Rule::Max(n) => format_number(*n),
            Rule::Len(n) => n.to_string(),
            Rule::OneOf(options) => options.join(" "),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One declared field of a parameter type.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name in the Rust type.
    pub name: &'static str,
    /// Tag key/value pairs.
    pub tags: &'static [(&'static str, &'static str)],
    pub rules: &'static [Rule],
}

impl FieldSpec {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            tags: &[],
            rules: &[],
        }
    }

    pub const fn tags(self, tags: &'static [(&'static str, &'static str)]) -> Self {
        Self { tags, ..self }
    }

    pub const fn rules(self, rules: &'static [Rule]) -> Self {
        Self { rules, ..self }
    }

    /// Value of the tag `key`, if declared and non-empty.
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .filter(|v| !v.is_empty())
    }

    /// External name under `namespace`: the first comma-separated segment
    /// of the namespace tag, or an empty string when the tag is absent.
    pub fn external_name(&self, namespace: TagNamespace) -> &'static str {
        self.tag(namespace.as_str())
            .and_then(|tag| tag.split(',').next())
            .unwrap_or("")
    }
}

/// Find a declared field by its Rust name.
pub fn find_field<'a>(fields: &'a [FieldSpec], name: &str) -> Option<&'a FieldSpec> {
    fields.iter().find(|field| field.name == name)
}

/// A field value as seen by the rule checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// Absent optional value.
    Missing,
    Str(&'a str),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl FieldValue<'_> {
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::Missing => true,
            FieldValue::Str(s) => s.is_empty(),
            FieldValue::Int(n) => *n == 0,
            FieldValue::Float(n) => *n == 0.0,
            FieldValue::Bool(b) => !b,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldValue::Int(_) | FieldValue::Float(_))
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(n) => Some(*n as f64),
            FieldValue::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Missing => Ok(()),
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Float(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A parameter type a route can declare.
pub trait Params: DeserializeOwned + Send + Sync + 'static {
    /// Declared fields, in declaration order.
    const FIELDS: &'static [FieldSpec];

    /// Current value of the field named `field`.
    fn value(&self, field: &str) -> FieldValue<'_>;
}

/// Routes without a parameter use `()`.
impl Params for () {
    const FIELDS: &'static [FieldSpec] = &[];

    fn value(&self, _field: &str) -> FieldValue<'_> {
        FieldValue::Missing
    }
}

/// One failed rule on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Field name in the Rust type.
    pub field: String,
    /// Failed rule name (`required`, `min`, ...).
    pub rule: String,
    /// Rule parameter, empty for parameterless rules.
    pub param: String,
    /// Offered value, rendered.
    pub value: String,
    /// Whether the offered value was a number.
    pub numeric: bool,
}

impl Violation {
    pub fn new(field: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            param: String::new(),
            value: String::new(),
            numeric: false,
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>, numeric: bool) -> Self {
        self.value = value.into();
        self.numeric = numeric;
        self
    }
}
