//! Validation error mapper.
//!
//! # Responsibilities
//! - Turn a violation list into external field name → message
//! - Prefer the field's `<prefix>-<rule>` message override
//! - Otherwise use the locale message (when translating) or the generic one
//!
//! # Design Decisions
//! - Unresolvable content type short-circuits before any violation is read
//! - Violations naming an undeclared field are dropped
//! - Fields without a name in the namespace map under `""`; later entries
//!   overwrite earlier ones

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::validation::content_type::TagNamespace;
use crate::validation::schema::{find_field, FieldSpec, Violation};
use crate::validation::validator::Validator;

pub const DEFAULT_TAG_PREFIX: &str = "err";

/// External field name → message.
pub type FieldMessages = BTreeMap<String, String>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("unsupported Content-Type:{0}")]
    UnsupportedContentType(String),
}

#[derive(Debug, Clone)]
pub struct ErrorMapper {
    /// Stored with its trailing `-`.
    tag_prefix: String,
    translator: Option<Arc<Validator>>,
}

impl Default for ErrorMapper {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_PREFIX)
    }
}

impl ErrorMapper {
    pub fn new(prefix: &str) -> Self {
        Self {
            tag_prefix: format!("{prefix}-"),
            translator: None,
        }
    }

    /// Use `validator`'s locale for messages without an override.
    pub fn with_translator(mut self, validator: Arc<Validator>) -> Self {
        self.translator = Some(validator);
        self
    }

    pub fn tag_prefix(&self) -> &str {
        &self.tag_prefix
    }

    pub fn map(
        &self,
        fields: &[FieldSpec],
        violations: &[Violation],
        content_type: &str,
    ) -> Result<FieldMessages, MapError> {
        let namespace = TagNamespace::from_content_type(content_type)
            .ok_or_else(|| MapError::UnsupportedContentType(content_type.to_string()))?;

        let mut messages = FieldMessages::new();
        for violation in violations {
            let Some(field) = find_field(fields, &violation.field) else {
                tracing::trace!(field = %violation.field, "Violation for undeclared field dropped");
                continue;
            };

            let external = field.external_name(namespace);
            let override_key = format!("{}{}", self.tag_prefix, violation.rule);
            let message = match field.tag(&override_key) {
                Some(message) => message.to_string(),
                None => self.fallback_message(violation, field, external),
            };
            messages.insert(external.to_string(), message);
        }
        Ok(messages)
    }

    fn fallback_message(&self, violation: &Violation, field: &FieldSpec, external: &str) -> String {
        match &self.translator {
            // Translations name the declared field, not its external key.
            Some(validator) => validator.translate(violation, field.name),
            None => format!(
                "param '{}' with value '{}' failed on the validation tag '{}'",
                external, violation.value, violation.rule
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::locale::Locale;
    use crate::validation::schema::Rule;

    const HIT: &[FieldSpec] = &[
        FieldSpec::new("lin")
            .tags(&[("form", "lin"), ("json", "lin"), ("err-required", "lin is required")])
            .rules(&[Rule::Required]),
        FieldSpec::new("tan")
            .tags(&[("form", "tan"), ("json", "tan"), ("err-required", "tan is required")])
            .rules(&[Rule::Required]),
        FieldSpec::new("heartbeat")
            .tags(&[("form", "heartbeat"), ("json", "heartbeat")])
            .rules(&[Rule::Min(1.0)]),
        FieldSpec::new("nameless").rules(&[Rule::Required]),
    ];

    fn heartbeat_violation() -> Violation {
        Violation::new("heartbeat", "min").with_param("1").with_value("-1", true)
    }

    #[test]
    fn test_overrides_and_generic_fallback() {
        let violations = vec![Violation::new("lin", "required"), heartbeat_violation()];
        let messages = ErrorMapper::default()
            .map(HIT, &violations, "application/json")
            .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages["lin"], "lin is required");
        assert_eq!(
            messages["heartbeat"],
            "param 'heartbeat' with value '-1' failed on the validation tag 'min'"
        );
    }

    #[test]
    fn test_translated_fallback() {
        let mapper = ErrorMapper::default().with_translator(Arc::new(Validator::new(Locale::En)));
        let messages = mapper.map(HIT, &[heartbeat_violation()], "").unwrap();
        assert_eq!(messages["heartbeat"], "heartbeat must be 1 or greater");
    }

    #[test]
    fn test_translation_names_declared_field() {
        const FIELDS: &[FieldSpec] = &[FieldSpec::new("email")
            .tags(&[("json", "mail")])
            .rules(&[Rule::Email])];
        let violation = Violation::new("email", "email").with_value("nope", false);

        let mapper = ErrorMapper::default().with_translator(Arc::new(Validator::new(Locale::Ja)));
        let messages = mapper.map(FIELDS, &[violation], "application/json").unwrap();
        assert_eq!(messages["mail"], "emailは正しいメールアドレスでなければなりません");
    }

    #[test]
    fn test_custom_prefix() {
        const FIELDS: &[FieldSpec] = &[FieldSpec::new("age")
            .tags(&[("json", "age"), ("msg-min", "too young"), ("err-min", "wrong prefix")])];
        let violation = Violation::new("age", "min").with_param("18").with_value("3", true);

        let messages = ErrorMapper::new("msg")
            .map(FIELDS, &[violation], "application/json")
            .unwrap();
        assert_eq!(messages["age"], "too young");
    }

    #[test]
    fn test_unsupported_content_type_short_circuits() {
        let err = ErrorMapper::default()
            .map(HIT, &[Violation::new("lin", "required")], "application/msgpack")
            .unwrap_err();
        assert_eq!(err, MapError::UnsupportedContentType("application/msgpack".into()));
    }

    #[test]
    fn test_unknown_fields_dropped_and_empty_names_collide() {
        let violations = vec![
            Violation::new("ghost", "required"),
            Violation::new("nameless", "required"),
            Violation::new("tan", "required"),
        ];
        let messages = ErrorMapper::default().map(HIT, &violations, "application/x-yaml").unwrap();

        // No yaml tags declared: every resolved field lands on "".
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[""], "tan is required");
    }

    #[test]
    fn test_all_unmatched_yields_empty() {
        let messages = ErrorMapper::default()
            .map(HIT, &[Violation::new("ghost", "required")], "application/json")
            .unwrap();
        assert!(messages.is_empty());
    }
}
