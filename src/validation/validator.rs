//! Validator service.
//!
//! Constructed once at startup and shared by handle; it owns the locale
//! used for translated messages. Checks every declared field against its
//! rules and reports the first failing rule per field.

use crate::validation::locale::Locale;
use crate::validation::schema::{FieldValue, Params, Rule, Violation};

#[derive(Debug, Clone, Default)]
pub struct Validator {
    locale: Locale,
}

impl Validator {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Check `params` against its declared rules.
    pub fn validate<P: Params>(&self, params: &P) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();
        for field in P::FIELDS {
            let value = params.value(field.name);
            if let Some(rule) = field.rules.iter().find(|rule| !check(rule, &value)) {
                violations.push(
                    Violation::new(field.name, rule.tag())
                        .with_param(rule.param())
                        .with_value(value.to_string(), value.is_numeric()),
                );
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Locale message for `violation`, naming the field `field`.
    pub fn translate(&self, violation: &Violation, field: &str) -> String {
        self.locale.render(violation, field)
    }
}

fn check(rule: &Rule, value: &FieldValue<'_>) -> bool {
    match rule {
        Rule::Required => !value.is_zero(),
        // Absent optional values are only checked by `required`.
        _ if matches!(value, FieldValue::Missing) => true,
        Rule::Min(min) => measure(value).is_some_and(|n| n >= *min),
        Rule::Max(max) => measure(value).is_some_and(|n| n <= *max),
        Rule::Len(len) => measure(value).is_some_and(|n| n == *len as f64),
        Rule::Email => matches!(value, FieldValue::Str(s) if is_email(s)),
        Rule::OneOf(options) => {
            let rendered = value.to_string();
            options.iter().any(|option| *option == rendered)
        }
    }
}

/// Numbers compare by value, text by character count.
fn measure(value: &FieldValue<'_>) -> Option<f64> {
    match value {
        FieldValue::Str(s) => Some(s.chars().count() as f64),
        other => other.as_f64(),
    }
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
