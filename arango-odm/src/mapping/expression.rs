//! Templated collection and view names.
//!
//! A name may embed `{reference}` placeholders that are resolved against an
//! [`EvaluationContext`] installed by the application once its wiring is
//! complete. `{{` and `}}` produce literal braces. Names without
//! placeholders never need a context.

use dashmap::DashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use crate::errors::{ErrorKind, OdmError, OdmResult};

static REFERENCE_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$"));

/// A name/value lookup used to resolve template references.
pub trait EvaluationContext: Send + Sync {
    /// Returns the current value of `reference`, if known.
    fn lookup(&self, reference: &str) -> Option<String>;
}

/// An [`EvaluationContext`] backed by a concurrent map.
///
/// Values can be changed after the context has been installed; templated
/// names pick up the new value on their next evaluation.
#[derive(Default)]
pub struct MapEvaluationContext {
    values: DashMap<String, String>,
}

impl MapEvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, reference: &str, value: &str) -> Self {
        self.set(reference, value);
        self
    }

    pub fn set(&self, reference: &str, value: &str) {
        self.values.insert(reference.to_string(), value.to_string());
    }

    pub fn remove(&self, reference: &str) -> Option<String> {
        self.values.remove(reference).map(|(_, value)| value)
    }
}

impl EvaluationContext for MapEvaluationContext {
    fn lookup(&self, reference: &str) -> Option<String> {
        self.values.get(reference).map(|value| value.clone())
    }
}

impl<F> EvaluationContext for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn lookup(&self, reference: &str) -> Option<String> {
        self(reference)
    }
}

/// Late-bound slot for the evaluation context, shared by every descriptor
/// of one mapping context.
#[derive(Clone, Default)]
pub struct ContextHolder {
    inner: Atomic<Option<Arc<dyn EvaluationContext>>>,
}

impl ContextHolder {
    pub fn new() -> Self {
        ContextHolder {
            inner: atomic(None),
        }
    }

    /// Installs or replaces the evaluation context.
    pub fn install(&self, context: Arc<dyn EvaluationContext>) {
        self.inner.write_with(|slot| *slot = Some(context));
    }

    pub fn clear(&self) {
        self.inner.write_with(|slot| *slot = None);
    }

    pub fn current(&self) -> Option<Arc<dyn EvaluationContext>> {
        self.inner.read_with(|slot| slot.clone())
    }

    pub fn is_available(&self) -> bool {
        self.inner.read_with(|slot| slot.is_some())
    }
}

impl Debug for ContextHolder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextHolder")
            .field("available", &self.is_available())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Reference(String),
}

/// A compiled collection or view name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl NameTemplate {
    /// Compiles `raw` into literal and reference segments.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for unbalanced braces, nested or empty
    /// placeholders and references that are not valid names.
    pub fn compile(raw: &str) -> OdmResult<NameTemplate> {
        let pattern = REFERENCE_PATTERN.as_ref().map_err(|e| OdmError::from(e.clone()))?;
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut reference = String::new();
                    let mut closed = false;
                    for next in chars.by_ref() {
                        match next {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(invalid_template(raw, "nested placeholder")),
                            other => reference.push(other),
                        }
                    }
                    if !closed {
                        return Err(invalid_template(raw, "unterminated placeholder"));
                    }
                    let reference = reference.trim().to_string();
                    if !pattern.is_match(&reference) {
                        return Err(invalid_template(
                            raw,
                            &format!("invalid reference '{}'", reference),
                        ));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Reference(reference));
                }
                '}' => return Err(invalid_template(raw, "unmatched '}'")),
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(NameTemplate {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns true when the template has at least one placeholder.
    pub fn is_dynamic(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Reference(_)))
    }

    /// Returns the referenced names in order of appearance.
    pub fn references(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Reference(reference) => Some(reference.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Evaluates the template against the context currently installed in `holder`.
    ///
    /// The result is never cached: every call sees the latest context values.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedExpression` when the template is dynamic and no
    /// context is installed yet, or when the context cannot resolve a reference.
    pub fn evaluate(&self, holder: &ContextHolder) -> OdmResult<String> {
        if !self.is_dynamic() {
            return Ok(self.literal_text());
        }

        let context = holder.current().ok_or_else(|| {
            log::error!("No evaluation context available to resolve '{}'", self.raw);
            OdmError::new(
                &format!(
                    "Name '{}' requires an evaluation context, but none is available yet",
                    self.raw
                ),
                ErrorKind::UnresolvedExpression,
            )
        })?;
        self.evaluate_with(context.as_ref())
    }

    /// Evaluates the template against an explicit context.
    pub fn evaluate_with(&self, context: &dyn EvaluationContext) -> OdmResult<String> {
        let mut result = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => result.push_str(text),
                Segment::Reference(reference) => match context.lookup(reference) {
                    Some(value) => result.push_str(&value),
                    None => {
                        log::error!("Reference '{}' in '{}' cannot be resolved", reference, self.raw);
                        return Err(OdmError::new(
                            &format!(
                                "Reference '{}' in name '{}' cannot be resolved",
                                reference, self.raw
                            ),
                            ErrorKind::UnresolvedExpression,
                        ));
                    }
                },
            }
        }
        Ok(result)
    }

    fn literal_text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Reference(_) => "",
            })
            .collect()
    }
}

fn invalid_template(raw: &str, reason: &str) -> OdmError {
    log::error!("Invalid name template '{}': {}", raw, reason);
    OdmError::new(
        &format!("Invalid name template '{}': {}", raw, reason),
        ErrorKind::ConfigurationError,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_template_needs_no_context() {
        let template = NameTemplate::compile("products").unwrap();
        assert!(!template.is_dynamic());
        assert!(template.references().is_empty());
        assert_eq!(template.evaluate(&ContextHolder::new()).unwrap(), "products");
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        let template = NameTemplate::compile("a{{b}}c").unwrap();
        assert!(!template.is_dynamic());
        assert_eq!(template.evaluate(&ContextHolder::new()).unwrap(), "a{b}c");
    }

    #[test]
    fn test_dynamic_template_without_context_fails() {
        let template = NameTemplate::compile("orders-{tenant}").unwrap();
        assert!(template.is_dynamic());
        let err = template.evaluate(&ContextHolder::new()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnresolvedExpression);
    }

    #[test]
    fn test_dynamic_template_resolves_against_latest_values() {
        let template = NameTemplate::compile("orders-{tenant.name}-{region}").unwrap();
        assert_eq!(template.references(), vec!["tenant.name", "region"]);

        let context = Arc::new(
            MapEvaluationContext::new()
                .with("tenant.name", "acme")
                .with("region", "eu"),
        );
        let holder = ContextHolder::new();
        holder.install(context.clone());
        assert_eq!(template.evaluate(&holder).unwrap(), "orders-acme-eu");

        context.set("region", "us");
        assert_eq!(template.evaluate(&holder).unwrap(), "orders-acme-us");
    }

    #[test]
    fn test_missing_reference_fails() {
        let template = NameTemplate::compile("{missing}").unwrap();
        let holder = ContextHolder::new();
        holder.install(Arc::new(MapEvaluationContext::new()));
        let err = template.evaluate(&holder).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnresolvedExpression);
        assert!(err.message().contains("missing"));
    }

    #[test]
    fn test_closure_context() {
        let template = NameTemplate::compile("{suffix}").unwrap();
        let context = |reference: &str| (reference == "suffix").then(|| "v2".to_string());
        assert_eq!(template.evaluate_with(&context).unwrap(), "v2");
    }

    #[test]
    fn test_invalid_templates_are_configuration_errors() {
        for raw in ["{unterminated", "bad}", "{a{b}}", "{}", "{1abc}", "{a b}"] {
            let err = NameTemplate::compile(raw).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ConfigurationError, "template {}", raw);
        }
    }

    #[test]
    fn test_holder_clear_and_replace() {
        let holder = ContextHolder::new();
        assert!(!holder.is_available());
        holder.install(Arc::new(MapEvaluationContext::new().with("x", "1")));
        let shared = holder.clone();
        assert!(shared.is_available());
        holder.clear();
        assert!(!shared.is_available());
    }
}
