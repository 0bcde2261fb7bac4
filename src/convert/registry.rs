use super::rules::{default_rules, ConversionRule, FnRule};
use crate::error::{ConversionError, ConversionFailure};
use crate::reflect::{Reflect, Shape, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Ordered, immutable set of conversion rules.
///
/// Cloning is cheap: the rule list is shared. A registry never changes after
/// [`ConversionRegistryBuilder::build`], so it can be used from any number of
/// threads.
#[derive(Clone)]
pub struct ConversionRegistry {
    rules: Arc<[Arc<dyn ConversionRule>]>,
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionRegistry")
            .field("rules", &self.rule_names())
            .finish()
    }
}

impl ConversionRegistry {
    /// Registry with the default rules only.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> ConversionRegistryBuilder {
        ConversionRegistryBuilder {
            rules: Vec::new(),
            defaults: true,
        }
    }

    #[must_use]
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// First rule accepting `(from, to)`.
    #[must_use]
    pub fn find_rule(&self, from: &Shape, to: &Shape) -> Option<&dyn ConversionRule> {
        self.rules
            .iter()
            .find(|r| r.accepts(from, to))
            .map(|r| r.as_ref())
    }

    /// Coerce `value` into a value of shape `to`.
    ///
    /// A value that already has the destination shape is returned as is,
    /// without consulting any rule. Shape equality is structural, so it
    /// coincides with identity equality.
    pub fn convert_value(&self, value: Value, to: &Shape) -> Result<Value, ConversionError> {
        let from = value.shape();
        if from == *to {
            return Ok(value);
        }
        match self.find_rule(&from, to) {
            Some(rule) => rule.convert(self, value, to),
            None => {
                debug!(from = %from, to = %to, "No conversion rule accepts pair");
                Err(ConversionError::new(&from, to, ConversionFailure::NoRule))
            }
        }
    }

    /// Convert `value` into `dest`. `dest` is only written on success.
    pub fn convert<T: Reflect>(&self, value: Value, dest: &mut T) -> Result<(), ConversionError> {
        let converted = self.convert_value(value, &T::shape())?;
        *dest = T::from_value(converted)?;
        Ok(())
    }

    /// Convert one typed value into another.
    pub fn convert_from<S: Reflect, T: Reflect>(
        &self,
        src: &S,
        dest: &mut T,
    ) -> Result<(), ConversionError> {
        self.convert(src.to_value(), dest)
    }
}

/// Builder for [`ConversionRegistry`].
///
/// Caller rules are tried in insertion order, before the defaults.
pub struct ConversionRegistryBuilder {
    rules: Vec<Arc<dyn ConversionRule>>,
    defaults: bool,
}

impl ConversionRegistryBuilder {
    #[must_use]
    pub fn rule(mut self, rule: impl ConversionRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    #[must_use]
    pub fn rule_fn<A, C>(self, name: impl Into<String>, accepts: A, convert: C) -> Self
    where
        A: Fn(&Shape, &Shape) -> bool + Send + Sync + 'static,
        C: Fn(&ConversionRegistry, Value, &Shape) -> Result<Value, ConversionError>
            + Send
            + Sync
            + 'static,
    {
        self.rule(FnRule::new(name, accepts, convert))
    }

    /// Leave the built-in rules out.
    #[must_use]
    pub fn discard_defaults(mut self) -> Self {
        self.defaults = false;
        self
    }

    #[must_use]
    pub fn build(self) -> ConversionRegistry {
        let custom = self.rules.len();
        let mut rules = self.rules;
        if self.defaults {
            rules.extend(default_rules());
        }
        info!(
            custom_rules = custom,
            total_rules = rules.len(),
            defaults = self.defaults,
            "Conversion registry built"
        );
        ConversionRegistry {
            rules: rules.into(),
        }
    }
}
