//! Quantities and their update rules.

use std::fmt;
use std::sync::Arc;

use mc_core::Real;

use crate::error::{GraphError, GraphResult};

/// A closed-form relationship evaluated at one time point.
///
/// `args` holds the values of the equation's declared inputs, in declaration
/// order. `t` is the time relative to the start of the current cycle.
pub trait Law: Send + Sync {
    fn eval(&self, t: Real, args: &[Real]) -> Real;
}

impl<F> Law for F
where
    F: Fn(Real, &[Real]) -> Real + Send + Sync,
{
    fn eval(&self, t: Real, args: &[Real]) -> Real {
        self(t, args)
    }
}

/// A law bound to the canonical names of its inputs.
#[derive(Clone)]
pub struct Equation {
    label: &'static str,
    law: Arc<dyn Law>,
    inputs: Vec<String>,
}

impl Equation {
    pub fn new(label: &'static str, law: impl Law + 'static, inputs: Vec<String>) -> Self {
        Self {
            label,
            law: Arc::new(law),
            inputs,
        }
    }

    /// Human-readable law name, used in logs.
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn law(&self) -> &Arc<dyn Law> {
        &self.law
    }

    pub fn eval(&self, t: Real, args: &[Real]) -> Real {
        self.law.eval(t, args)
    }

    /// Replace every occurrence of input `old` by `new`.
    pub(crate) fn rename_input(&mut self, old: &str, new: &str) {
        for input in self.inputs.iter_mut().filter(|i| i.as_str() == old) {
            *input = new.to_string();
        }
    }
}

impl fmt::Debug for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Equation")
            .field("label", &self.label)
            .field("inputs", &self.inputs)
            .finish()
    }
}

/// How a quantity is advanced in time. Differential and algebraic rules are
/// mutually exclusive by construction.
#[derive(Debug, Clone, Default)]
pub enum Rule {
    #[default]
    Inert,
    Differential(Equation),
    Algebraic(Equation),
}

/// Solver-facing classification of a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Integrated from a rate-of-change law (principal).
    Differential,
    /// Computed from other quantities at the same instant (secondary).
    Algebraic,
    /// No update rule, but computed once at the first time step.
    InitOnly,
    /// Never updated; keeps its first-row value.
    Inert,
}

/// A named scalar time series. Values live in the owning network's data table.
#[derive(Debug, Clone)]
pub struct Quantity {
    name: String,
    rule: Rule,
    init: Option<Equation>,
    initial_value: Option<Real>,
}

impl Quantity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule: Rule::Inert,
            init: None,
            initial_value: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn init(&self) -> Option<&Equation> {
        self.init.as_ref()
    }

    pub fn initial_value(&self) -> Option<Real> {
        self.initial_value
    }

    /// True when the quantity has a differential or algebraic update rule.
    pub fn is_defined(&self) -> bool {
        !matches!(self.rule, Rule::Inert)
    }

    pub fn role(&self) -> Role {
        match (&self.rule, &self.init) {
            (Rule::Differential(_), _) => Role::Differential,
            (Rule::Algebraic(_), _) => Role::Algebraic,
            (Rule::Inert, Some(_)) => Role::InitOnly,
            (Rule::Inert, None) => Role::Inert,
        }
    }

    /// The update equation, if any.
    pub fn update(&self) -> Option<&Equation> {
        match &self.rule {
            Rule::Differential(eq) | Rule::Algebraic(eq) => Some(eq),
            Rule::Inert => None,
        }
    }

    pub fn set_differential(&mut self, eq: Equation) -> GraphResult<()> {
        if matches!(self.rule, Rule::Algebraic(_)) {
            return Err(GraphError::ConflictingRule {
                quantity: self.name.clone(),
            });
        }
        self.rule = Rule::Differential(eq);
        Ok(())
    }

    pub fn set_algebraic(&mut self, eq: Equation) -> GraphResult<()> {
        if matches!(self.rule, Rule::Differential(_)) {
            return Err(GraphError::ConflictingRule {
                quantity: self.name.clone(),
            });
        }
        self.rule = Rule::Algebraic(eq);
        Ok(())
    }

    pub fn set_init(&mut self, eq: Equation) {
        self.init = Some(eq);
    }

    pub(crate) fn take_init(&mut self) -> Option<Equation> {
        self.init.take()
    }

    pub(crate) fn take_rule(&mut self) -> Rule {
        std::mem::take(&mut self.rule)
    }

    pub fn set_initial_value(&mut self, value: Real) {
        self.initial_value = Some(value);
    }

    /// Rewrite references to input `old` (in both update and init equations).
    pub(crate) fn rename_input(&mut self, old: &str, new: &str) {
        match &mut self.rule {
            Rule::Differential(eq) | Rule::Algebraic(eq) => eq.rename_input(old, new),
            Rule::Inert => {}
        }
        if let Some(eq) = &mut self.init {
            eq.rename_input(old, new);
        }
    }
}
