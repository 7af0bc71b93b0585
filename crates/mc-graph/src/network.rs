//! The network: quantity arena, canonical registry and data table.
//!
//! Quantities are arena-allocated and addressed by `QuantityId`. Elements hold
//! ids, never values. `connect` merges two boundary quantities into one slot
//! and rewrites every reference (element boundaries and equation inputs) to the
//! survivor, so after assembly each canonical name maps to exactly one
//! quantity and exactly one table column.

use std::collections::HashMap;

use mc_core::{ElementId, QuantityId, Real, TimeGrid};

use crate::error::{GraphError, GraphResult, LinkKind};
use crate::quantity::{Quantity, Role, Rule};
use crate::scope::ElementScope;
use crate::table::DataTable;

/// Which inflow/outflow pairs of an element are the same quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sharing {
    /// Separate inflow/outflow pressure and flow (compartments).
    #[default]
    Distinct,
    /// One pressure for both sides (chambers).
    SharedPressure,
    /// One flow for both sides (valves, resistors).
    SharedFlow,
}

/// The five canonical boundary quantities of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub p_in: QuantityId,
    pub p_out: QuantityId,
    pub q_in: QuantityId,
    pub q_out: QuantityId,
    pub volume: QuantityId,
}

impl Boundary {
    fn ids_mut(&mut self) -> [&mut QuantityId; 5] {
        [
            &mut self.p_in,
            &mut self.p_out,
            &mut self.q_in,
            &mut self.q_out,
            &mut self.volume,
        ]
    }
}

/// Registry entry for one element.
#[derive(Debug, Clone)]
pub struct ElementEntry {
    pub name: String,
    pub sharing: Sharing,
    pub boundary: Boundary,
    /// Extra element-owned quantities (e.g. valve opening state).
    pub internals: Vec<QuantityId>,
}

#[derive(Debug, Clone)]
pub struct Network {
    name: String,
    grid: TimeGrid,
    quantities: Vec<Option<Quantity>>,
    registry: HashMap<String, QuantityId>,
    elements: Vec<ElementEntry>,
    table: DataTable,
}

impl Network {
    pub fn new(name: impl Into<String>, grid: TimeGrid) -> GraphResult<Self> {
        grid.validate()?;
        Ok(Self {
            name: name.into(),
            table: DataTable::new(grid.times()),
            grid,
            quantities: Vec::new(),
            registry: HashMap::new(),
            elements: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Add a quantity with a zero-filled column.
    pub fn register(&mut self, quantity: Quantity) -> GraphResult<QuantityId> {
        if self.registry.contains_key(quantity.name()) {
            return Err(GraphError::DuplicateName {
                name: quantity.name().to_string(),
            });
        }
        let id = QuantityId::from_slot(self.quantities.len());
        let col = self.table.add_column(quantity.name());
        if let Some(v) = quantity.initial_value() {
            self.table.set(0, col, v);
        }
        self.registry.insert(quantity.name().to_string(), id);
        self.quantities.push(Some(quantity));
        Ok(id)
    }

    pub fn quantity(&self, id: QuantityId) -> GraphResult<&Quantity> {
        self.quantities
            .get(id.slot())
            .and_then(Option::as_ref)
            .ok_or(GraphError::StaleQuantity { id })
    }

    pub(crate) fn quantity_mut(&mut self, id: QuantityId) -> GraphResult<&mut Quantity> {
        self.quantities
            .get_mut(id.slot())
            .and_then(Option::as_mut)
            .ok_or(GraphError::StaleQuantity { id })
    }

    pub fn id_of(&self, name: &str) -> Option<QuantityId> {
        self.registry.get(name).copied()
    }

    pub fn quantity_by_name(&self, name: &str) -> GraphResult<&Quantity> {
        let id = self.id_of(name).ok_or_else(|| GraphError::UnknownQuantity {
            name: name.to_string(),
        })?;
        self.quantity(id)
    }

    /// Canonical names in table column order.
    pub fn all_quantity_names(&self) -> &[String] {
        self.table.names()
    }

    /// `(name, quantity)` pairs in table column order.
    pub fn quantity_registry(&self) -> impl Iterator<Item = (&str, &Quantity)> + '_ {
        self.table.names().iter().filter_map(move |name| {
            let id = self.registry.get(name)?;
            let q = self.quantities.get(id.slot())?.as_ref()?;
            Some((name.as_str(), q))
        })
    }

    /// Number of quantities per role (diagnostics).
    pub fn role_counts(&self) -> HashMap<Role, usize> {
        let mut counts = HashMap::new();
        for (_, q) in self.quantity_registry() {
            *counts.entry(q.role()).or_insert(0) += 1;
        }
        counts
    }

    pub fn data_table(&self) -> &DataTable {
        &self.table
    }

    pub fn data_table_mut(&mut self) -> &mut DataTable {
        &mut self.table
    }

    /// Zero the table over the full horizon and re-seed row 0 from the
    /// quantities' initial values.
    pub fn reset_table(&mut self) {
        self.table.reset(self.grid.times());
        for (slot, q) in self.quantities.iter().enumerate() {
            let Some(q) = q else { continue };
            if let (Some(v), Some(col)) = (q.initial_value(), self.table.column_index(q.name())) {
                self.table.set(0, col, v);
            }
            debug_assert_eq!(self.registry.get(q.name()).map(|id| id.slot()), Some(slot));
        }
    }

    /// Seed the first-row value of a quantity.
    pub fn set_initial_value(&mut self, id: QuantityId, value: Real) -> GraphResult<()> {
        let q = self.quantity_mut(id)?;
        q.set_initial_value(value);
        let name = q.name().to_string();
        if let Some(col) = self.table.column_index(&name) {
            self.table.set(0, col, value);
        }
        Ok(())
    }

    /// Give a quantity a new canonical name, rewriting every equation input
    /// that referred to the old one.
    pub fn rename(&mut self, id: QuantityId, new_name: &str) -> GraphResult<()> {
        let old = self.quantity(id)?.name().to_string();
        if old == new_name {
            return Ok(());
        }
        if self.registry.contains_key(new_name) {
            return Err(GraphError::DuplicateName {
                name: new_name.to_string(),
            });
        }
        self.quantity_mut(id)?.set_name(new_name);
        self.registry.remove(&old);
        self.registry.insert(new_name.to_string(), id);
        self.table.rename_column(&old, new_name);
        for q in self.quantities.iter_mut().flatten() {
            q.rename_input(&old, new_name);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------

    /// Create the boundary quantities of a new element.
    ///
    /// Local names are `<element>_P_i`, `<element>_P_o`, `<element>_Q_i`,
    /// `<element>_Q_o` and `<element>_V`; a shared pair is named `<element>_P`
    /// or `<element>_Q`.
    pub fn add_element(&mut self, name: &str, sharing: Sharing) -> GraphResult<ElementId> {
        let (p_in, p_out) = if sharing == Sharing::SharedPressure {
            let p = self.register(Quantity::new(format!("{name}_P")))?;
            (p, p)
        } else {
            (
                self.register(Quantity::new(format!("{name}_P_i")))?,
                self.register(Quantity::new(format!("{name}_P_o")))?,
            )
        };
        let (q_in, q_out) = if sharing == Sharing::SharedFlow {
            let q = self.register(Quantity::new(format!("{name}_Q")))?;
            (q, q)
        } else {
            (
                self.register(Quantity::new(format!("{name}_Q_i")))?,
                self.register(Quantity::new(format!("{name}_Q_o")))?,
            )
        };
        let volume = self.register(Quantity::new(format!("{name}_V")))?;

        let id = ElementId::from_slot(self.elements.len());
        self.elements.push(ElementEntry {
            name: name.to_string(),
            sharing,
            boundary: Boundary {
                p_in,
                p_out,
                q_in,
                q_out,
                volume,
            },
            internals: Vec::new(),
        });
        Ok(id)
    }

    /// Create (or return the existing) element-owned quantity `<element>_<suffix>`.
    pub fn add_internal(&mut self, element: ElementId, suffix: &str) -> GraphResult<QuantityId> {
        let entry = self.element(element)?;
        let name = format!("{}_{}", entry.name, suffix);
        if let Some(&existing) = entry
            .internals
            .iter()
            .find(|&&id| self.quantity(id).map(|q| q.name() == name).unwrap_or(false))
        {
            return Ok(existing);
        }
        let id = self.register(Quantity::new(name))?;
        self.element_mut(element)?.internals.push(id);
        Ok(id)
    }

    pub fn element(&self, id: ElementId) -> GraphResult<&ElementEntry> {
        self.elements
            .get(id.slot())
            .ok_or(GraphError::UnknownElement { id })
    }

    fn element_mut(&mut self, id: ElementId) -> GraphResult<&mut ElementEntry> {
        self.elements
            .get_mut(id.slot())
            .ok_or(GraphError::UnknownElement { id })
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &ElementEntry)> + '_ {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| (ElementId::from_slot(i), e))
    }

    pub fn element_by_name(&self, name: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| e.name == name)
            .map(ElementId::from_slot)
    }

    /// Mutable view used by an element to declare its equations.
    pub fn scope(&mut self, element: ElementId) -> GraphResult<ElementScope<'_>> {
        let entry = self.element(element)?;
        let (boundary, name) = (entry.boundary, entry.name.clone());
        Ok(ElementScope::new(self, element, boundary, name))
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Unify the outflow side of `upstream` with the inflow side of
    /// `downstream`, for pressure and flow independently.
    ///
    /// Without a label the side that already has an update rule wins
    /// (upstream first); if neither has one the connection is ambiguous.
    /// With a label both sides are forced onto one quantity, which is then
    /// registered under that label.
    pub fn connect(
        &mut self,
        upstream: ElementId,
        downstream: ElementId,
        pressure: Option<&str>,
        flow: Option<&str>,
    ) -> GraphResult<()> {
        let up = self.element(upstream)?.boundary;
        let down = self.element(downstream)?.boundary;
        // Both links are checked before either is made.
        self.check_link(upstream, downstream, up.p_out, down.p_in, LinkKind::Pressure, pressure)?;
        self.check_link(upstream, downstream, up.q_out, down.q_in, LinkKind::Flow, flow)?;
        if let (Some(p), Some(q)) = (pressure, flow)
            && p == q
        {
            return Err(GraphError::DuplicateName { name: p.to_string() });
        }

        self.link(upstream, downstream, up.p_out, down.p_in, LinkKind::Pressure, pressure)?;
        // Re-read: the pressure merge may have rewritten boundary ids.
        let up = self.element(upstream)?.boundary;
        let down = self.element(downstream)?.boundary;
        self.link(upstream, downstream, up.q_out, down.q_in, LinkKind::Flow, flow)?;
        Ok(())
    }

    fn link(
        &mut self,
        upstream: ElementId,
        downstream: ElementId,
        out_id: QuantityId,
        in_id: QuantityId,
        kind: LinkKind,
        label: Option<&str>,
    ) -> GraphResult<()> {
        let keep = if out_id == in_id {
            out_id
        } else if self.quantity(out_id)?.is_defined() {
            self.merge(out_id, in_id)?;
            out_id
        } else if self.quantity(in_id)?.is_defined() {
            self.merge(in_id, out_id)?;
            in_id
        } else if label.is_some() {
            self.merge(out_id, in_id)?;
            out_id
        } else {
            return Err(self.ambiguous(upstream, downstream, kind)?);
        };
        if let Some(label) = label {
            self.rename(keep, label)?;
        }
        Ok(())
    }

    /// Return the error `link` would fail with, without touching the network.
    fn check_link(
        &self,
        upstream: ElementId,
        downstream: ElementId,
        out_id: QuantityId,
        in_id: QuantityId,
        kind: LinkKind,
        label: Option<&str>,
    ) -> GraphResult<()> {
        if out_id != in_id
            && label.is_none()
            && !self.quantity(out_id)?.is_defined()
            && !self.quantity(in_id)?.is_defined()
        {
            return Err(self.ambiguous(upstream, downstream, kind)?);
        }
        if let Some(label) = label
            && self
                .registry
                .get(label)
                .is_some_and(|&id| id != out_id && id != in_id)
        {
            return Err(GraphError::DuplicateName {
                name: label.to_string(),
            });
        }
        Ok(())
    }

    fn ambiguous(
        &self,
        upstream: ElementId,
        downstream: ElementId,
        kind: LinkKind,
    ) -> GraphResult<GraphError> {
        Ok(GraphError::AmbiguousConnection {
            upstream: self.element(upstream)?.name.clone(),
            downstream: self.element(downstream)?.name.clone(),
            kind,
        })
    }

    /// Fold quantity `drop` into `keep`. References to `drop` are redirected,
    /// its column and registry entry are removed and its slot is emptied.
    fn merge(&mut self, keep: QuantityId, drop: QuantityId) -> GraphResult<()> {
        let keep_name = self.quantity(keep)?.name().to_string();
        let mut dropped = self
            .quantities
            .get_mut(drop.slot())
            .and_then(Option::take)
            .ok_or(GraphError::StaleQuantity { id: drop })?;
        let drop_name = dropped.name().to_string();

        let dropped_rule = dropped.take_rule();
        if !matches!(dropped_rule, Rule::Inert) {
            tracing::warn!(
                kept = %keep_name,
                discarded = %drop_name,
                "both sides of a connection define the shared quantity; keeping the first"
            );
        }
        let dropped_init = dropped.take_init();
        let dropped_value = dropped.initial_value();
        {
            let kept = self.quantity_mut(keep)?;
            if kept.init().is_none() {
                if let Some(eq) = dropped_init {
                    kept.set_init(eq);
                }
            }
            if kept.initial_value().is_none() {
                if let Some(v) = dropped_value {
                    kept.set_initial_value(v);
                }
            }
        }
        let kept_value = self.quantity(keep)?.initial_value();
        if let (Some(v), Some(col)) = (kept_value, self.table.column_index(&keep_name)) {
            self.table.set(0, col, v);
        }

        self.registry.remove(&drop_name);
        self.table.remove_column(&drop_name);
        for entry in &mut self.elements {
            for id in entry.boundary.ids_mut() {
                if *id == drop {
                    *id = keep;
                }
            }
            for id in &mut entry.internals {
                if *id == drop {
                    *id = keep;
                }
            }
        }
        for q in self.quantities.iter_mut().flatten() {
            q.rename_input(&drop_name, &keep_name);
        }
        tracing::debug!(kept = %keep_name, merged = %drop_name, "merged boundary quantities");
        Ok(())
    }
}
