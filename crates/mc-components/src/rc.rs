//! Compliant compartments: resistor–capacitor and resistor–inductor–capacitor.

use mc_core::Real;
use mc_graph::{ElementScope, Sharing};

use crate::common::{
    INDUCTANCE_EPS, capacitor_pressure, capacitor_pressure_rate, capacitor_volume,
    check_positive, inductor_flow_rate, resistor_flow, volume_rate,
};
use crate::error::ComponentResult;
use crate::traits::{Element, InitialCondition};

/// Grounded compliance with an outflow resistance.
///
/// `P_i' = (Q_i − Q_o)/C`, `V' = Q_i − Q_o`, `Q_o = (P_i − P_o)/R`.
#[derive(Debug, Clone)]
pub struct RcElement {
    name: String,
    pub r: Real,
    pub c: Real,
    pub v_ref: Real,
    pub initial: InitialCondition,
}

impl RcElement {
    pub fn new(name: impl Into<String>, r: Real, c: Real, v_ref: Real) -> Self {
        Self {
            name: name.into(),
            r,
            c,
            v_ref,
            initial: InitialCondition::default(),
        }
    }

    pub fn with_volume(mut self, v: Real) -> Self {
        self.initial.volume = Some(v);
        self
    }

    pub fn with_pressure(mut self, p: Real) -> Self {
        self.initial.pressure = Some(p);
        self
    }

    /// Compliance part shared with `RlcElement`: pressure and volume laws
    /// plus their initialization.
    fn configure_compliance(&self, scope: &mut ElementScope<'_>) -> ComponentResult<()> {
        self.initial.require(&self.name)?;
        check_positive(self.c, &self.name, "compliance")?;

        let (p_i, q_i, q_o, v) = (scope.p_in(), scope.q_in(), scope.q_out(), scope.volume());
        let (c, v_ref) = (self.c, self.v_ref);

        scope.set_differential(
            p_i,
            "grounded_capacitor_dpdt",
            move |_t: Real, y: &[Real]| capacitor_pressure_rate(y[0], y[1], c),
            &[q_i, q_o],
        )?;
        scope.set_differential(
            v,
            "volume_rate",
            |_t: Real, y: &[Real]| volume_rate(y[0], y[1]),
            &[q_i, q_o],
        )?;

        match self.initial.pressure {
            Some(p) => scope.set_initial_value(p_i, p)?,
            None => scope.set_init(
                p_i,
                "grounded_capacitor_pressure",
                move |_t: Real, y: &[Real]| capacitor_pressure(y[0], v_ref, c),
                &[v],
            )?,
        }
        match self.initial.volume {
            Some(vol) => scope.set_initial_value(v, vol)?,
            None => scope.set_init(
                v,
                "grounded_capacitor_volume",
                move |_t: Real, y: &[Real]| capacitor_volume(y[0], v_ref, c),
                &[p_i],
            )?,
        }
        Ok(())
    }
}

impl Element for RcElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn sharing(&self) -> Sharing {
        Sharing::Distinct
    }

    fn configure(&self, scope: &mut ElementScope<'_>) -> ComponentResult<()> {
        self.configure_compliance(scope)?;
        check_positive(self.r, &self.name, "resistance")?;
        let (p_i, p_o, q_o) = (scope.p_in(), scope.p_out(), scope.q_out());
        let r = self.r;
        scope.set_algebraic(
            q_o,
            "resistor_flow",
            move |_t: Real, y: &[Real]| resistor_flow(y[0], y[1], r),
            &[p_i, p_o],
        )?;
        Ok(())
    }
}

/// Compliance with an inertial outflow: `Q_o' = (P_i − P_o − R·Q_o)/L`.
///
/// A negligible inductance falls back to the purely resistive outflow of
/// `RcElement`.
#[derive(Debug, Clone)]
pub struct RlcElement {
    rc: RcElement,
    pub l: Real,
    q0: Option<Real>,
}

impl RlcElement {
    pub fn new(name: impl Into<String>, r: Real, c: Real, l: Real, v_ref: Real) -> Self {
        Self {
            rc: RcElement::new(name, r, c, v_ref),
            l,
            q0: None,
        }
    }

    pub fn with_volume(mut self, v: Real) -> Self {
        self.rc = self.rc.with_volume(v);
        self
    }

    pub fn with_pressure(mut self, p: Real) -> Self {
        self.rc = self.rc.with_pressure(p);
        self
    }

    /// Initial outflow of an inductive element; defaults to zero.
    pub fn with_flow(mut self, q: Real) -> Self {
        self.q0 = Some(q);
        self
    }

    pub fn is_inductive(&self) -> bool {
        self.l.abs() > INDUCTANCE_EPS
    }
}

impl Element for RlcElement {
    fn name(&self) -> &str {
        &self.rc.name
    }

    fn sharing(&self) -> Sharing {
        Sharing::Distinct
    }

    fn configure(&self, scope: &mut ElementScope<'_>) -> ComponentResult<()> {
        if !self.is_inductive() {
            return self.rc.configure(scope);
        }
        self.rc.configure_compliance(scope)?;
        check_positive(self.rc.r, &self.rc.name, "resistance")?;
        let (p_i, p_o, q_o) = (scope.p_in(), scope.p_out(), scope.q_out());
        let (r, l) = (self.rc.r, self.l);
        scope.set_differential(
            q_o,
            "inductor_flow_rate",
            move |_t: Real, y: &[Real]| inductor_flow_rate(y[0], y[1], y[2], r, l),
            &[p_i, p_o, q_o],
        )?;
        if let Some(q0) = self.q0 {
            scope.set_initial_value(q_o, q0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComponentError;
    use crate::traits::add_element;
    use mc_core::TimeGrid;
    use mc_graph::{Network, Role};

    fn net() -> Network {
        Network::new("t", TimeGrid::new(1, 1.0, 0.1).unwrap()).unwrap()
    }

    #[test]
    fn rc_roles_and_init() {
        let mut n = net();
        add_element(&mut n, &RcElement::new("rc", 2.0, 0.5, 1.0).with_volume(3.0)).unwrap();
        let p = n.quantity_by_name("rc_P_i").unwrap();
        assert_eq!(p.role(), Role::Differential);
        let init = p.init().unwrap();
        assert_eq!(init.inputs(), ["rc_V"]);
        assert_eq!(init.eval(0.0, &[3.0]), 4.0);
        assert_eq!(n.quantity_by_name("rc_V").unwrap().initial_value(), Some(3.0));
        let q = n.quantity_by_name("rc_Q_o").unwrap().update().unwrap();
        assert_eq!(q.eval(0.0, &[6.0, 2.0]), 2.0);
    }

    #[test]
    fn rc_pressure_only_initializes_volume() {
        let mut n = net();
        add_element(&mut n, &RcElement::new("rc", 1.0, 2.0, 5.0).with_pressure(1.5)).unwrap();
        let v = n.quantity_by_name("rc_V").unwrap();
        assert_eq!(v.init().unwrap().eval(0.0, &[1.5]), 8.0);
        assert!(n.quantity_by_name("rc_P_i").unwrap().init().is_none());
    }

    #[test]
    fn rc_without_initial_condition_fails() {
        let mut n = net();
        let err = add_element(&mut n, &RcElement::new("rc", 1.0, 1.0, 0.0)).unwrap_err();
        assert!(matches!(err, ComponentError::MissingInitialCondition { .. }));
    }

    #[test]
    fn rlc_outflow_is_differential_when_inductive() {
        let mut n = net();
        add_element(
            &mut n,
            &RlcElement::new("rlc", 1.0, 1.0, 0.5, 0.0).with_volume(1.0).with_flow(0.25),
        )
        .unwrap();
        let q = n.quantity_by_name("rlc_Q_o").unwrap();
        assert_eq!(q.role(), Role::Differential);
        assert_eq!(q.initial_value(), Some(0.25));
        // (2 - 1 - 1*0.5) / 0.5
        assert_eq!(q.update().unwrap().eval(0.0, &[2.0, 1.0, 0.5]), 1.0);
    }

    #[test]
    fn rlc_with_zero_inductance_is_rc() {
        let mut n = net();
        add_element(&mut n, &RlcElement::new("rlc", 1.0, 1.0, 0.0, 0.0).with_volume(1.0)).unwrap();
        assert_eq!(n.quantity_by_name("rlc_Q_o").unwrap().role(), Role::Algebraic);
    }
}
