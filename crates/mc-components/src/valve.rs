//! Valve models.
//!
//! All valves share one flow quantity between inflow and outflow and compute
//! it from the pressure drop across the valve.

use mc_core::Real;
use mc_graph::{ElementScope, Sharing};

use crate::common::{check_positive, relu, softplus};
use crate::error::{ComponentError, ComponentResult};
use crate::traits::Element;

/// Rectifier used by the non-ideal diode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Opening {
    /// Sharp: `max(Δp, 0)`.
    Relu,
    /// Smooth: `ln(1 + e^{αΔp})/α`.
    Softplus { alpha: Real },
}

impl Opening {
    pub fn apply(&self, dp: Real) -> Real {
        match *self {
            Opening::Relu => relu(dp),
            Opening::Softplus { alpha } => softplus(dp, alpha),
        }
    }
}

/// Pressure-drop to flow relationship of a static valve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValveLaw {
    /// `Q = opening(Δp)/R`; no backflow.
    NonIdeal { r: Real, opening: Opening },
    /// Different resistances for forward and regurgitant flow.
    Leaky { r_open: Real, r_back: Real },
    /// Orifice law `Q = CQ·√max(Δp, 0)`.
    Bernoulli { cq: Real },
}

impl ValveLaw {
    pub fn flow(&self, p_in: Real, p_out: Real) -> Real {
        let dp = p_in - p_out;
        match *self {
            ValveLaw::NonIdeal { r, opening } => opening.apply(dp) / r,
            ValveLaw::Leaky { r_open, r_back } => {
                if p_in > p_out {
                    dp / r_open
                } else {
                    dp / r_back
                }
            }
            ValveLaw::Bernoulli { cq } => cq * relu(dp).sqrt(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ValveLaw::NonIdeal { .. } => "non_ideal_diode_flow",
            ValveLaw::Leaky { .. } => "leaky_diode_flow",
            ValveLaw::Bernoulli { .. } => "simple_bernoulli_flow",
        }
    }

    fn validate(&self, element: &str) -> ComponentResult<()> {
        match *self {
            ValveLaw::NonIdeal { r, opening } => {
                check_positive(r, element, "valve resistance")?;
                if let Opening::Softplus { alpha } = opening {
                    check_positive(alpha, element, "softplus alpha")?;
                }
                Ok(())
            }
            ValveLaw::Leaky { r_open, r_back } => {
                check_positive(r_open, element, "forward resistance")?;
                check_positive(r_back, element, "regurgitant resistance")
            }
            ValveLaw::Bernoulli { cq } => check_positive(cq, element, "flow coefficient"),
        }
    }
}

/// Static valve: the flow is an algebraic function of the pressure drop.
#[derive(Debug, Clone)]
pub struct Valve {
    name: String,
    pub law: ValveLaw,
}

impl Valve {
    pub fn new(name: impl Into<String>, law: ValveLaw) -> Self {
        Self {
            name: name.into(),
            law,
        }
    }
}

impl Element for Valve {
    fn name(&self) -> &str {
        &self.name
    }

    fn sharing(&self) -> Sharing {
        Sharing::SharedFlow
    }

    fn configure(&self, scope: &mut ElementScope<'_>) -> ComponentResult<()> {
        self.law.validate(&self.name)?;
        let (p_i, p_o, q) = (scope.p_in(), scope.p_out(), scope.q_in());
        let law = self.law;
        scope.set_algebraic(
            q,
            law.label(),
            move |_t: Real, y: &[Real]| law.flow(y[0], y[1]),
            &[p_i, p_o],
        )?;
        Ok(())
    }
}

/// Valve with a dynamic opening state `φ ∈ [0, 1]` (Mynard et al.).
///
/// `φ' = (1−φ)·K_o·Δp` while opening, `φ·K_c·Δp` while closing;
/// `Q = CQ·((1−RRA)·φ + RRA)·sign(Δp)·√|Δp|`.
#[derive(Debug, Clone)]
pub struct MynardValve {
    name: String,
    pub k_c: Real,
    pub k_o: Real,
    pub cq: Real,
    /// Relative regurgitant area of the closed valve.
    pub rra: Real,
    pub phi0: Real,
}

impl MynardValve {
    /// Suffix of the opening-state quantity.
    pub const PHI: &'static str = "PHI";

    pub fn new(name: impl Into<String>, k_c: Real, k_o: Real, cq: Real) -> Self {
        Self {
            name: name.into(),
            k_c,
            k_o,
            cq,
            rra: 0.0,
            phi0: 0.0,
        }
    }

    pub fn with_regurgitant_area(mut self, rra: Real) -> Self {
        self.rra = rra;
        self
    }

    pub fn with_opening(mut self, phi0: Real) -> Self {
        self.phi0 = phi0;
        self
    }

    pub fn flow(cq: Real, rra: Real, p_in: Real, p_out: Real, phi: Real) -> Real {
        let dp = p_in - p_out;
        cq * ((1.0 - rra) * phi + rra) * dp.signum() * dp.abs().sqrt()
    }

    pub fn phi_rate(k_o: Real, k_c: Real, p_in: Real, p_out: Real, phi: Real) -> Real {
        let dp = p_in - p_out;
        if dp > 0.0 {
            (1.0 - phi) * k_o * dp
        } else {
            phi * k_c * dp
        }
    }
}

impl Element for MynardValve {
    fn name(&self) -> &str {
        &self.name
    }

    fn sharing(&self) -> Sharing {
        Sharing::SharedFlow
    }

    fn configure(&self, scope: &mut ElementScope<'_>) -> ComponentResult<()> {
        check_positive(self.cq, &self.name, "flow coefficient")?;
        check_positive(self.k_o, &self.name, "opening rate")?;
        check_positive(self.k_c, &self.name, "closing rate")?;
        if !(0.0..=1.0).contains(&self.rra) {
            return Err(ComponentError::NonPhysical {
                element: self.name.clone(),
                what: "relative regurgitant area",
            });
        }

        let (p_i, p_o, q) = (scope.p_in(), scope.p_out(), scope.q_in());
        let phi = scope.internal(Self::PHI)?;
        let (cq, rra, k_o, k_c) = (self.cq, self.rra, self.k_o, self.k_c);

        scope.set_algebraic(
            q,
            "mynard_valve_flow",
            move |_t: Real, y: &[Real]| Self::flow(cq, rra, y[0], y[1], y[2]),
            &[p_i, p_o, phi],
        )?;
        scope.set_differential(
            phi,
            "mynard_phi_law",
            move |_t: Real, y: &[Real]| Self::phi_rate(k_o, k_c, y[0], y[1], y[2]),
            &[p_i, p_o, phi],
        )?;
        scope.set_initial_value(phi, self.phi0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::add_element;
    use mc_core::TimeGrid;
    use mc_graph::{Network, Role};

    #[test]
    fn non_ideal_blocks_backflow() {
        let law = ValveLaw::NonIdeal {
            r: 2.0,
            opening: Opening::Relu,
        };
        assert_eq!(law.flow(10.0, 4.0), 3.0);
        assert_eq!(law.flow(4.0, 10.0), 0.0);
    }

    #[test]
    fn softplus_valve_leaks_slightly() {
        let law = ValveLaw::NonIdeal {
            r: 1.0,
            opening: Opening::Softplus { alpha: 10.0 },
        };
        let back = law.flow(0.0, 1.0);
        assert!(back > 0.0 && back < 1e-4);
    }

    #[test]
    fn leaky_uses_backflow_resistance() {
        let law = ValveLaw::Leaky {
            r_open: 1.0,
            r_back: 10.0,
        };
        assert_eq!(law.flow(2.0, 1.0), 1.0);
        assert_eq!(law.flow(1.0, 2.0), -0.1);
    }

    #[test]
    fn bernoulli_square_root() {
        let law = ValveLaw::Bernoulli { cq: 2.0 };
        assert_eq!(law.flow(9.0, 0.0), 6.0);
        assert_eq!(law.flow(0.0, 9.0), 0.0);
    }

    #[test]
    fn mynard_laws() {
        assert_eq!(MynardValve::flow(1.0, 0.0, 4.0, 0.0, 1.0), 2.0);
        assert_eq!(MynardValve::flow(1.0, 0.1, 0.0, 4.0, 0.0), -0.2);
        assert_eq!(MynardValve::phi_rate(2.0, 3.0, 1.0, 0.0, 0.25), 1.5);
        assert_eq!(MynardValve::phi_rate(2.0, 3.0, 0.0, 1.0, 0.5), -1.5);
    }

    #[test]
    fn mynard_registers_opening_state() {
        let mut n = Network::new("t", TimeGrid::new(1, 1.0, 0.5).unwrap()).unwrap();
        add_element(&mut n, &MynardValve::new("mv", 0.1, 0.1, 1.0).with_opening(0.5)).unwrap();
        let phi = n.quantity_by_name("mv_PHI").unwrap();
        assert_eq!(phi.role(), Role::Differential);
        assert_eq!(phi.initial_value(), Some(0.5));
        assert_eq!(n.quantity_by_name("mv_Q").unwrap().role(), Role::Algebraic);
    }

    #[test]
    fn valve_configures_shared_flow() {
        let mut n = Network::new("t", TimeGrid::new(1, 1.0, 0.5).unwrap()).unwrap();
        let law = ValveLaw::Bernoulli { cq: 1.0 };
        add_element(&mut n, &Valve::new("av", law)).unwrap();
        let q = n.quantity_by_name("av_Q").unwrap();
        assert_eq!(q.update().unwrap().inputs(), ["av_P_i", "av_P_o"]);
    }
}
