//! Time-varying elastance chambers (atria and ventricles).
//!
//! Chambers share one pressure between inflow and outflow. Their elastance
//! is blended between an active and a passive law by an `Activation`.

use mc_core::Real;
use mc_graph::{ElementScope, Sharing};

use crate::activation::Activation;
use crate::common::{check_positive, volume_rate};
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{Element, InitialCondition};

/// Declare `V' = Q_i − Q_o` on the chamber volume.
fn declare_volume_rate(scope: &mut ElementScope<'_>) -> ComponentResult<()> {
    let (q_i, q_o, v) = (scope.q_in(), scope.q_out(), scope.volume());
    scope.set_differential(
        v,
        "volume_rate",
        |_t: Real, y: &[Real]| volume_rate(y[0], y[1]),
        &[q_i, q_o],
    )?;
    Ok(())
}

/// Linear active and passive laws: `P = E(t)·(V − V_ref)`.
#[derive(Debug, Clone)]
pub struct ConstantElastanceChamber {
    name: String,
    pub e_pas: Real,
    pub e_act: Real,
    pub v_ref: Real,
    pub activation: Activation,
    pub initial: InitialCondition,
}

impl ConstantElastanceChamber {
    pub fn new(
        name: impl Into<String>,
        e_pas: Real,
        e_act: Real,
        v_ref: Real,
        activation: Activation,
    ) -> Self {
        Self {
            name: name.into(),
            e_pas,
            e_act,
            v_ref,
            activation,
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

    pub fn elastance(e_pas: Real, e_act: Real, a: Real) -> Real {
        a * e_act + (1.0 - a) * e_pas
    }
}

impl Element for ConstantElastanceChamber {
    fn name(&self) -> &str {
        &self.name
    }

    fn sharing(&self) -> Sharing {
        Sharing::SharedPressure
    }

    fn configure(&self, scope: &mut ElementScope<'_>) -> ComponentResult<()> {
        self.initial.require(&self.name)?;
        check_positive(self.e_pas, &self.name, "passive elastance")?;
        check_positive(self.e_act, &self.name, "active elastance")?;

        let (p, q_i, q_o, v) = (scope.p_in(), scope.q_in(), scope.q_out(), scope.volume());
        let (e_pas, e_act, v_ref, act) = (self.e_pas, self.e_act, self.v_ref, self.activation);
        let elastance = move |t: Real| Self::elastance(e_pas, e_act, act.eval(t));

        declare_volume_rate(scope)?;
        scope.set_differential(
            p,
            "constant_elastance_dpdt",
            move |t: Real, y: &[Real]| {
                let de_dt = (e_act - e_pas) * act.derivative(t);
                de_dt * (y[0] - v_ref) + elastance(t) * (y[1] - y[2])
            },
            &[v, q_i, q_o],
        )?;

        match self.initial.pressure {
            Some(p0) => scope.set_initial_value(p, p0)?,
            None => scope.set_init(
                p,
                "chamber_pressure",
                move |t: Real, y: &[Real]| elastance(t) * (y[0] - v_ref),
                &[v],
            )?,
        }
        match self.initial.volume {
            Some(v0) => scope.set_initial_value(v, v0)?,
            None => scope.set_init(
                v,
                "chamber_volume",
                move |t: Real, y: &[Real]| v_ref + y[0] / elastance(t),
                &[p],
            )?,
        }
        Ok(())
    }
}

/// Linear active law with an exponential passive law
/// `P_pas = E_pas·(e^{k(V − V_ref)} − 1)`.
#[derive(Debug, Clone)]
pub struct MixedElastanceChamber {
    name: String,
    pub e_pas: Real,
    pub e_act: Real,
    pub k_pas: Real,
    pub v_ref: Real,
    pub activation: Activation,
    pub initial: InitialCondition,
}

#[derive(Debug, Clone, Copy)]
struct MixedLaw {
    e_pas: Real,
    e_act: Real,
    k_pas: Real,
    v_ref: Real,
    activation: Activation,
}

impl MixedLaw {
    fn active_p(&self, v: Real) -> Real {
        self.e_act * (v - self.v_ref)
    }

    fn passive_p(&self, v: Real) -> Real {
        self.e_pas * ((self.k_pas * (v - self.v_ref)).exp() - 1.0)
    }

    fn pressure(&self, t: Real, v: Real) -> Real {
        let a = self.activation.eval(t);
        a * self.active_p(v) + (1.0 - a) * self.passive_p(v)
    }

    fn pressure_rate(&self, t: Real, v: Real, q_i: Real, q_o: Real) -> Real {
        let a = self.activation.eval(t);
        let da = self.activation.derivative(t);
        let dv = q_i - q_o;
        let active = self.e_act * dv;
        let passive = self.e_pas * self.k_pas * (self.k_pas * (v - self.v_ref)).exp() * dv;
        da * (self.active_p(v) - self.passive_p(v)) + a * active + (1.0 - a) * passive
    }

    /// Volume from pressure through the passive law alone.
    fn volume(&self, p: Real) -> Real {
        self.v_ref + (p / self.e_pas + 1.0).ln() / self.k_pas
    }
}

impl MixedElastanceChamber {
    pub fn new(
        name: impl Into<String>,
        e_pas: Real,
        e_act: Real,
        k_pas: Real,
        v_ref: Real,
        activation: Activation,
    ) -> Self {
        Self {
            name: name.into(),
            e_pas,
            e_act,
            k_pas,
            v_ref,
            activation,
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

    fn law(&self) -> MixedLaw {
        MixedLaw {
            e_pas: self.e_pas,
            e_act: self.e_act,
            k_pas: self.k_pas,
            v_ref: self.v_ref,
            activation: self.activation,
        }
    }

    /// Chamber pressure at cycle time `t` and volume `v`.
    pub fn pressure(&self, t: Real, v: Real) -> Real {
        self.law().pressure(t, v)
    }
}

impl Element for MixedElastanceChamber {
    fn name(&self) -> &str {
        &self.name
    }

    fn sharing(&self) -> Sharing {
        Sharing::SharedPressure
    }

    fn configure(&self, scope: &mut ElementScope<'_>) -> ComponentResult<()> {
        self.initial.require(&self.name)?;
        check_positive(self.e_pas, &self.name, "passive elastance")?;
        check_positive(self.e_act, &self.name, "active elastance")?;
        check_positive(self.k_pas, &self.name, "passive stiffness")?;
        if let Some(p0) = self.initial.pressure {
            if p0 <= -self.e_pas {
                return Err(ComponentError::NonPhysical {
                    element: self.name.clone(),
                    what: "initial pressure below passive asymptote",
                });
            }
        }

        let (p, q_i, q_o, v) = (scope.p_in(), scope.q_in(), scope.q_out(), scope.volume());
        let law = self.law();

        declare_volume_rate(scope)?;
        scope.set_differential(
            p,
            "mixed_elastance_dpdt",
            move |t: Real, y: &[Real]| law.pressure_rate(t, y[0], y[1], y[2]),
            &[v, q_i, q_o],
        )?;

        match self.initial.pressure {
            Some(p0) => scope.set_initial_value(p, p0)?,
            None => scope.set_init(
                p,
                "mixed_chamber_pressure",
                move |t: Real, y: &[Real]| law.pressure(t, y[0]),
                &[v],
            )?,
        }
        match self.initial.volume {
            Some(v0) => scope.set_initial_value(v, v0)?,
            None => scope.set_init(
                v,
                "mixed_chamber_volume",
                move |_t: Real, y: &[Real]| law.volume(y[0]),
                &[p],
            )?,
        }
        Ok(())
    }
}
