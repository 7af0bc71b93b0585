//! Built-in closed left-heart loop: ventricle, aortic valve, aorta,
//! arteries, veins, atrium, mitral valve.
//!
//! Times are in ms, volumes in ml.

use mc_components::{
    Activation, ActivationShape, ComponentResult, ConstantElastanceChamber, Opening, RcElement,
    Valve, ValveLaw, add_element,
};
use mc_core::{Real, TimeGrid};
use mc_graph::Network;
use serde::{Deserialize, Serialize};

/// Total blood volume the default volumes are fractions of.
const TOTAL_VOLUME: Real = 5200.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Compartment {
    pub r: Real,
    pub c: Real,
    pub v_ref: Real,
    pub v: Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chamber {
    pub e_pas: Real,
    pub e_act: Real,
    pub v_ref: Real,
    pub t_max: Real,
    pub tau: Real,
    /// Activation delay within the cycle.
    pub delay: Real,
    pub v: Real,
}

impl Chamber {
    fn activation(&self, t_cycle: Real) -> Activation {
        let activation = Activation::new(ActivationShape::CosineCosine, self.t_max, 1.5 * self.t_max, self.tau);
        if self.delay != 0.0 {
            activation.with_delay(self.delay, t_cycle)
        } else {
            activation
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeftHeartParameters {
    pub ao: Compartment,
    pub art: Compartment,
    pub ven: Compartment,
    /// Aortic valve resistance
    pub av_r: Real,
    /// Mitral valve resistance
    pub mv_r: Real,
    pub la: Chamber,
    pub lv: Chamber,
}

impl Default for LeftHeartParameters {
    fn default() -> Self {
        Self {
            ao: Compartment {
                r: 32000.0,
                c: 0.0025,
                v_ref: 100.0,
                v: 0.025 * TOTAL_VOLUME,
            },
            art: Compartment {
                r: 150000.0,
                c: 0.025,
                v_ref: 50.0,
                v: 0.21 * TOTAL_VOLUME,
            },
            ven: Compartment {
                r: 1200.0,
                c: 1.0,
                v_ref: 2800.0,
                v: 0.727 * TOTAL_VOLUME,
            },
            av_r: 800.0,
            mv_r: 550.0,
            la: Chamber {
                e_pas: 60.0,
                e_act: 0.44 / 0.0075,
                v_ref: 10.0,
                t_max: 150.0,
                tau: 25.0,
                delay: 100.0,
                v: 0.018 * TOTAL_VOLUME,
            },
            lv: Chamber {
                e_pas: 400.0,
                e_act: 1.0 / 0.0075,
                v_ref: 10.0,
                t_max: 280.0,
                tau: 25.0,
                delay: 0.0,
                v: 0.02 * TOTAL_VOLUME,
            },
        }
    }
}

fn rc(name: &str, p: &Compartment) -> RcElement {
    RcElement::new(name, p.r, p.c, p.v_ref).with_volume(p.v)
}

fn diode(name: &str, r: Real) -> Valve {
    Valve::new(
        name,
        ValveLaw::NonIdeal {
            r,
            opening: Opening::Relu,
        },
    )
}

fn chamber(name: &str, p: &Chamber, t_cycle: Real) -> ConstantElastanceChamber {
    ConstantElastanceChamber::new(name, p.e_pas, p.e_act, p.v_ref, p.activation(t_cycle)).with_volume(p.v)
}

/// Assemble and connect the loop on `grid`.
pub fn build(params: &LeftHeartParameters, grid: TimeGrid) -> ComponentResult<Network> {
    let mut net = Network::new("left_heart", grid)?;
    let t_cycle = grid.t_cycle;

    let ao = add_element(&mut net, &rc("ao", &params.ao))?;
    let art = add_element(&mut net, &rc("art", &params.art))?;
    let ven = add_element(&mut net, &rc("ven", &params.ven))?;
    let av = add_element(&mut net, &diode("av", params.av_r))?;
    let mv = add_element(&mut net, &diode("mv", params.mv_r))?;
    let la = add_element(&mut net, &chamber("la", &params.la, t_cycle))?;
    let lv = add_element(&mut net, &chamber("lv", &params.lv, t_cycle))?;

    net.connect(lv, av, Some("p_lv"), Some("q_av"))?;
    net.connect(av, ao, Some("p_ao"), Some("q_av"))?;
    net.connect(ao, art, Some("p_art"), Some("q_ao"))?;
    net.connect(art, ven, Some("p_ven"), Some("q_art"))?;
    net.connect(ven, la, Some("p_la"), Some("q_ven"))?;
    net.connect(la, mv, Some("p_la"), Some("q_mv"))?;
    net.connect(mv, lv, Some("p_lv"), Some("q_mv"))?;
    Ok(net)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_graph::Role;

    #[test]
    fn default_loop_has_expected_quantities() {
        let grid = TimeGrid::new(2, 800.0, 1.0).unwrap();
        let net = build(&LeftHeartParameters::default(), grid).unwrap();
        assert_eq!(net.all_quantity_names().len(), 17);
        let counts = net.role_counts();
        assert_eq!(counts[&Role::Differential], 10);
        assert_eq!(counts[&Role::Algebraic], 5);
    }

    #[test]
    fn default_volumes_match_total() {
        let p = LeftHeartParameters::default();
        let total = p.ao.v + p.art.v + p.ven.v + p.la.v + p.lv.v;
        assert!((total - TOTAL_VOLUME).abs() < 1e-9);
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let p: LeftHeartParameters = serde_json::from_str(r#"{"av_r": 900.0}"#).unwrap();
        assert_eq!(p.av_r, 900.0);
        assert_eq!(p.mv_r, 550.0);
    }
}
