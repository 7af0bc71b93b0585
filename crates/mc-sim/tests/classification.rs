//! Role partition over generated element chains.

use mc_components::{
    Element, MynardValve, Opening, RcElement, ResistorElement, RlcElement, Valve, ValveLaw,
    add_element,
};
use mc_core::TimeGrid;
use mc_graph::{Network, Role};
use mc_sim::Assembly;
use proptest::prelude::*;

fn element(kind: u8, i: usize) -> Box<dyn Element> {
    let name = format!("e{i}");
    match kind {
        0 => Box::new(RcElement::new(name, 1.0, 1.5, 0.0).with_volume(2.0)),
        1 => Box::new(RlcElement::new(name, 1.0, 1.0, 0.1, 0.0).with_volume(1.0).with_flow(0.0)),
        2 => Box::new(ResistorElement::new(name, 2.0)),
        3 => Box::new(Valve::new(
            name,
            ValveLaw::NonIdeal {
                r: 0.5,
                opening: Opening::Relu,
            },
        )),
        _ => Box::new(MynardValve::new(name, 0.1, 0.1, 1.0)),
    }
}

fn chain(kinds: &[u8]) -> Network {
    let mut net = Network::new("chain", TimeGrid::new(1, 1.0, 0.1).unwrap()).unwrap();
    let ids: Vec<_> = kinds
        .iter()
        .enumerate()
        .map(|(i, &k)| add_element(&mut net, element(k, i).as_ref()).unwrap())
        .collect();
    for (i, pair) in ids.windows(2).enumerate() {
        net.connect(pair[0], pair[1], Some(&format!("p{i}")), Some(&format!("q{i}")))
            .unwrap();
    }
    net
}

proptest! {
    #[test]
    fn every_quantity_has_exactly_one_role(kinds in prop::collection::vec(0u8..5, 1..7)) {
        let net = chain(&kinds);
        let asm = Assembly::build(&net).unwrap();

        let mut seen = vec![0usize; asm.n_cols()];
        let sets = [
            (asm.principal_ids(), Role::Differential),
            (asm.secondary_ids(), Role::Algebraic),
            (asm.init_only_ids(), Role::InitOnly),
            (asm.inert_ids(), Role::Inert),
        ];
        for (ids, role) in sets {
            for &col in ids {
                seen[col] += 1;
                prop_assert_eq!(asm.role(col), role);
                let name = &asm.names()[col];
                prop_assert_eq!(net.quantity_by_name(name).unwrap().role(), role);
            }
        }
        prop_assert!(seen.iter().all(|&n| n == 1), "{:?}", seen);
        prop_assert_eq!(asm.n_cols(), net.all_quantity_names().len());
        prop_assert_eq!(asm.permutation().len(), asm.principal_ids().len());
    }
}
