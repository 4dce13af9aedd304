//! Integration tests for vn-fluids relations on ideal-gas states.

use vn_core::units::{k, kpa};
use vn_fluids::{FlowRelation, FluidError, FluidState, SquareRootLaw};

fn nitrogen(p_kpa: f64) -> FluidState {
    FluidState::ideal_gas(kpa(p_kpa), k(300.0), 28.0134).unwrap()
}

#[test]
fn nitrogen_density_is_ideal() {
    let n2 = nitrogen(101.325);
    // ~1.138 kg/m³ at 300 K
    assert!((n2.density_kg_m3() - 1.138).abs() < 1e-3);
    let doubled = n2.at_pressure_kpa(202.65).unwrap();
    assert!((doubled.density_kg_m3() / n2.density_kg_m3() - 2.0).abs() < 1e-12);
}

#[test]
fn conductance_rises_as_pressure_drop_falls() {
    let relation = SquareRootLaw::new();
    let inlet = nitrogen(500.0);
    let near = relation.conductance(1.0e-4, 1.0, &inlet, &nitrogen(450.0));
    let far = relation.conductance(1.0e-4, 1.0, &inlet, &nitrogen(100.0));
    assert!(near > far, "linearized conductance should fall with Δp");
    assert_eq!(relation.name(), "square-root");
}

#[test]
fn leak_target_maps_to_small_conductivity() {
    let relation = SquareRootLaw::new();
    let c = relation.conductivity_for_flow(1.0e-3, 1.0, &nitrogen(300.0), &nitrogen(100.0));
    assert!(c > 0.0 && c < 1.0e-4);
}

#[test]
fn non_physical_states_rejected() {
    let err = FluidState::ideal_gas(kpa(-1.0), k(300.0), 28.0).unwrap_err();
    assert!(matches!(err, FluidError::NonPhysical { what: "pressure", .. }));
    assert!(FluidState::ideal_gas(kpa(100.0), k(0.0), 28.0).is_err());
    assert!(FluidState::ideal_gas(kpa(100.0), k(300.0), f64::NAN).is_err());
}
