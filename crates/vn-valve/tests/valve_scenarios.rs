//! End-to-end stepping of pressure-sensitive valves.

use vn_core::units::{k, kpa};
use vn_core::{Tolerances, nearly_equal};
use vn_fluids::{FluidState, SquareRootLaw};
use vn_valve::{
    Malfunctions, Polarity, PortStates, PressureSensitiveValve, SensedPotentials, Toggle,
    ValveConfig, ValveInput, ValveState,
};

fn fluids() -> (FluidState, FluidState) {
    let inlet = FluidState::ideal_gas(kpa(300.0), k(300.0), 28.0134).unwrap();
    let outlet = FluidState::ideal_gas(kpa(100.0), k(300.0), 28.0134).unwrap();
    (inlet, outlet)
}

fn regulator_config() -> ValveConfig {
    ValveConfig::new("reg", Polarity::Regulator, 1.0, 2.0, 3.0).with_max_conductivity(1.0e-4)
}

fn relief_config() -> ValveConfig {
    ValveConfig::new("relief", Polarity::Relief, 3.0, 2.0, 1.0).with_max_conductivity(1.0e-4)
}

/// Step with the control pressure applied directly as the sensed differential.
fn step_at(valve: &mut PressureSensitiveValve, control_pressure: f64, dt: f64) {
    let (a, b) = fluids();
    let ports = PortStates {
        inlet: &a,
        outlet: &b,
    };
    valve.step(
        SensedPotentials::new(control_pressure, 0.0),
        ports,
        &SquareRootLaw,
        dt,
    );
}

#[test]
fn hysteresis_holds_then_closes() {
    let mut valve = PressureSensitiveValve::new(regulator_config(), ValveInput::default()).unwrap();
    let tol = Tolerances::default();

    step_at(&mut valve, 1.99, 0.1);
    assert_eq!(valve.state(), ValveState::Opening);
    assert!(nearly_equal(valve.position(), 0.04, tol));
    let cracked = valve.position();

    // Small reversal: freeze.
    step_at(&mut valve, 2.0, 0.1);
    assert_eq!(valve.state(), ValveState::Transitioning);
    assert_eq!(valve.position(), cracked);

    step_at(&mut valve, 2.5, 0.1);
    assert_eq!(valve.state(), ValveState::Transitioning);
    assert_eq!(valve.position(), cracked);

    // Past the closing curve at the held position (2.98).
    step_at(&mut valve, 2.99, 0.1);
    assert_eq!(valve.state(), ValveState::Closing);
    assert!(nearly_equal(valve.position(), 0.02, tol));

    step_at(&mut valve, 3.1, 0.1);
    assert_eq!(valve.state(), ValveState::Closed);
    assert_eq!(valve.position(), 0.0);
}

#[test]
fn transitioning_resumes_opening_below_opening_curve() {
    let mut valve = PressureSensitiveValve::new(regulator_config(), ValveInput::default()).unwrap();
    step_at(&mut valve, 1.99, 0.1);
    step_at(&mut valve, 2.0, 0.1);
    assert_eq!(valve.state(), ValveState::Transitioning);

    step_at(&mut valve, 1.9, 0.1);
    assert_eq!(valve.state(), ValveState::Opening);
    assert!(valve.position() > 0.04);
}

#[test]
fn full_travel_regulator() {
    let mut valve = PressureSensitiveValve::new(regulator_config(), ValveInput::default()).unwrap();
    step_at(&mut valve, 1.5, 0.1);
    assert_eq!(valve.state(), ValveState::Opening);
    step_at(&mut valve, 0.9, 0.1);
    assert_eq!(valve.state(), ValveState::Open);
    assert_eq!(valve.position(), 1.0);
    step_at(&mut valve, 1.2, 0.1);
    assert_eq!(valve.state(), ValveState::Closing);
    assert!(valve.position() < 1.0);
    step_at(&mut valve, 3.5, 0.1);
    assert_eq!(valve.state(), ValveState::Closed);
    assert_eq!(valve.position(), 0.0);
    assert_eq!(valve.system_conductance(), 0.0);
}

#[test]
fn relief_opens_on_rising_pressure() {
    let mut valve = PressureSensitiveValve::new(relief_config(), ValveInput::default()).unwrap();
    step_at(&mut valve, 1.5, 0.1);
    assert_eq!(valve.state(), ValveState::Closed);

    step_at(&mut valve, 2.5, 0.1);
    assert_eq!(valve.state(), ValveState::Opening);
    assert!(valve.position() > 0.1 && valve.position() < 1.0);

    step_at(&mut valve, 3.5, 0.1);
    assert_eq!(valve.state(), ValveState::Open);
    assert_eq!(valve.position(), 1.0);

    step_at(&mut valve, 2.0, 0.1);
    assert_eq!(valve.state(), ValveState::Closing);
    assert!(valve.position() > 0.0 && valve.position() < 1.0);

    step_at(&mut valve, 0.9, 0.1);
    assert_eq!(valve.state(), ValveState::Closed);
    assert_eq!(valve.position(), 0.0);
}

#[test]
fn rate_limit_is_exact() {
    let config = regulator_config().with_rate_limit(0.5);
    let mut valve = PressureSensitiveValve::new(config, ValveInput::default()).unwrap();

    step_at(&mut valve, 0.5, 0.25);
    assert_eq!(valve.position(), 0.125);

    let mut previous = valve.position();
    for _ in 0..7 {
        step_at(&mut valve, 0.5, 0.25);
        assert_eq!(valve.position() - previous, 0.125);
        previous = valve.position();
    }
    assert_eq!(valve.position(), 1.0);
}

#[test]
fn zero_rate_limit_holds_position() {
    let config = regulator_config().with_rate_limit(0.0);
    let mut valve = PressureSensitiveValve::new(config, ValveInput::default()).unwrap();

    step_at(&mut valve, 0.5, 0.1);
    assert_eq!(valve.state(), ValveState::Opening);
    assert_eq!(valve.position(), 0.0);
    assert_eq!(valve.system_conductance(), 0.0);

    step_at(&mut valve, 0.5, 10.0);
    assert_eq!(valve.position(), 0.0);
}

#[test]
fn slewed_close_reconciles_state() {
    let config = regulator_config().with_rate_limit(1.0);
    let mut valve =
        PressureSensitiveValve::new(config, ValveInput::at_position(1.0)).unwrap();
    assert_eq!(valve.state(), ValveState::Open);

    step_at(&mut valve, 1.5, 0.1);
    assert_eq!(valve.state(), ValveState::Closing);
    assert!(nearly_equal(valve.position(), 0.9, Tolerances::default()));

    // Past reseat the valve is declared Closed but is still travelling shut.
    step_at(&mut valve, 3.5, 0.1);
    assert!(valve.position() > 0.0);
    assert_eq!(valve.state(), ValveState::Closing);
}

/// Step `valve` through `pressures` and check that every step moves the
/// position by exactly `rate * dt` toward `target` without a hysteresis hold.
fn assert_slews_to(
    valve: &mut PressureSensitiveValve,
    pressures: impl IntoIterator<Item = f64>,
    dt: f64,
    target: f64,
) {
    let rate = valve.config().rate_limit;
    for p in pressures {
        let previous = valve.position();
        step_at(valve, p, dt);
        let expected = if target > previous {
            (previous + rate * dt).min(target)
        } else {
            (previous - rate * dt).max(target)
        };
        assert!(
            (valve.position() - expected).abs() < 1e-12,
            "p {p}: position {} expected {expected}",
            valve.position()
        );
        assert_ne!(valve.state(), ValveState::Transitioning, "p {p}");
    }
}

#[test]
fn regulator_slews_shut_under_rising_pressure() {
    let config = regulator_config().with_rate_limit(1.0);
    let mut valve =
        PressureSensitiveValve::new(config, ValveInput::at_position(1.0)).unwrap();

    assert_slews_to(&mut valve, (0..12).map(|i| 3.5 + 0.01 * f64::from(i)), 0.1, 0.0);
    assert_eq!(valve.state(), ValveState::Closed);
    assert_eq!(valve.position(), 0.0);
}

#[test]
fn regulator_slews_open_under_falling_pressure() {
    let config = regulator_config().with_rate_limit(1.0);
    let mut valve = PressureSensitiveValve::new(config, ValveInput::default()).unwrap();

    assert_slews_to(&mut valve, (0..12).map(|i| 0.5 - 0.01 * f64::from(i)), 0.1, 1.0);
    assert_eq!(valve.state(), ValveState::Open);
    assert_eq!(valve.position(), 1.0);
}

#[test]
fn relief_slews_shut_under_falling_pressure() {
    let config = relief_config().with_rate_limit(1.0);
    let mut valve =
        PressureSensitiveValve::new(config, ValveInput::at_position(1.0)).unwrap();

    assert_slews_to(&mut valve, (0..12).map(|i| 0.5 - 0.01 * f64::from(i)), 0.1, 0.0);
    assert_eq!(valve.state(), ValveState::Closed);
    assert_eq!(valve.position(), 0.0);
}

#[test]
fn relief_slews_open_under_rising_pressure() {
    let config = relief_config().with_rate_limit(1.0);
    let mut valve = PressureSensitiveValve::new(config, ValveInput::default()).unwrap();

    assert_slews_to(&mut valve, (0..12).map(|i| 3.5 + 0.01 * f64::from(i)), 0.1, 1.0);
    assert_eq!(valve.state(), ValveState::Open);
    assert_eq!(valve.position(), 1.0);
}

#[test]
fn relief_ramp_down_closes_without_stalling() {
    let config = relief_config().with_rate_limit(1.0);
    let mut valve =
        PressureSensitiveValve::new(config, ValveInput::at_position(1.0)).unwrap();

    let mut previous = valve.position();
    for i in 1..=25 {
        step_at(&mut valve, 3.0 - 0.1 * f64::from(i), 0.1);
        assert_ne!(valve.state(), ValveState::Transitioning, "step {i}");
        assert!(valve.position() <= previous + 1e-12, "step {i}");
        previous = valve.position();
    }
    assert_eq!(valve.state(), ValveState::Closed);
    assert_eq!(valve.position(), 0.0);
}

#[test]
fn relief_hysteresis_holds_then_closes() {
    let mut valve = PressureSensitiveValve::new(relief_config(), ValveInput::default()).unwrap();
    let tol = Tolerances::default();

    step_at(&mut valve, 2.01, 0.1);
    assert_eq!(valve.state(), ValveState::Opening);
    assert!(nearly_equal(valve.position(), 0.04, tol));
    let cracked = valve.position();

    // Small reversal: freeze.
    step_at(&mut valve, 2.0, 0.1);
    assert_eq!(valve.state(), ValveState::Transitioning);
    assert_eq!(valve.position(), cracked);

    step_at(&mut valve, 1.5, 0.1);
    assert_eq!(valve.state(), ValveState::Transitioning);
    assert_eq!(valve.position(), cracked);

    // Past the closing curve at the held position (1.02).
    step_at(&mut valve, 1.01, 0.1);
    assert_eq!(valve.state(), ValveState::Closing);
    assert!(nearly_equal(valve.position(), 0.02, tol));

    step_at(&mut valve, 0.9, 0.1);
    assert_eq!(valve.state(), ValveState::Closed);
    assert_eq!(valve.position(), 0.0);
}

#[test]
fn relief_transitioning_resumes_opening_above_opening_curve() {
    let mut valve = PressureSensitiveValve::new(relief_config(), ValveInput::default()).unwrap();
    step_at(&mut valve, 2.01, 0.1);
    step_at(&mut valve, 2.0, 0.1);
    assert_eq!(valve.state(), ValveState::Transitioning);

    step_at(&mut valve, 2.1, 0.1);
    assert_eq!(valve.state(), ValveState::Opening);
    assert!(valve.position() > 0.04);
}

#[test]
fn stuck_wins_over_fail_to() {
    let malfunctions = Malfunctions {
        stuck: true,
        fail_to: Toggle::new(true, 1.0),
        ..Default::default()
    };
    let input = ValveInput {
        position: 0.4,
        malfunctions,
        ..Default::default()
    };
    let mut valve = PressureSensitiveValve::new(regulator_config(), input).unwrap();
    step_at(&mut valve, 0.5, 1.0);
    assert_eq!(valve.position(), 0.4);

    valve.set_stuck(false);
    step_at(&mut valve, 0.5, 1.0);
    assert_eq!(valve.position(), 1.0);

    valve.set_fail_to(true, -2.0);
    step_at(&mut valve, 0.5, 1.0);
    assert_eq!(valve.position(), 0.0);
}

#[test]
fn zero_dt_steps_are_idempotent() {
    let config = regulator_config().with_rate_limit(2.0);
    let mut valve =
        PressureSensitiveValve::new(config, ValveInput::at_position(0.3)).unwrap();
    step_at(&mut valve, 1.5, 0.0);
    let first = (
        valve.state(),
        valve.position(),
        valve.control_pressure(),
        valve.system_conductance(),
        *valve.admittance(),
    );
    step_at(&mut valve, 1.5, 0.0);
    let second = (
        valve.state(),
        valve.position(),
        valve.control_pressure(),
        valve.system_conductance(),
        *valve.admittance(),
    );
    assert_eq!(first, second);
}

#[test]
fn initial_state_follows_position() {
    let cases = [
        (0.0, ValveState::Closed),
        (0.5, ValveState::Opening),
        (1.0, ValveState::Open),
    ];
    for (position, expected) in cases {
        let valve =
            PressureSensitiveValve::new(regulator_config(), ValveInput::at_position(position))
                .unwrap();
        assert_eq!(valve.state(), expected, "position {position}");
    }
}

#[test]
fn leak_through_keeps_closed_valve_conducting() {
    let mut valve = PressureSensitiveValve::new(regulator_config(), ValveInput::default()).unwrap();
    step_at(&mut valve, 5.0, 0.1);
    assert_eq!(valve.state(), ValveState::Closed);
    assert_eq!(valve.system_conductance(), 0.0);

    valve.set_leak_through(true, 0.01);
    step_at(&mut valve, 5.0, 0.1);
    assert_eq!(valve.position(), 0.0);
    let leaking = valve.system_conductance();
    assert!(leaking > 0.0);
    assert!(valve.admittance_updated());
    valve.acknowledge_admittance();

    step_at(&mut valve, 5.0, 0.1);
    assert_eq!(valve.system_conductance(), leaking);
    assert!(!valve.admittance_updated());

    valve.set_leak_through(false, 0.01);
    step_at(&mut valve, 5.0, 0.1);
    assert_eq!(valve.system_conductance(), 0.0);
    assert!(valve.admittance_updated());
}

#[test]
fn blockage_reduces_conductance() {
    let input = ValveInput::at_position(1.0);
    let mut open = PressureSensitiveValve::new(regulator_config(), input.clone()).unwrap();
    let mut blocked = PressureSensitiveValve::new(regulator_config(), input).unwrap();
    blocked.set_blockage(true, 0.5);
    step_at(&mut open, 0.5, 0.1);
    step_at(&mut blocked, 0.5, 0.1);

    let tol = Tolerances::default();
    assert!(nearly_equal(
        blocked.conductance().effective_conductivity(),
        0.5 * open.conductance().effective_conductivity(),
        tol
    ));
    assert!(blocked.system_conductance() < open.system_conductance());
}

#[test]
fn pressure_bias_shifts_crack_point() {
    let mut valve = PressureSensitiveValve::new(regulator_config(), ValveInput::default()).unwrap();
    valve.set_pressure_bias(true, -0.5);
    step_at(&mut valve, 2.3, 0.1);
    assert_eq!(valve.state(), ValveState::Opening);

    let mut biased = PressureSensitiveValve::new(regulator_config(), ValveInput::default()).unwrap();
    biased.set_setpoint_bias(0.5);
    step_at(&mut biased, 2.3, 0.1);
    assert_eq!(biased.state(), ValveState::Opening);
    assert_eq!(biased.position(), valve.position());
}

#[test]
fn config_errors_name_the_field() {
    let config = regulator_config().with_pop(1.5, 4.0);
    let err = PressureSensitiveValve::new(config, ValveInput::default()).unwrap_err();
    assert_eq!(err.field(), Some("pop_position"));
    let msg = err.to_string();
    assert!(msg.contains("reg"));
    assert!(msg.contains("in (0, 1)"));

    let err = PressureSensitiveValve::new(regulator_config(), ValveInput::at_position(2.0))
        .unwrap_err();
    assert_eq!(err.field(), Some("position"));
}

#[test]
fn valves_step_on_separate_threads() {
    fn assert_send<T: Send>() {}
    assert_send::<PressureSensitiveValve>();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let mut valve =
                    PressureSensitiveValve::new(regulator_config(), ValveInput::default())
                        .unwrap();
                step_at(&mut valve, 1.0 + 0.2 * f64::from(i), 0.1);
                valve.position()
            })
        })
        .collect();
    let positions: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] >= w[1]));
}
