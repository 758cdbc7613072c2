use pcr_hardware::SimulatedSensor;
use pcr_hardware::error::HwError;
use pcr_traits::SensorPort;
use rstest::rstest;

#[rstest]
fn init_failure_is_reported_as_hw_error() {
    let mut s = SimulatedSensor::new().with_init_failure();
    let err = s.initialize().expect_err("init should fail");
    let hw = err
        .downcast_ref::<HwError>()
        .expect("simulated faults are HwError");
    assert!(matches!(hw, HwError::Simulated(_)));
}

#[rstest]
#[case(3, &[3, 6, 9])]
#[case(5, &[5, 10])]
fn every_nth_read_fails(#[case] n: u32, #[case] failing: &[u32]) {
    let mut s = SimulatedSensor::new().with_read_failure_every(n);
    s.initialize().unwrap();
    for cycle in 1..=10u32 {
        s.trigger_reading().unwrap();
        let res = s.read_value();
        assert_eq!(res.is_err(), failing.contains(&cycle), "cycle {cycle}");
    }
}

#[rstest]
fn initialize_restarts_the_curve() {
    let mut s = SimulatedSensor::new();
    s.initialize().unwrap();
    for _ in 0..5 {
        s.trigger_reading().unwrap();
    }
    s.initialize().unwrap();
    s.trigger_reading().unwrap();
    let v = s.read_value().unwrap();
    assert!((v - SimulatedSensor::curve_value(1)).abs() < f32::EPSILON);
}
