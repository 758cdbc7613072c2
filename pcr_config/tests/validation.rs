use pcr_config::load_toml;
use rstest::rstest;

#[test]
fn rejects_settle_not_shorter_than_tick() {
    let toml = r#"
[acquisition]
tick_ms = 150
settle_ms = 180
max_cycles = 31
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("settle >= tick must be rejected");
    assert!(
        format!("{err}")
            .to_lowercase()
            .contains("must be shorter than acquisition.tick_ms")
    );
}

#[test]
fn accepts_full_config() {
    let toml = r#"
[acquisition]
tick_ms = 2000
settle_ms = 180
max_cycles = 40

[hardware]
sensor_addr = 0x5C
i2c_bus = 1
led_pwm_channel = 0
led_pwm_frequency_hz = 800.0
led_max_level = 100

[storage]
resource_dir = "/var/lib/pcr"

[logging]
level = "debug"
rotation = "daily"
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.hardware.sensor_addr, 0x5C);
    assert_eq!(cfg.acquisition.max_cycles, 40);
    assert_eq!(cfg.storage.resource_dir.to_str(), Some("/var/lib/pcr"));
}

#[rstest]
#[case("[acquisition]\ntick_ms = 0\n", "tick_ms must be >= 1")]
#[case("[acquisition]\nmax_cycles = 0\n", "max_cycles must be >= 1")]
#[case("[acquisition]\nmax_cycles = 5000\n", "unreasonably large")]
#[case("[hardware]\nsensor_addr = 300\n", "7-bit")]
#[case("[hardware]\nled_pwm_channel = 2\n", "led_pwm_channel must be 0 or 1")]
#[case("[hardware]\nled_max_level = 0\n", "led_max_level must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "{msg:?} does not mention {needle:?}");
}

#[test]
fn unknown_types_fail_to_parse() {
    assert!(load_toml("[acquisition]\ntick_ms = \"fast\"\n").is_err());
}
