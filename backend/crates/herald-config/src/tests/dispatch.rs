use crate::DispatchConfig;

use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::{anything, eq, err, gt, ok};

#[test]
fn given_defaults_when_validate_then_ok() {
    // Given
    let config = DispatchConfig::default();

    // When
    let result = config.validate();

    // Then
    assert_that!(result, ok(anything()));
    assert_that!(config.round_timeout(), eq(Duration::from_secs(5)));
}

#[test]
fn given_auto_in_flight_when_effective_then_at_least_one() {
    // Given
    let config = DispatchConfig::default();

    // When
    let in_flight = config.effective_max_in_flight();

    // Then
    assert_that!(in_flight, gt(0));
}

#[test]
fn given_explicit_in_flight_when_effective_then_used() {
    // Given
    let config = DispatchConfig {
        max_in_flight: 3,
        ..DispatchConfig::default()
    };

    // When / Then
    assert_that!(config.effective_max_in_flight(), eq(3));
}

#[test]
fn given_round_timeout_too_short_when_validate_then_error() {
    // Given
    let config = DispatchConfig {
        round_timeout_ms: 10,
        ..DispatchConfig::default()
    };

    // When
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
fn given_zero_inbound_buffer_when_validate_then_error() {
    // Given
    let config = DispatchConfig {
        inbound_buffer_size: 0,
        ..DispatchConfig::default()
    };

    // When
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}
