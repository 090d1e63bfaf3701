//! End-to-end behaviour of the spotcast engine and CLI

use std::process::Command;

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

use spotcast::interpolation::haversine_km;
use spotcast::models::{InterpolationMethod, SENTINEL_VALUE, Severity};
use spotcast::{
    ActivityCategory, ActivityQuery, ConfidenceTier, EngineConfig, EngineError, ForecastSample,
    GeoPoint, Parameter, RiskEngine, RiskLevel, TimeWindow,
};

const KM_PER_DEGREE: f64 = 6371.0 * std::f64::consts::PI / 180.0;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 1, 6, 0, 0).unwrap()
}

fn north_of(origin: GeoPoint, km: f64) -> GeoPoint {
    GeoPoint {
        latitude: origin.latitude + km / KM_PER_DEGREE,
        longitude: origin.longitude,
    }
}

fn row(source: GeoPoint, hour: i64, parameter: Parameter, value: f64) -> ForecastSample {
    ForecastSample {
        source,
        timestamp: start() + Duration::hours(hour),
        parameter,
        value,
        lower: value - 1.5,
        upper: value + 1.5,
        standard_error: Some(0.8),
    }
}

fn single_hour() -> TimeWindow {
    TimeWindow::hourly(start(), start())
}

#[fixture]
fn target() -> GeoPoint {
    GeoPoint {
        latitude: 7.07,
        longitude: 125.6,
    }
}

#[fixture]
fn engine() -> RiskEngine {
    RiskEngine::default()
}

#[rstest]
fn test_exact_match_at_close_source(target: GeoPoint, engine: RiskEngine) {
    let samples = vec![
        row(north_of(target, 0.3), 0, Parameter::Temperature, 30.0),
        row(north_of(target, 5.0), 0, Parameter::Temperature, 32.0),
        row(north_of(target, 40.0), 0, Parameter::Temperature, 28.0),
    ];

    let forecast = engine
        .interpolate(&target, &single_hour(), &[Parameter::Temperature], &samples)
        .unwrap();

    assert_eq!(forecast.confidence, ConfidenceTier::Exact);
    let estimate = forecast.series[0].points[0].estimate.as_ref().unwrap();
    assert_eq!(estimate.method, InterpolationMethod::ExactMatch);
    assert_eq!(estimate.value, 30.0);
    assert_eq!(forecast.candidates.len(), 3);
    assert!(!forecast.interpolation_used);
}

#[rstest]
fn test_sentinel_source_is_skipped(target: GeoPoint, engine: RiskEngine) {
    let samples = vec![
        row(north_of(target, 1.0), 0, Parameter::Temperature, SENTINEL_VALUE),
        row(north_of(target, 2.0), 0, Parameter::Temperature, 10.0),
        row(north_of(target, 8.0), 0, Parameter::Temperature, 20.0),
    ];

    let forecast = engine
        .interpolate(&target, &single_hour(), &[Parameter::Temperature], &samples)
        .unwrap();

    let estimate = forecast.series[0].points[0].estimate.as_ref().unwrap();
    assert_relative_eq!(estimate.value, 10.588, epsilon = 0.005);
    assert!(estimate.sentinel_dropped);
    assert_eq!(estimate.sources_used, 2);
    assert_relative_eq!(estimate.nearest_distance_km, 2.0, epsilon = 1e-6);
    assert_eq!(forecast.confidence, ConfidenceTier::Medium);
}

#[rstest]
fn test_hot_hike_has_single_temperature_concern(target: GeoPoint, engine: RiskEngine) {
    let source = north_of(target, 3.0);
    let temperatures = [24.0, 27.0, 30.0, 33.0, 36.0, 34.0];
    let mut samples: Vec<ForecastSample> = temperatures
        .iter()
        .enumerate()
        .map(|(hour, &t)| row(source, hour as i64, Parameter::Temperature, t))
        .collect();
    samples.extend((0..6).map(|hour| row(source, hour, Parameter::Precipitation, 0.0)));

    let mut query = ActivityQuery::new(
        target,
        TimeWindow::hourly(start(), start() + Duration::hours(5)),
        "hiking",
    );
    query.parameters = Some(vec![Parameter::Temperature, Parameter::Precipitation]);

    let assessment = engine.assess(&query, &samples).unwrap();
    let report = &assessment.report;

    assert_eq!(assessment.activity, ActivityCategory::Hiking);
    assert!(!report.suitable);
    assert_eq!(report.risk_level, RiskLevel::High);
    assert_eq!(report.concerns.len(), 1);
    assert!(report.concerns[0].contains("temperature"));
    assert_eq!(report.hazards[0].severity, Severity::Unsafe);

    // the first three hours stay inside the comfortable band
    assert_eq!(report.alternative_windows.len(), 1);
    assert_eq!(report.alternative_windows[0].start, start());
    assert_eq!(report.alternative_windows[0].risk_level, RiskLevel::Low);
    assert_eq!(report.alternative_windows[0].reason, "cooler temperatures");
    assert_eq!(report.hourly.len(), 6);
    assert_eq!(
        assessment.forecast_summary[&Parameter::Temperature].extreme_hours.len(),
        3
    );
}

#[rstest]
fn test_cool_start_hot_hike_has_single_temperature_concern(target: GeoPoint, engine: RiskEngine) {
    let source = north_of(target, 3.0);
    let temperatures = [12.0, 18.0, 26.0, 31.0, 36.0, 34.0];
    let mut samples: Vec<ForecastSample> = temperatures
        .iter()
        .enumerate()
        .map(|(hour, &t)| row(source, hour as i64, Parameter::Temperature, t))
        .collect();
    samples.extend((0..6).map(|hour| row(source, hour, Parameter::Precipitation, 0.0)));

    let mut query = ActivityQuery::new(
        target,
        TimeWindow::hourly(start(), start() + Duration::hours(5)),
        "hiking",
    );
    query.parameters = Some(vec![Parameter::Temperature, Parameter::Precipitation]);

    let report = engine.assess(&query, &samples).unwrap().report;

    assert!(!report.suitable);
    assert_eq!(report.risk_level, RiskLevel::High);
    assert_eq!(report.concerns.len(), 1);
    assert_eq!(report.hazards.len(), 1);
    assert_eq!(report.hazards[0].worst_value, 36.0);
    assert_eq!(report.alternative_windows.len(), 1);
    assert_eq!(report.alternative_windows[0].start, start());
    assert_eq!(report.alternative_windows[0].risk_level, RiskLevel::Low);
}

#[rstest]
#[case(95.0, 8.0)]
#[case(45.0, 200.0)]
#[case(f64::NAN, 0.0)]
fn test_invalid_target_is_rejected(
    #[case] latitude: f64,
    #[case] longitude: f64,
    target: GeoPoint,
    engine: RiskEngine,
) {
    let bad = GeoPoint { latitude, longitude };
    let samples = vec![row(target, 0, Parameter::Temperature, 25.0)];

    let query = ActivityQuery::new(bad, single_hour(), "hiking");
    let err = engine.assess(&query, &samples).unwrap_err();
    assert!(matches!(err, EngineError::InvalidCoordinate { .. }), "{err:?}");

    let err = engine
        .interpolate(&bad, &single_hour(), &[Parameter::Temperature], &samples)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCoordinate { .. }), "{err:?}");
}

#[rstest]
fn test_no_sources_in_range_is_fatal(target: GeoPoint, engine: RiskEngine) {
    let samples = vec![row(north_of(target, 150.0), 0, Parameter::Temperature, 25.0)];
    let query = ActivityQuery::new(target, single_hour(), "hiking");

    let err = engine.assess(&query, &samples).unwrap_err();
    assert!(matches!(err, EngineError::NoCandidatesInRange { .. }));
}

#[rstest]
fn test_sentinel_never_reaches_output(target: GeoPoint, engine: RiskEngine) {
    let near = north_of(target, 1.0);
    let far = north_of(target, 12.0);
    let mut samples = Vec::new();
    for hour in 0..4 {
        for parameter in Parameter::ALL {
            let near_value = if hour % 2 == 0 { SENTINEL_VALUE } else { 40.0 };
            let mut near_row = row(near, hour, parameter, near_value);
            near_row.upper = SENTINEL_VALUE;
            samples.push(near_row);
            samples.push(row(far, hour, parameter, if hour == 3 { SENTINEL_VALUE } else { 20.0 }));
        }
    }
    let query = ActivityQuery::new(
        target,
        TimeWindow::hourly(start(), start() + Duration::hours(3)),
        "beach",
    );

    let assessment = engine.assess(&query, &samples).unwrap();

    for series in &assessment.forecast.series {
        for (_, estimate) in series.valid_points() {
            for number in [estimate.value, estimate.lower, estimate.upper] {
                assert!(number > -900.0, "{:?} leaked a sentinel", series.parameter);
            }
        }
    }
    for summary in assessment.forecast_summary.values() {
        assert!(summary.min > -900.0);
    }
}

#[rstest]
fn test_exact_distance_matches_reference_formula(target: GeoPoint) {
    let other = north_of(target, 40.0);
    assert_relative_eq!(haversine_km(&target, &other), 40.0, epsilon = 1e-6);
}

#[rstest]
fn test_configured_thresholds_change_verdict(target: GeoPoint) {
    let config = EngineConfig::from_toml_str(
        r#"
        [activities.beach.wind_speed]
        direction = "above"
        caution_threshold = 4.0
        unsafe_threshold = 6.0
        "#,
    )
    .unwrap();
    let engine = RiskEngine::new(config);
    let samples = vec![row(target, 0, Parameter::WindSpeed, 7.0)];
    let query = ActivityQuery::new(target, single_hour(), "beach volleyball");

    let assessment = engine.assess(&query, &samples).unwrap();
    assert_eq!(assessment.report.risk_level, RiskLevel::High);
    assert!(assessment.report.alternative_windows.is_empty());
}

#[test]
fn test_cli_prints_assessment() {
    let dir = std::env::temp_dir().join(format!("spotcast-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let request = dir.join("request.json");
    std::fs::write(
        &request,
        r#"{
            "query": {
                "target": {"latitude": 46.5, "longitude": 8.0},
                "window": {"start": "2025-07-01T06:00:00Z", "end": "2025-07-01T07:00:00Z"},
                "activity": "hiking",
                "parameters": ["temperature"]
            },
            "samples": [
                {"source": {"latitude": 46.51, "longitude": 8.0}, "timestamp": "2025-07-01T06:00:00Z",
                 "parameter": "temperature", "value": 21.0, "lower": 19.0, "upper": 23.0},
                {"source": {"latitude": 46.51, "longitude": 8.0}, "timestamp": "2025-07-01T07:00:00Z",
                 "parameter": "temperature", "value": 23.0, "lower": 21.0, "upper": 25.0}
            ]
        }"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_spotcast"))
        .arg(&request)
        .arg("--config")
        .arg(dir.join("missing.toml"))
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["report"]["risk_level"], "low");
    assert_eq!(json["forecast"]["confidence"], "MEDIUM");
    assert_eq!(json["location"]["interpolation_used"], true);
}

#[test]
fn test_cli_without_arguments_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_spotcast"))
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_spotcast"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Point forecast interpolation and activity risk assessment"));
    assert!(stdout.contains("--config"));
}
