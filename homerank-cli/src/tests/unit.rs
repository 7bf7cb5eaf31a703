//! Focused unit tests for configuration, batch parsing, and reports.

use super::helpers::{Workspace, apartment, apartments_batch, place, write_utf8};
use super::*;
use crate::batch::{ListingKind, Listings, load_batch, parse_batch};
use crate::config::{DEFAULT_DATABASE, RunConfig, config_from_layers_for_test};
use crate::report::write_report;
use crate::score::ScoreReport;
use camino::Utf8PathBuf;
use homerank_core::{ItemId, ScoreLookup, Tier, UserId, Viewer};
use homerank_routing::{DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT_SECS};
use rstest::rstest;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

fn batch_path() -> Utf8PathBuf {
    Utf8PathBuf::from("batch.json")
}

fn parse(value: &serde_json::Value) -> Result<Listings, CliError> {
    parse_batch(&batch_path(), &value.to_string())
}

#[rstest]
fn converting_args_without_input_errors() {
    let err = RunConfig::try_from(RunArgs::default()).expect_err("missing input should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_INPUT);
            assert_eq!(env, ENV_INPUT);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn run_config_applies_defaults() {
    let args = RunArgs {
        input: Some(batch_path()),
        ..RunArgs::default()
    };

    let config = RunConfig::try_from(args).expect("config should build");
    assert_eq!(config.input, batch_path());
    assert_eq!(config.database, Utf8PathBuf::from(DEFAULT_DATABASE));
    assert_eq!(config.routing.base_url, DEFAULT_BASE_URL);
    assert_eq!(
        config.routing.timeout,
        Duration::from_secs(DEFAULT_TIMEOUT_SECS)
    );
    assert_eq!(config.routing.max_concurrency, DEFAULT_MAX_CONCURRENCY);
    assert!(!config.routing.is_configured());
    assert!(!config.force);
    assert!(config.output.is_none());
}

#[rstest]
#[case::zero_timeout(Some(0), None, ARG_ROUTING_TIMEOUT_SECS)]
#[case::zero_concurrency(None, Some(0), ARG_ROUTING_CONCURRENCY)]
fn run_config_rejects_zero_limits(
    #[case] timeout: Option<u64>,
    #[case] concurrency: Option<usize>,
    #[case] expected_field: &'static str,
) {
    let args = RunArgs {
        input: Some(batch_path()),
        routing_timeout_secs: timeout,
        routing_concurrency: concurrency,
        ..RunArgs::default()
    };

    let err = RunConfig::try_from(args).expect_err("zero limit should error");
    match err {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, expected_field),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
#[case::blank("   ", false)]
#[case::present("secret", true)]
fn routing_is_configured_only_with_a_key(#[case] key: &str, #[case] expected: bool) {
    let args = RunArgs {
        input: Some(batch_path()),
        routing_api_key: Some(key.to_owned()),
        ..RunArgs::default()
    };

    let config = RunConfig::try_from(args).expect("config should build");
    assert_eq!(config.routing.is_configured(), expected);
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "input": 42 }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;

    let workspace = Workspace::new();
    let env_input = workspace.root.join("from-env.json");
    let cli_database = workspace.root.join("from-cli.db");
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "database": workspace.root.join("from-file.db").as_str(),
            "routing_base_url": "http://from-file:8080/matrix",
            "routing_concurrency": 2,
        }),
        None,
    );
    composer.push_environment(json!({
        "input": env_input.as_str(),
        "database": workspace.root.join("from-env.db").as_str(),
        "routing_api_key": "from-env",
    }));
    composer.push_cli(json!({
        "database": cli_database.as_str(),
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.input, env_input);
    assert_eq!(config.database, cli_database);
    assert_eq!(config.routing.base_url, "http://from-file:8080/matrix");
    assert_eq!(config.routing.max_concurrency, 2);
    assert_eq!(config.routing.api_key, "from-env");
}

#[rstest]
fn batch_without_user_is_anonymous() {
    let batch = json!({
        "kind": "apartments",
        "items": [apartment(1, 1, 1_500.0, None)],
        "preferences": { "weights": { "price": 100 } },
    });

    let listings = parse(&batch).expect("batch should parse");
    assert_eq!(listings.kind(), ListingKind::Apartments);
    let Listings::Apartments(decoded) = listings else {
        panic!("expected apartments");
    };
    assert_eq!(decoded.viewer, Viewer::Anonymous);
    assert!(decoded.preferences.is_none());
    assert_eq!(decoded.items.len(), 1);
}

#[rstest]
fn batch_with_user_is_registered() {
    let batch = apartments_batch(
        Some(7),
        "pro",
        vec![apartment(1, 7, 1_500.0, Some((0.0, 0.0)))],
        vec![place(1, 7, 0.0, 0.5)],
    );

    let Listings::Apartments(decoded) = parse(&batch).expect("batch should parse") else {
        panic!("expected apartments");
    };
    assert_eq!(
        decoded.viewer,
        Viewer::Registered {
            user: UserId(7),
            tier: Tier::Pro,
        }
    );
    assert_eq!(decoded.places.len(), 1);
}

#[rstest]
fn batch_over_place_limit_is_rejected() {
    let batch = apartments_batch(
        Some(1),
        "free",
        vec![apartment(1, 1, 1_500.0, None)],
        vec![place(1, 1, 0.0, 0.5), place(2, 1, 0.5, 0.0)],
    );

    let err = parse(&batch).expect_err("two places exceed the free tier");
    match err {
        CliError::TooManyPlaces { count, limit, .. } => {
            assert_eq!(count, 2);
            assert_eq!(limit, Tier::Free.place_limit());
        }
        other => panic!("expected TooManyPlaces, found {other:?}"),
    }
}

#[rstest]
fn batch_over_listing_limit_is_rejected() {
    let items = (1..=3)
        .map(|id| apartment(id, 1, 1_000.0, None))
        .collect();
    let batch = apartments_batch(Some(1), "free", items, Vec::new());

    let err = parse(&batch).expect_err("three listings exceed the free tier");
    match err {
        CliError::TooManyListings { count, .. } => assert_eq!(count, 3),
        other => panic!("expected TooManyListings, found {other:?}"),
    }
}

#[rstest]
fn listings_owned_by_others_do_not_count_towards_limits() {
    let items = (1..=3)
        .map(|id| apartment(id, 99, 1_000.0, None))
        .collect();
    let batch = apartments_batch(Some(1), "free", items, Vec::new());

    parse(&batch).expect("foreign listings are not limited");
}

#[rstest]
fn homes_missing_required_fields_fail_to_parse() {
    let batch = json!({
        "kind": "homes",
        "items": [{ "id": 1, "owner": 1, "name": "No price" }],
    });

    let err = parse(&batch).expect_err("home without a price should fail");
    match err {
        CliError::ParseInput { path, .. } => assert_eq!(path, batch_path()),
        other => panic!("expected ParseInput, found {other:?}"),
    }
}

#[rstest]
#[case::weight_above_one_hundred(json!({ "weights": { "distance": 250 } }), "exceeds 100")]
#[case::unknown_factor(json!({ "weights": { "pool": 20 } }), "unknown factor 'pool'")]
fn invalid_preferences_fail_to_parse(
    #[case] preferences: serde_json::Value,
    #[case] expected: &str,
) {
    let mut batch = apartments_batch(
        Some(1),
        "free",
        vec![apartment(1, 1, 1_500.0, None)],
        Vec::new(),
    );
    if let Some(fields) = batch.as_object_mut() {
        fields.insert("preferences".to_owned(), preferences);
    }

    let err = parse(&batch).expect_err("invalid preferences should fail");
    match err {
        CliError::ParseInput { source, .. } => assert!(
            source.to_string().contains(expected),
            "expected '{expected}' in '{source}'"
        ),
        other => panic!("expected ParseInput, found {other:?}"),
    }
}

#[rstest]
fn unknown_kind_fails_to_parse() {
    let batch = json!({ "kind": "boats", "items": [] });

    let err = parse(&batch).expect_err("unknown kind should fail");
    assert!(matches!(err, CliError::ParseInput { .. }));
}

#[rstest]
fn loading_a_missing_batch_reports_the_path() {
    let workspace = Workspace::new();
    let missing = workspace.input();

    let err = load_batch(&missing).expect_err("missing file should error");
    match err {
        CliError::ReadInput { path, .. } => assert_eq!(path, missing),
        other => panic!("expected ReadInput, found {other:?}"),
    }
}

#[rstest]
fn loading_a_batch_reads_from_disk() {
    let workspace = Workspace::new();
    let batch = apartments_batch(Some(1), "free", vec![apartment(1, 1, 900.0, None)], Vec::new());
    write_utf8(&workspace.input(), batch.to_string().as_bytes());

    let listings = load_batch(&workspace.input()).expect("batch should load");
    assert_eq!(listings.kind(), ListingKind::Apartments);
}

#[rstest]
fn report_goes_to_the_writer_without_an_output_path() {
    let mut buffer = Vec::new();

    write_report(None, &mut buffer, &json!({ "resolved": 3 })).expect("report should write");

    let text = String::from_utf8(buffer).expect("utf-8 output");
    assert!(text.ends_with('\n'));
    let value: serde_json::Value = serde_json::from_str(&text).expect("JSON output");
    assert_eq!(value["resolved"], 3);
}

#[rstest]
fn report_goes_to_the_output_path_when_given() {
    let workspace = Workspace::new();
    let output = workspace.output();
    let mut buffer = Vec::new();

    write_report(Some(&output), &mut buffer, &json!({ "resolved": 1 }))
        .expect("report should write");

    assert!(buffer.is_empty());
    let written = std::fs::read_to_string(&output).expect("report file");
    assert!(written.contains("\"resolved\": 1"));
}

#[rstest]
fn cached_report_ranks_by_score_with_unscored_items_last() {
    let scores: BTreeMap<ItemId, f64> = [(ItemId(1), 2.5), (ItemId(2), 9.0)]
        .into_iter()
        .collect();

    let report = ScoreReport::from_lookup(
        vec![ItemId(3), ItemId(1), ItemId(2)],
        ScoreLookup::Cached(scores),
    );

    assert!(report.cached);
    assert_eq!(report.ranked, vec![ItemId(2), ItemId(1), ItemId(3)]);
    assert!(report.breakdowns.is_empty());
}
