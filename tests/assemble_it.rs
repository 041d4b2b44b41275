mod common;

// std
use std::time::{Duration as StdDuration, Instant};
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::*;
use embed_broker::{
	auth::{Secret, UserIdentity},
	error::Error,
	flows::EmbedConfigAssembler,
	http::ApiClient,
	powerbi::PowerBiApi,
	provider::AccessToken,
};

fn assembler(server: &MockServer) -> EmbedConfigAssembler {
	let http = ApiClient::new().expect("Test transport should build.");

	EmbedConfigAssembler::new(PowerBiApi::new(server_url(server), http))
}

fn access_token() -> AccessToken {
	AccessToken {
		value: Secret::new("aad-token"),
		token_type: "Bearer".into(),
		expires_in_seconds: 3599,
	}
}

#[tokio::test]
async fn assembly_runs_both_calls_concurrently() {
	let server = MockServer::start_async().await;
	let report = server
		.mock_async(|when, then| {
			when.method(GET).path(REPORT_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(REPORT_BODY)
				.delay(StdDuration::from_millis(100));
		})
		.await;
	let generate = server
		.mock_async(|when, then| {
			when.method(POST).path(GENERATE_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(GENERATE_BODY)
				.delay(StdDuration::from_millis(100));
		})
		.await;
	let started = Instant::now();
	let configuration = assembler(&server)
		.assemble(&access_token(), WORKSPACE_ID, REPORT_ID, None)
		.await
		.expect("Assembly against the mock API should succeed.");
	let elapsed = started.elapsed();

	// Two sequential 100ms calls would take >=200ms.
	assert!(elapsed < StdDuration::from_millis(180), "assembly took {elapsed:?}");
	assert_eq!(configuration.access_token, "t1");

	report.assert_async().await;
	generate.assert_async().await;
}

#[tokio::test]
async fn assembly_merges_the_documented_payload_exactly() {
	let server = MockServer::start_async().await;
	let _report = server
		.mock_async(|when, then| {
			when.method(GET).path(REPORT_PATH);
			then.status(200).header("content-type", "application/json").body(REPORT_BODY);
		})
		.await;
	let _generate = server
		.mock_async(|when, then| {
			when.method(POST).path(GENERATE_PATH);
			then.status(200).header("content-type", "application/json").body(GENERATE_BODY);
		})
		.await;
	let configuration = assembler(&server)
		.assemble(&access_token(), WORKSPACE_ID, REPORT_ID, None)
		.await
		.expect("Assembly against the mock API should succeed.");
	let payload =
		serde_json::to_value(&configuration).expect("Configuration should serialize.");

	assert_eq!(
		payload,
		json!({
			"type": "report",
			"id": "r1",
			"embedUrl": "https://x",
			"accessToken": "t1",
			"tokenId": "k1",
			"expiration": "2099-01-01T00:00:00Z",
			"settings": {
				"filterPaneVisible": false,
				"pageNavigationVisible": true,
				"statusBarVisible": false,
			},
		}),
	);
}

#[tokio::test]
async fn identity_binding_shapes_the_outbound_mint_body() {
	let server = MockServer::start_async().await;
	let _report = server
		.mock_async(|when, then| {
			when.method(GET).path(REPORT_PATH);
			then.status(200).header("content-type", "application/json").body(REPORT_BODY);
		})
		.await;
	let bound = server
		.mock_async(|when, then| {
			when.method(POST).path(GENERATE_PATH).json_body(json!({
				"accessLevel": "View",
				"allowSaveAs": false,
				"identities": [{ "username": "user-1", "roles": [], "datasets": [] }],
			}));
			then.status(200).header("content-type", "application/json").body(GENERATE_BODY);
		})
		.await;
	let identity = UserIdentity::new("user-1", "u@x.io").expect("Identity fixture should be valid.");

	assembler(&server)
		.assemble(&access_token(), WORKSPACE_ID, REPORT_ID, Some(&identity))
		.await
		.expect("Bound assembly should succeed.");

	bound.assert_async().await;
}

#[tokio::test]
async fn anonymous_mint_omits_the_identities_field() {
	let server = MockServer::start_async().await;
	let _report = server
		.mock_async(|when, then| {
			when.method(GET).path(REPORT_PATH);
			then.status(200).header("content-type", "application/json").body(REPORT_BODY);
		})
		.await;
	let anonymous = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(GENERATE_PATH)
				.json_body(json!({ "accessLevel": "View", "allowSaveAs": false }));
			then.status(200).header("content-type", "application/json").body(GENERATE_BODY);
		})
		.await;

	assembler(&server)
		.assemble(&access_token(), WORKSPACE_ID, REPORT_ID, None)
		.await
		.expect("Anonymous assembly should succeed.");

	anonymous.assert_async().await;
}

#[tokio::test]
async fn first_failure_aborts_without_waiting_for_the_slower_call() {
	let server = MockServer::start_async().await;
	let _report = server
		.mock_async(|when, then| {
			when.method(GET).path(REPORT_PATH);
			then.status(500).body("boom");
		})
		.await;
	let _generate = server
		.mock_async(|when, then| {
			when.method(POST).path(GENERATE_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(GENERATE_BODY)
				.delay(StdDuration::from_millis(300));
		})
		.await;
	let started = Instant::now();
	let err = assembler(&server)
		.assemble(&access_token(), WORKSPACE_ID, REPORT_ID, None)
		.await
		.expect_err("Metadata failure should abort the assembly.");
	let elapsed = started.elapsed();

	assert!(matches!(err, Error::UpstreamApi { status: 500, .. }));
	assert!(elapsed < StdDuration::from_millis(200), "abort took {elapsed:?}");
}

#[tokio::test]
async fn malformed_mint_response_fails_the_whole_assembly() {
	let server = MockServer::start_async().await;
	let _report = server
		.mock_async(|when, then| {
			when.method(GET).path(REPORT_PATH);
			then.status(200).header("content-type", "application/json").body(REPORT_BODY);
		})
		.await;
	let _generate = server
		.mock_async(|when, then| {
			when.method(POST).path(GENERATE_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token\":\"t1\",\"expiration\":\"2099-01-01T00:00:00Z\"}");
		})
		.await;
	let err = assembler(&server)
		.assemble(&access_token(), WORKSPACE_ID, REPORT_ID, None)
		.await
		.expect_err("Mint response without tokenId should fail the assembly.");

	assert!(matches!(err, Error::MalformedUpstream(_)));
}
