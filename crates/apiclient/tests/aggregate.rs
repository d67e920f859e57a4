//! Fan-out behaviour of [`ScopedAggregator`] and [`Client::get_all_volumes`] and its filtered forms.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use apiclient::{
    ApiError, Client, ClientConfig, ErrorKind, ScopedAggregator, Transport,
    UnauthorisedScopePolicy,
};
use common::{ns_id, status, vol_id, volume, FakeTransport};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

fn ids(volumes: &[apiclient::Volume]) -> BTreeSet<String> {
    volumes.iter().map(|v| v.id.to_string()).collect()
}

fn client(transport: FakeTransport) -> Client {
    Client::new(Arc::new(transport), ClientConfig::default())
}

#[tokio::test]
async fn merges_every_namespace_when_all_succeed() {
    let transport = FakeTransport::new()
        .with_namespace("ns-a", vec![volume("v1", "one", "ns-a", "1")])
        .with_namespace(
            "ns-b",
            vec![
                volume("v2", "two", "ns-b", "1"),
                volume("v3", "three", "ns-b", "1"),
            ],
        )
        .with_namespace("ns-c", vec![]);

    let volumes = client(transport).get_all_volumes(&[]).await.unwrap();

    assert_eq!(volumes.len(), 3);
    assert_eq!(ids(&volumes), BTreeSet::from(["v1".into(), "v2".into(), "v3".into()]));
}

#[tokio::test]
async fn no_namespaces_yields_empty_result() {
    let volumes = client(FakeTransport::new()).get_all_volumes(&[]).await.unwrap();
    assert!(volumes.is_empty());
}

#[tokio::test]
async fn unauthorised_namespace_is_skipped() {
    let transport = FakeTransport::new()
        .with_namespace("ns-a", vec![volume("v1", "one", "ns-a", "1")])
        .failing("ns-b", status(403, "forbidden"))
        .with_namespace("ns-c", vec![volume("v2", "two", "ns-c", "1")]);

    let volumes = client(transport).get_all_volumes(&[]).await.unwrap();

    assert_eq!(ids(&volumes), BTreeSet::from(["v1".into(), "v2".into()]));
}

#[tokio::test]
async fn denied_namespaces_are_reported_by_the_aggregator() {
    let transport = Arc::new(
        FakeTransport::new()
            .with_namespace("ns-a", vec![volume("v1", "one", "ns-a", "1")])
            .failing("ns-b", status(403, "forbidden")),
    );
    let aggregator = ScopedAggregator::new(
        transport,
        UnauthorisedScopePolicy::Skip,
        CancellationToken::new(),
    );

    let aggregation = aggregator
        .collect_all(|t, ns| async move { t.list_volumes(&ns).await })
        .await
        .unwrap();

    assert_eq!(aggregation.denied, vec![ns_id("ns-b")]);
    assert_eq!(ids(&aggregation.items), BTreeSet::from(["v1".into()]));
}

#[tokio::test]
async fn all_unauthorised_is_empty_under_skip_policy() {
    let transport = FakeTransport::new()
        .failing("ns-a", status(403, "forbidden"))
        .failing("ns-b", status(403, "forbidden"));

    let volumes = client(transport).get_all_volumes(&[]).await.unwrap();
    assert!(volumes.is_empty());
}

#[tokio::test]
async fn all_unauthorised_fails_under_fail_policy() {
    let transport = FakeTransport::new()
        .failing("ns-a", status(403, "forbidden"))
        .failing("ns-b", status(403, "forbidden"));
    let config = ClientConfig {
        unauthorised_scopes: UnauthorisedScopePolicy::Fail,
        ..ClientConfig::default()
    };

    let err = Client::new(Arc::new(transport), config)
        .get_all_volumes(&[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorised);
}

#[tokio::test]
async fn fail_policy_still_returns_partial_visibility() {
    let transport = FakeTransport::new()
        .with_namespace("ns-a", vec![volume("v1", "one", "ns-a", "1")])
        .failing("ns-b", status(403, "forbidden"));
    let config = ClientConfig {
        unauthorised_scopes: UnauthorisedScopePolicy::Fail,
        ..ClientConfig::default()
    };

    let volumes = Client::new(Arc::new(transport), config)
        .get_all_volumes(&[])
        .await
        .unwrap();
    assert_eq!(ids(&volumes), BTreeSet::from(["v1".into()]));
}

#[tokio::test]
async fn other_failure_aborts_without_partial_results() {
    let transport = FakeTransport::new()
        .with_namespace("ns-a", vec![volume("v1", "one", "ns-a", "1")])
        .failing("ns-b", status(503, "store unavailable"))
        .with_namespace("ns-c", vec![volume("v2", "two", "ns-c", "1")]);

    let err = client(transport).get_all_volumes(&[]).await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Store {
            details: Some("store unavailable".into())
        }
    );
}

#[tokio::test]
async fn first_failure_cancels_slow_namespaces() {
    let transport = Arc::new(
        FakeTransport::new()
            .failing("ns-a", status(500, "boom"))
            .with_namespace("ns-slow", vec![volume("v1", "one", "ns-slow", "1")])
            .delay_namespace("ns-slow", Duration::from_millis(150)),
    );
    let client = Client::new(transport.clone(), ClientConfig::default());

    let err = client.get_all_volumes(&[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server);

    // Outlive the slow listing; a leaked task would have recorded it by now.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(transport.completed_listings(), vec![ns_id("ns-a")]);
}

#[tokio::test]
async fn namespace_listing_failure_aborts() {
    let transport = FakeTransport::new()
        .with_namespace("ns-a", vec![volume("v1", "one", "ns-a", "1")])
        .namespaces_fail_with(status(401, "token expired"));

    let err = client(transport).get_all_volumes(&[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn unmapped_failure_passes_through_unchanged() {
    let transport = FakeTransport::new().failing(
        "ns-a",
        apiclient::TransportError::Request {
            message: "connection reset".into(),
        },
    );

    let err = client(transport).get_all_volumes(&[]).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Transport(apiclient::TransportError::Request {
            message: "connection reset".into()
        })
    );
}

#[tokio::test]
async fn deadline_cancels_outstanding_namespaces() {
    let transport = Arc::new(
        FakeTransport::new()
            .with_namespace("ns-slow", vec![volume("v1", "one", "ns-slow", "1")])
            .delay_namespace("ns-slow", Duration::from_millis(150)),
    );
    let config = ClientConfig {
        command_timeout: Some(Duration::from_millis(50)),
        ..ClientConfig::default()
    };

    let err = Client::new(transport.clone(), config)
        .get_all_volumes(&[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(transport.completed_listings().is_empty());
}

#[tokio::test]
async fn caller_cancellation_stops_aggregation() {
    let transport = Arc::new(
        FakeTransport::new()
            .with_namespace("ns-slow", vec![])
            .delay_namespace("ns-slow", Duration::from_millis(150)),
    );
    let client = Client::new(transport.clone(), ClientConfig::default());
    let token = client.cancellation_token();

    let handle = tokio::spawn({
        let client = client.clone();
        async move { client.get_all_volumes(&[]).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();

    let err = handle.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(transport.completed_listings().is_empty());
}

// ---------------------------------------------------------------------------
// Filters applied after aggregation
// ---------------------------------------------------------------------------

fn spread_volumes() -> FakeTransport {
    FakeTransport::new()
        .with_namespace("ns-a", vec![volume("v1", "logs", "ns-a", "1")])
        .failing("ns-b", status(403, "forbidden"))
        .with_namespace(
            "ns-c",
            vec![
                volume("v2", "data", "ns-c", "1"),
                volume("v3", "cache", "ns-c", "1"),
            ],
        )
}

#[tokio::test]
async fn ids_are_selected_across_namespaces_in_request_order() {
    let volumes = client(spread_volumes())
        .get_all_volumes(&[vol_id("v3"), vol_id("v1")])
        .await
        .unwrap();

    let ids: Vec<_> = volumes.iter().map(|v| v.id.to_string()).collect();
    assert_eq!(ids, vec!["v3".to_string(), "v1".to_string()]);
}

#[tokio::test]
async fn id_missing_from_every_namespace_is_not_found() {
    let err = client(spread_volumes())
        .get_all_volumes(&[vol_id("v1"), vol_id("v9")])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "volume with ID v9 not found");
}

#[tokio::test]
async fn names_are_selected_across_namespaces() {
    let volumes = client(spread_volumes())
        .get_all_volumes_by_name(&["data", "logs"])
        .await
        .unwrap();

    let namespaces: Vec<_> = volumes.iter().map(|v| v.namespace.to_string()).collect();
    assert_eq!(namespaces, vec!["ns-c".to_string(), "ns-a".to_string()]);
}

#[tokio::test]
async fn name_shared_across_namespaces_is_ambiguous() {
    let transport = FakeTransport::new()
        .with_namespace("ns-a", vec![volume("v1", "data", "ns-a", "1")])
        .with_namespace("ns-b", vec![volume("v2", "data", "ns-b", "1")]);

    let err = client(transport)
        .get_all_volumes_by_name(&["data"])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AmbiguousName);
}

#[tokio::test]
async fn aggregation_failure_wins_over_filtering() {
    let transport = FakeTransport::new()
        .with_namespace("ns-a", vec![volume("v1", "logs", "ns-a", "1")])
        .failing("ns-b", status(503, "store unavailable"));

    let err = client(transport)
        .get_all_volumes(&[vol_id("v1")])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Store);
}
