use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::fake::FakeProvider;

fn opts(auth_state_id: Option<&str>) -> ProvisionOptions {
    ProvisionOptions {
        api_key: "sb-key".into(),
        instance_type: "ubuntu".into(),
        auth_state_id: auth_state_id.map(String::from),
    }
}

#[tokio::test]
async fn release_happens_exactly_once() {
    let provider = Arc::new(FakeProvider::default());
    let handle = InstanceHandle::provision(provider.clone(), &opts(None), InstanceTimeouts::default())
        .await
        .unwrap();

    assert!(handle.release().await);
    assert!(!handle.release().await);
    drop(handle);
    tokio::task::yield_now().await;

    assert_eq!(provider.provisions(), 1);
    assert_eq!(provider.releases(), 1);
}

#[tokio::test]
async fn released_handle_refuses_tool_calls() {
    let provider = Arc::new(FakeProvider::default());
    let handle = InstanceHandle::provision(provider, &opts(None), InstanceTimeouts::default())
        .await
        .unwrap();
    handle.release().await;

    let err = handle.computer(&ComputerAction::Screenshot).await.unwrap_err();
    assert_eq!(err, InstanceError::Released);
    assert!(handle.is_released());
}

#[tokio::test]
async fn drop_releases_in_background() {
    let provider = Arc::new(FakeProvider::default());
    let handle = InstanceHandle::provision(provider.clone(), &opts(None), InstanceTimeouts::default())
        .await
        .unwrap();
    drop(handle);

    for _ in 0..50 {
        if provider.releases() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert_eq!(provider.releases(), 1);
}

#[tokio::test]
async fn provision_failure_is_returned() {
    let provider = Arc::new(FakeProvider {
        fail_provision: true,
        ..Default::default()
    });
    let err = InstanceHandle::provision(provider.clone(), &opts(None), InstanceTimeouts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, InstanceError::Provision(_)));
    assert_eq!(provider.releases(), 0);
}

#[tokio::test]
async fn slow_provision_times_out() {
    let provider = Arc::new(FakeProvider {
        provision_delay: Some(Duration::from_millis(200)),
        ..Default::default()
    });
    let timeouts = InstanceTimeouts {
        provision: Duration::from_millis(20),
        release: Duration::from_secs(1),
    };
    let err = InstanceHandle::provision(provider, &opts(None), timeouts)
        .await
        .unwrap_err();
    assert!(matches!(err, InstanceError::Timeout { operation: "provision", .. }));
}

#[tokio::test]
async fn failed_browser_auth_releases_instance() {
    let provider = Arc::new(FakeProvider {
        fail_auth: true,
        ..Default::default()
    });
    let err = InstanceHandle::provision(
        provider.clone(),
        &opts(Some("auth-123")),
        InstanceTimeouts::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, InstanceError::Provision(_)));
    assert_eq!(provider.provisions(), 1);
    assert_eq!(provider.releases(), 1);
}

#[tokio::test]
async fn stream_url_comes_from_provider() {
    let provider = Arc::new(FakeProvider::default());
    let handle = InstanceHandle::provision(provider, &opts(Some("auth-1")), InstanceTimeouts::default())
        .await
        .unwrap();
    assert_eq!(handle.stream_url().await.unwrap(), "https://stream.test/inst-0");
    handle.release().await;
}

#[tokio::test]
async fn stalled_stream_url_times_out() {
    let provider = Arc::new(FakeProvider {
        stall_stream_url: true,
        ..Default::default()
    });
    let timeouts = InstanceTimeouts {
        provision: Duration::from_millis(30),
        release: Duration::from_secs(1),
    };
    let handle = InstanceHandle::provision(provider.clone(), &opts(None), timeouts)
        .await
        .unwrap();

    let err = handle.stream_url().await.unwrap_err();
    assert!(matches!(err, InstanceError::Timeout { operation: "stream url", .. }));
    assert!(handle.release().await);
    assert_eq!(provider.releases(), 1);
}
