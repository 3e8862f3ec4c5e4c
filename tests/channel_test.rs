use pointer_accel::channel::{self, ChannelError, FileEndpoint, MemoryEndpoint};
use pointer_accel::service::{ServiceError, ServiceSettings, SettingsHandle};
use pointer_accel::settings::{WireError, RECORD_SIZE};
use pointer_accel::{AccelArgs, GainMode, Modifier, Settings, SharedModifier, Vec2};
use std::sync::Arc;
use std::time::Duration;

fn profile() -> Settings {
    Settings {
        rotation_degrees: 12.5,
        apply_acceleration: true,
        combine_axes: false,
        modes: Vec2::new(GainMode::Gudermannian, GainMode::Tanh),
        accel_params: Vec2::new(
            AccelArgs {
                motivity: 1.8,
                synchronous_speed: 8.0,
                gamma: 0.7,
                hard_cap: 4.0,
            },
            AccelArgs::default(),
        ),
        sensitivity: Vec2::new(0.9, 1.1),
        min_time_ms: 0.25,
    }
}

#[test]
fn file_endpoint_round_trips_a_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("active.bin");
    let endpoint = FileEndpoint::create(&path, &Settings::default()).unwrap();

    assert_eq!(channel::read(&endpoint).unwrap(), Settings::default());

    channel::write(&endpoint, &profile()).unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), RECORD_SIZE as u64);
    assert_eq!(channel::read(&endpoint).unwrap(), profile());

    let modifier = Modifier::from_active(&endpoint).unwrap();
    assert_eq!(modifier, Modifier::new(&profile()));
}

#[test]
fn missing_file_reads_as_not_installed() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = FileEndpoint::new(dir.path().join("absent.bin"));

    let err = channel::read(&endpoint).unwrap_err();
    assert!(err.is_not_installed());
    assert!(channel::write(&endpoint, &profile()).unwrap_err().is_not_installed());
    assert!(!dir.path().join("absent.bin").exists());
}

#[test]
fn truncated_file_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.bin");
    std::fs::write(&path, [0u8; 40]).unwrap();

    match channel::read(&FileEndpoint::new(&path)) {
        Err(ChannelError::MalformedRecord(WireError::Length { expected, actual })) => {
            assert_eq!(expected, RECORD_SIZE);
            assert_eq!(actual, 40);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn failed_request_still_closes_the_handle() {
    let endpoint = MemoryEndpoint::new(Settings::default());
    endpoint.fail_requests(Some(31));

    match channel::write(&endpoint, &profile()) {
        Err(ChannelError::Io { code, .. }) => assert_eq!(code, Some(31)),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(endpoint.open_count(), 1);
    assert_eq!(endpoint.close_count(), 1);
    assert_eq!(endpoint.stored(), Some(Settings::default()));
}

#[tokio::test]
async fn service_applies_profile_through_file_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("active.bin");
    let endpoint = FileEndpoint::create(&path, &Settings::default()).unwrap();

    let modifier = Arc::new(SharedModifier::default());
    let mut handle = SettingsHandle::spawn(
        Arc::new(endpoint.clone()),
        modifier.clone(),
        ServiceSettings {
            write_delay: Duration::from_millis(10),
            ..ServiceSettings::default()
        },
    );

    handle.write_active(profile()).await.unwrap();
    assert_eq!(**modifier.load(), Modifier::new(&profile()));
    assert_eq!(handle.read_active().await.unwrap(), profile());

    handle.shutdown().await.unwrap();
    assert_eq!(channel::read(&endpoint).unwrap(), profile());
}

#[tokio::test]
async fn service_reports_missing_driver() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = FileEndpoint::new(dir.path().join("absent.bin"));

    let mut handle = SettingsHandle::spawn(
        Arc::new(endpoint),
        Arc::new(SharedModifier::default()),
        ServiceSettings::default(),
    );

    match handle.write_active(profile()).await {
        Err(ServiceError::Channel(err)) => assert!(err.is_not_installed()),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(handle.modifier().version(), 0);
    handle.shutdown().await.unwrap();
}
