use std::net::UdpSocket;
use std::thread;
use std::time::Duration;

use approx::assert_relative_eq;
use kestrel::{
    AircraftState, ControlInputs, SimError, TelemetryConfig, TelemetryPublisher,
    TelemetrySnapshot,
};
use nalgebra::Vector3;

fn ephemeral_publisher(update_rate: f64) -> TelemetryPublisher {
    TelemetryPublisher::new(TelemetryConfig {
        port: 0,
        update_rate,
    })
}

fn sample_snapshot() -> TelemetrySnapshot {
    let mut state = AircraftState::default();
    state.position = Vector3::new(1.5, -2.5, -100.0);
    state.velocity = Vector3::new(15.0, 0.0, -0.5);
    let controls = ControlInputs {
        throttle: 0.8,
        aileron: 0.1,
        elevator: -0.05,
        rudder: 0.0,
    };
    TelemetrySnapshot::at_time(42.125, &state, &controls)
}

#[test]
fn test_subscriber_receives_wire_datagram() {
    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();

    let mut publisher = ephemeral_publisher(100.0);
    publisher.add_subscriber(receiver.local_addr().unwrap());
    publisher.start().unwrap();

    let sent = sample_snapshot();
    publisher.ingest(sent);

    let mut buf = [0u8; 512];
    let (len, _) = receiver.recv_from(&mut buf).unwrap();
    publisher.stop();

    let line = std::str::from_utf8(&buf[..len]).unwrap();
    let received = TelemetrySnapshot::from_wire(line).expect("datagram should parse");

    assert_relative_eq!(received.timestamp, sent.timestamp, epsilon = 1e-6);
    assert_relative_eq!(received.position_down, sent.position_down, epsilon = 1e-6);
    assert_relative_eq!(received.velocity_x, sent.velocity_x, epsilon = 1e-6);
    assert_relative_eq!(received.throttle, sent.throttle, epsilon = 1e-6);
}

#[test]
fn test_register_and_unregister_datagrams() {
    let mut publisher = ephemeral_publisher(100.0);
    publisher.start().unwrap();
    let port = publisher.local_addr().unwrap().port();

    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    client
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();

    client.send_to(b"REGISTER", ("127.0.0.1", port)).unwrap();
    thread::sleep(Duration::from_millis(200));
    assert_eq!(publisher.subscriber_count(), 1);

    // Registering the same endpoint again keeps a single entry
    client.send_to(b"REGISTER", ("127.0.0.1", port)).unwrap();
    thread::sleep(Duration::from_millis(200));
    assert_eq!(publisher.subscriber_count(), 1);

    // A registered client receives telemetry
    publisher.ingest(sample_snapshot());
    let mut buf = [0u8; 512];
    let (len, _) = client.recv_from(&mut buf).unwrap();
    assert!(TelemetrySnapshot::from_wire(std::str::from_utf8(&buf[..len]).unwrap()).is_some());

    client.send_to(b"UNREGISTER", ("127.0.0.1", port)).unwrap();
    thread::sleep(Duration::from_millis(200));
    assert_eq!(publisher.subscriber_count(), 0);

    // Unknown datagrams are ignored, not fatal
    client.send_to(b"HELLO?", ("127.0.0.1", port)).unwrap();
    thread::sleep(Duration::from_millis(200));
    assert_eq!(publisher.subscriber_count(), 0);

    publisher.stop();
}

#[test]
fn test_send_failure_does_not_stop_other_subscribers() {
    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();

    let mut publisher = ephemeral_publisher(100.0);
    // A subscriber nobody listens on; the datagram is sent into the void
    // (or rejected) without affecting the live receiver after it
    publisher.add_subscriber("127.0.0.1:1".parse().unwrap());
    publisher.add_subscriber(receiver.local_addr().unwrap());
    publisher.start().unwrap();

    publisher.ingest(sample_snapshot());

    let mut buf = [0u8; 512];
    let result = receiver.recv_from(&mut buf);
    publisher.stop();

    assert!(result.is_ok(), "live subscriber should still receive");
    // The failing endpoint is not evicted
    assert_eq!(publisher.subscriber_count(), 2);
}

#[test]
fn test_double_start_is_a_lifecycle_error() {
    let mut publisher = ephemeral_publisher(10.0);
    publisher.start().unwrap();
    assert!(matches!(publisher.start(), Err(SimError::Lifecycle(_))));
    publisher.stop();
}

#[test]
fn test_stop_is_idempotent_and_allows_restart() {
    let mut publisher = ephemeral_publisher(10.0);
    publisher.stop();
    publisher.start().unwrap();
    publisher.stop();
    publisher.stop();
    publisher.start().unwrap();
    publisher.stop();
}

#[test]
fn test_bind_failure_aborts_startup() {
    let holder = UdpSocket::bind("0.0.0.0:0").unwrap();
    let taken_port = holder.local_addr().unwrap().port();

    let mut publisher = TelemetryPublisher::new(TelemetryConfig {
        port: taken_port,
        update_rate: 10.0,
    });

    assert!(matches!(publisher.start(), Err(SimError::Io(_))));
    assert!(!publisher.is_running());
}
