//! End-to-end sessions against an in-process fake Arakoon node, exercised
//! through the public facade rather than the shared wire-level crate.
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use arakoon::{ArakoonBytes, ArakoonError, ConnectParams, ConnectionState, Connection, Step};

fn read_prologue(stream: &mut TcpStream) -> Vec<u8> {
    let mut head = [0u8; 12];
    stream.read_exact(&mut head).unwrap();
    let len = u32::from_le_bytes(head[8..12].try_into().unwrap()) as usize;
    let mut cluster_id = vec![0u8; len];
    stream.read_exact(&mut cluster_id).unwrap();
    cluster_id
}

fn read_one_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = vec![0u8; 4096];
    let n = stream.read(&mut buf).unwrap();
    buf.truncate(n);
    buf
}

fn ok(payload: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
    let mut reply = 0u32.to_le_bytes().to_vec();
    payload(&mut reply);
    reply
}

fn err(code: u32, message: &str) -> Vec<u8> {
    let mut reply = code.to_le_bytes().to_vec();
    ArakoonBytes::from(message).encode_for_test(&mut reply);
    reply
}

// `ArakoonBytes` already implements the wire `Encode` trait in
// `arakoon_impl`, but that trait isn't re-exported by this crate (callers
// of the facade never encode anything themselves); this local helper
// reproduces the one encoding this test file needs.
trait EncodeForTest {
    fn encode_for_test(&self, out: &mut Vec<u8>);
}

impl EncodeForTest for ArakoonBytes {
    fn encode_for_test(&self, out: &mut Vec<u8>) {
        let bytes: &[u8] = self.as_ref();
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(bytes);
    }
}

fn connect_params(addr: std::net::SocketAddr) -> ConnectParams {
    ConnectParams::builder()
        .cluster_id("demo_cluster")
        .host(addr.ip().to_string())
        .port(addr.port())
        .client_id("integration_test")
        .build()
        .unwrap()
}

#[test]
fn hello_set_exists_get_and_delete_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_prologue(&mut stream);

        read_one_request(&mut stream); // hello
        stream
            .write_all(&ok(|out| ArakoonBytes::from("FakeRakoon/1.0").encode_for_test(out)))
            .unwrap();

        read_one_request(&mut stream); // set
        stream.write_all(&ok(|_| {})).unwrap();

        read_one_request(&mut stream); // exists
        stream.write_all(&ok(|out| out.push(1))).unwrap();

        read_one_request(&mut stream); // get
        stream
            .write_all(&ok(|out| ArakoonBytes::from("value").encode_for_test(out)))
            .unwrap();

        read_one_request(&mut stream); // delete
        stream.write_all(&ok(|_| {})).unwrap();

        read_one_request(&mut stream); // get again, now missing
        stream.write_all(&err(0x05, "key not found")).unwrap();
    });

    let conn = Connection::connect(&connect_params(addr)).unwrap();
    let banner = conn.hello("integration_test", "demo_cluster").unwrap();
    assert_eq!(banner, ArakoonBytes::from("FakeRakoon/1.0"));

    conn.set("key", "value").unwrap();
    assert!(conn.exists("key").unwrap());
    assert_eq!(conn.get("key").unwrap(), ArakoonBytes::from("value"));

    conn.delete("key").unwrap();
    let not_found = conn.get("key").unwrap_err();
    assert!(matches!(not_found, ArakoonError::Server { code: 0x05, .. }));
    assert_eq!(not_found.kind(), Some(arakoon::ErrorKind::NotFound));
    // A server-level error leaves the connection usable.
    assert_eq!(conn.state(), ConnectionState::Connected);

    server.join().unwrap();
}

#[test]
fn prefix_scan_returns_every_matching_key() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let keys: Vec<ArakoonBytes> = (0..100).map(|i| ArakoonBytes::from(format!("key_{i}").as_str())).collect();
    let expected = keys.clone();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_prologue(&mut stream);
        read_one_request(&mut stream); // prefix
        stream
            .write_all(&ok(|out| {
                out.extend_from_slice(&(expected.len() as u32).to_le_bytes());
                for key in &expected {
                    key.encode_for_test(out);
                }
            }))
            .unwrap();
    });

    let conn = Connection::connect(&connect_params(addr)).unwrap();
    let mut found = conn.prefix("key_").unwrap();
    found.sort_by(|a, b| a.0.cmp(&b.0));
    let mut wanted = keys;
    wanted.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(found, wanted);

    server.join().unwrap();
}

#[test]
fn test_and_set_creates_updates_then_deletes() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_prologue(&mut stream);

        read_one_request(&mut stream); // test_and_set(None, "value")
        stream.write_all(&ok(|out| out.push(0))).unwrap(); // None before

        read_one_request(&mut stream); // test_and_set("value", "value2")
        stream
            .write_all(&ok(|out| {
                out.push(1);
                ArakoonBytes::from("value").encode_for_test(out);
            }))
            .unwrap();

        read_one_request(&mut stream); // test_and_set("value2", None)
        stream
            .write_all(&ok(|out| {
                out.push(1);
                ArakoonBytes::from("value2").encode_for_test(out);
            }))
            .unwrap();
    });

    let conn = Connection::connect(&connect_params(addr)).unwrap();
    let before = conn
        .test_and_set("taskey", None, Some(ArakoonBytes::from("value")))
        .unwrap();
    assert_eq!(before, None);

    let before = conn
        .test_and_set(
            "taskey",
            Some(ArakoonBytes::from("value")),
            Some(ArakoonBytes::from("value2")),
        )
        .unwrap();
    assert_eq!(before, Some(ArakoonBytes::from("value")));

    let before = conn
        .test_and_set("taskey", Some(ArakoonBytes::from("value2")), None)
        .unwrap();
    assert_eq!(before, Some(ArakoonBytes::from("value2")));

    server.join().unwrap();
}

#[test]
fn a_sequence_is_applied_atomically() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_prologue(&mut stream);
        read_one_request(&mut stream);
        stream.write_all(&ok(|_| {})).unwrap();
    });

    let conn = Connection::connect(&connect_params(addr)).unwrap();
    let steps = vec![
        Step::set("a", "1"),
        Step::delete("a"),
        Step::set("a", "2"),
        Step::sequence(vec![
            Step::delete("a"),
            Step::set("a", "3"),
            Step::assert("a", Some(ArakoonBytes::from("3"))),
            Step::assert("b", None),
        ]),
    ];
    conn.sequence(steps).unwrap();

    server.join().unwrap();
}

#[test]
fn a_sequence_deleting_a_missing_key_fails_without_faulting() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_prologue(&mut stream);
        read_one_request(&mut stream);
        stream.write_all(&err(0x05, "key not found")).unwrap();
    });

    let conn = Connection::connect(&connect_params(addr)).unwrap();
    let result = conn.sequence(vec![Step::delete("missing")]);
    assert!(result.is_err());
    assert_eq!(conn.state(), ConnectionState::Connected);

    server.join().unwrap();
}

#[test]
fn connection_loss_faults_and_future_calls_fail_fast() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_prologue(&mut stream);
        // Drop the socket without ever answering.
        read_one_request(&mut stream);
    });

    let conn = Connection::connect(&connect_params(addr)).unwrap();
    let err = conn.get("k").unwrap_err();
    assert!(err.is_fatal_to_connection());
    assert_eq!(conn.state(), ConnectionState::Disconnected);
    assert!(matches!(conn.get("k").unwrap_err(), ArakoonError::NotConnected));

    server.join().unwrap();
}
