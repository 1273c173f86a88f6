//! End-to-end session against an in-process fake Arakoon node, exercising
//! the blocking dispatcher across several distinct commands in one
//! connection, including a sequence/transaction and a fatal-fault path.
#![cfg(feature = "sync")]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use arakoon_impl::blocking::Connection;
use arakoon_impl::{
    ArakoonBytes, ArakoonError, ConnectParams, ConnectionState, Encode, Get, Hello, Sequence, Set,
    Step, Transaction,
};

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

fn success(payload: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
    let mut reply = 0u32.to_le_bytes().to_vec();
    payload(&mut reply);
    reply
}

#[test]
fn hello_set_get_and_sequence_round_trip_in_one_session() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let cluster_id = read_prologue(&mut stream);
        assert_eq!(cluster_id, b"demo_cluster");

        let _hello = read_one_request(&mut stream);
        stream
            .write_all(&success(|out| ArakoonBytes::from("FakeRakoon/1.0").encode(out)))
            .unwrap();

        let _set = read_one_request(&mut stream);
        stream.write_all(&success(|_| {})).unwrap();

        let _get = read_one_request(&mut stream);
        stream
            .write_all(&success(|out| ArakoonBytes::from("v1").encode(out)))
            .unwrap();

        let _sequence = read_one_request(&mut stream);
        stream.write_all(&success(|_| {})).unwrap();
    });

    let params = ConnectParams::builder()
        .cluster_id("demo_cluster")
        .host(addr.ip().to_string())
        .port(addr.port())
        .client_id("integration_test")
        .build()
        .unwrap();
    let conn = Connection::connect(&params).unwrap();

    let banner = conn
        .call(&Hello::new("integration_test", "demo_cluster"), false)
        .unwrap();
    assert_eq!(banner, ArakoonBytes::from("FakeRakoon/1.0"));

    conn.call(&Set::new("k1", "v1"), false).unwrap();
    let value = conn.call(&Get::new("k1"), true).unwrap();
    assert_eq!(value, ArakoonBytes::from("v1"));

    let tx = Transaction::new(vec![Step::set("k2", "v2"), Step::assert_exists("k1")]);
    conn.call(&Sequence(tx), false).unwrap();

    assert_eq!(conn.state(), ConnectionState::Connected);
    server.join().unwrap();
}

#[test]
fn a_closed_socket_mid_session_faults_the_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_prologue(&mut stream);
        let _hello = read_one_request(&mut stream);
        stream
            .write_all(&success(|out| ArakoonBytes::from("FakeRakoon/1.0").encode(out)))
            .unwrap();
        // Drop the socket instead of answering the next request.
        let _next = read_one_request(&mut stream);
    });

    let params = ConnectParams::builder()
        .cluster_id("demo_cluster")
        .host(addr.ip().to_string())
        .port(addr.port())
        .build()
        .unwrap();
    let conn = Connection::connect(&params).unwrap();
    conn.call(&Hello::new("integration_test", "demo_cluster"), false)
        .unwrap();

    let err = conn.call(&Get::new("k1"), true).unwrap_err();
    assert!(err.is_fatal_to_connection());
    assert_eq!(conn.state(), ConnectionState::Disconnected);
    assert!(matches!(
        conn.call(&Get::new("k1"), true).unwrap_err(),
        ArakoonError::NotConnected
    ));
    server.join().unwrap();
}
