//! Connection pooling via `r2d2`, gated the same way the facade module is.
#![cfg(feature = "r2d2_pool")]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use arakoon::{ArakoonResult, ConnectParams, ConnectionManager};

fn read_prologue(stream: &mut TcpStream) {
    let mut head = [0u8; 12];
    stream.read_exact(&mut head).unwrap();
    let len = u32::from_le_bytes(head[8..12].try_into().unwrap()) as usize;
    let mut cluster_id = vec![0u8; len];
    stream.read_exact(&mut cluster_id).unwrap();
}

fn read_one_request(stream: &mut TcpStream) {
    let mut buf = [0u8; 64];
    let _ = stream.read(&mut buf).unwrap();
}

/// `get_key_count`'s reply: success code followed by an 8-byte `Uint64`.
fn key_count_reply(n: u64) -> Vec<u8> {
    let mut reply = 0u32.to_le_bytes().to_vec();
    reply.extend_from_slice(&n.to_le_bytes());
    reply
}

#[test]
fn many_workers_share_a_pool_of_connections() -> ArakoonResult<()> {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let no_of_workers: u32 = 8;

    let server = thread::spawn(move || {
        for _ in 0..no_of_workers {
            let (mut stream, _) = listener.accept().unwrap();
            read_prologue(&mut stream);
            read_one_request(&mut stream); // get_key_count
            stream.write_all(&key_count_reply(42)).unwrap();
        }
    });

    let params = ConnectParams::builder()
        .cluster_id("demo_cluster")
        .host(addr.ip().to_string())
        .port(addr.port())
        .build()?;
    let pool = r2d2::Pool::builder()
        .max_size(no_of_workers)
        .test_on_check_out(false)
        .build(ConnectionManager::new(params))
        .unwrap();

    let mut worker_handles: Vec<JoinHandle<u64>> = Vec::new();
    for _ in 0..no_of_workers {
        let pool = pool.clone();
        worker_handles.push(thread::spawn(move || {
            let conn = pool.get().unwrap();
            conn.get_key_count().unwrap()
        }));
    }

    for handle in worker_handles {
        assert_eq!(handle.join().unwrap(), 42);
    }

    server.join().unwrap();
    Ok(())
}
