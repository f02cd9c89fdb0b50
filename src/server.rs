//! Accept loop.
//!
//! Accepts connections forever on one task, numbers them, and spawns one
//! session task per connection. There is no limit on open connections.

use crate::commands::CommandHandler;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::Store;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Hands out connection ids: 1, 2, 3, ...
///
/// Owned by the accept loop alone, so ids are unique without synchronization.
#[derive(Debug, Default)]
pub struct ConnectionIds {
    last: u64,
}

impl ConnectionIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

/// Serves clients from `listener` until the process exits.
///
/// A failed `accept` is logged and skipped.
pub async fn serve(listener: TcpListener, store: Arc<Store>, stats: Arc<ConnectionStats>) {
    let mut ids = ConnectionIds::new();

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let id = ids.next_id();
                info!(client = id, addr = %addr, "Accepted connection");

                let handler = CommandHandler::new(Arc::clone(&store));
                let stats = Arc::clone(&stats);
                tokio::spawn(handle_connection(id, stream, handler, stats));
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::net::SocketAddr;
    use std::sync::atomic::Ordering;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn create_test_server() -> (SocketAddr, Arc<Store>, Arc<ConnectionStats>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let store = Arc::new(Store::new());
        let stats = Arc::new(ConnectionStats::new());

        tokio::spawn(serve(listener, Arc::clone(&store), Arc::clone(&stats)));

        (addr, store, stats)
    }

    async fn request(client: &mut TcpStream, req: &[u8], reply_len: usize) -> Vec<u8> {
        client.write_all(req).await.unwrap();
        let mut buf = vec![0u8; reply_len];
        client.read_exact(&mut buf).await.unwrap();
        buf
    }

    fn set_cmd(key: &str, value: &str) -> Vec<u8> {
        format!(
            "*3\r\n$3\r\nSET\r\n${}\r\n{}\r\n${}\r\n{}\r\n",
            key.len(),
            key,
            value.len(),
            value
        )
        .into_bytes()
    }

    fn get_cmd(key: &str) -> Vec<u8> {
        format!("*2\r\n$3\r\nGET\r\n${}\r\n{}\r\n", key.len(), key).into_bytes()
    }

    #[test]
    fn test_connection_ids_are_sequential() {
        let mut ids = ConnectionIds::new();
        let issued: Vec<u64> = (0..1000).map(|_| ids.next_id()).collect();

        assert_eq!(&issued[..3], &[1, 2, 3]);
        assert!(issued.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[tokio::test]
    async fn test_set_get() {
        let (addr, _, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        let reply = request(
            &mut client,
            b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$5\r\nhello\r\n",
            5,
        )
        .await;
        assert_eq!(reply, b"+OK\r\n");

        let reply = request(&mut client, b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n", 11).await;
        assert_eq!(reply, b"$5\r\nhello\r\n");
    }

    #[tokio::test]
    async fn test_write_visible_on_other_connection() {
        let (addr, _, _) = create_test_server().await;
        let mut writer = TcpStream::connect(addr).await.unwrap();
        let mut reader = TcpStream::connect(addr).await.unwrap();

        assert_eq!(request(&mut writer, &set_cmd("name", "blue"), 5).await, b"+OK\r\n");
        assert_eq!(
            request(&mut reader, &get_cmd("name"), 10).await,
            b"$4\r\nblue\r\n"
        );
    }

    #[tokio::test]
    async fn test_unknown_command_then_get() {
        let (addr, _, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        let expected = b"-ERR unknown command: FOO\r\n";
        assert_eq!(request(&mut client, b"FOO\r\n", expected.len()).await, expected);

        assert_eq!(request(&mut client, &get_cmd("k"), 6).await, b"$0\r\n\r\n");
    }

    #[tokio::test]
    async fn test_inline_get_closes_connection() {
        let (addr, _, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"GET\r\n").await.unwrap();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).await.unwrap();

        assert_eq!(buf, b"-ERR GET expects 1 argument\r\n");
    }

    #[tokio::test]
    async fn test_protocol_error_closes_connection() {
        let (addr, _, stats) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"*1\r\n").await.unwrap();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).await.unwrap();

        assert_eq!(buf, b"-ERR invalid argument count: 1\r\n");
        assert_eq!(stats.protocol_errors.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let (addr, store, _) = create_test_server().await;
        let values: Vec<String> = (0..16).map(|i| format!("value-{}", i).repeat(32)).collect();

        let tasks: Vec<_> = values
            .iter()
            .cloned()
            .map(|value| {
                tokio::spawn(async move {
                    let mut client = TcpStream::connect(addr).await.unwrap();
                    let reply = request(&mut client, &set_cmd("shared", &value), 5).await;
                    assert_eq!(reply, b"+OK\r\n");
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        let last = store.get(b"shared");
        assert!(values.iter().any(|v| Bytes::from(v.clone()) == last));

        let mut client = TcpStream::connect(addr).await.unwrap();
        let header = format!("${}\r\n", last.len());
        let reply = request(&mut client, &get_cmd("shared"), header.len() + last.len() + 2).await;
        assert_eq!(&reply[header.len()..header.len() + last.len()], &last[..]);
    }

    #[tokio::test]
    async fn test_connection_stats() {
        let (addr, _, stats) = create_test_server().await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        request(&mut client, &set_cmd("a", "1"), 5).await;

        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 1);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 1);
        assert_eq!(stats.commands_processed.load(Ordering::Relaxed), 1);

        drop(client);
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }
}
