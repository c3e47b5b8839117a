//!
//! src/testserver.rs  Andrew Belles  Oct 19th, 2026
//!
//! Plain-HTTP listener on 127.0.0.1 for adapter tests. Each connection
//! gets one response chosen from the request path, then is closed.
//!

use reqwest::Client;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

/// Maps a request path (with query) to a status and JSON body
pub type Route = fn(&str) -> (u16, String);

/// Binds an ephemeral port and answers every connection through `route`.
/// Returns `http://127.0.0.1:{port}/`.
pub async fn serve(route: Route) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(answer(stream, route));
        }
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// Client that never routes loopback traffic through an env proxy
pub fn direct_client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

async fn answer(stream: TcpStream, route: Route) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();

    let mut content_length = 0;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 || line == "\r\n" {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    // drain the body so closing does not reset the connection
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).await?;

    let (status, payload) = route(&path);
    let response = format!(
        "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
