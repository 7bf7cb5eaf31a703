//! Canned HTTP responder for exercising the routing client end to end.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// A local server answering every request with the same response.
pub struct CannedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl CannedServer {
    /// Serve `expected` requests with `status` and a JSON `body`, then stop.
    pub fn start(status: u16, body: &str, expected: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
        let address = listener.local_addr().expect("listener address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\n\
             Content-Length: {length}\r\nConnection: close\r\n\r\n{body}",
            reason = if status == 200 { "OK" } else { "Error" },
            length = body.len(),
        );
        let handle = std::thread::spawn(move || {
            for stream in listener.incoming().take(expected) {
                let mut stream = stream.expect("accept connection");
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
                let mut request_line = String::new();
                reader.read_line(&mut request_line).expect("read request line");
                loop {
                    let mut header = String::new();
                    let read = reader.read_line(&mut header).expect("read header");
                    if read == 0 || header == "\r\n" {
                        break;
                    }
                }
                seen.lock()
                    .expect("request log")
                    .push(request_line.trim_end().to_owned());
                stream
                    .write_all(response.as_bytes())
                    .expect("write response");
            }
        });
        Self {
            base_url: format!("http://{address}/maps/api/distancematrix/json"),
            requests,
            handle: Some(handle),
        }
    }

    /// Endpoint to configure the client with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Wait for the server to finish serving and return the request lines
    /// it saw, such as `GET /path?query HTTP/1.1`.
    pub fn join(mut self) -> Vec<String> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("server thread");
        }
        self.requests.lock().expect("request log").clone()
    }
}
