#![cfg(test)]

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves `responses` in order, one per connection, then stops accepting.
/// Returns the base url and the raw text of every request received.
pub async fn serve(responses: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(vec![]));

    let received = requests.clone();
    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };

            let mut request = vec![];
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            received.lock().unwrap().push(String::from_utf8_lossy(&request).to_string());

            let response = format!(
                "HTTP/1.1 {} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status, body.len(), body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (base_url, requests)
}

/// Request line of every request, e.g. `GET /v2/blog/staff/posts?api_key=key&npf=true HTTP/1.1`
pub fn request_lines(requests: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    requests.lock().unwrap()
        .iter()
        .map(|r| r.lines().next().unwrap_or_default().to_string())
        .collect()
}

pub fn posts_page(ids: &[i64], total_posts: Option<u64>) -> String {
    let posts: Vec<serde_json::Value> = ids.iter()
        .map(|id| serde_json::json!({"id": id, "id_string": id.to_string()}))
        .collect();
    let mut response = serde_json::json!({"posts": posts});
    if let Some(total) = total_posts {
        response["total_posts"] = total.into();
    }
    serde_json::json!({"meta": {"status": 200, "msg": "OK"}, "response": response}).to_string()
}
