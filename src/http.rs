//! 带截止时间的出站 HTTP 调用
//!
//! 整个交换（发送请求 + 读取响应体）都在同一个 deadline 内完成。超时后
//! `tokio::time::timeout` 会丢弃进行中的 future，底层连接随之取消，计时器
//! 在任何退出路径上都随 future 一起释放。

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use thiserror::Error;

/// 上游返回的原始结果
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("deadline of {} ms elapsed", .0.as_millis())]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
}

/// 发送请求并在 `timeout` 内读完响应体
pub async fn call_with_timeout(
    request: RequestBuilder,
    timeout: Duration,
) -> Result<HttpReply, CallError> {
    let exchange = async {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok::<_, reqwest::Error>(HttpReply { status, body })
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(Ok(reply)) => Ok(reply),
        // reqwest 自身的超时同样归为 deadline 错误
        Ok(Err(e)) if e.is_timeout() => Err(CallError::Timeout(timeout)),
        Ok(Err(e)) => Err(CallError::Network(e)),
        Err(_elapsed) => Err(CallError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn times_out_when_server_never_answers() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            // 保持连接但不回复
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let client = reqwest::Client::new();
        let started = std::time::Instant::now();
        let err = call_with_timeout(
            client.post(format!("http://{addr}/slow")),
            Duration::from_millis(200),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CallError::Timeout(d) if d == Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }

    #[tokio::test]
    async fn connection_refused_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = reqwest::Client::new();
        let err = call_with_timeout(
            client.post(format!("http://{addr}/gone")),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CallError::Network(_)));
    }

    #[tokio::test]
    async fn returns_status_and_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = tokio::io::AsyncReadExt::read(&mut socket, &mut buf).await;
            let body = "not json";
            let resp = format!(
                "HTTP/1.1 503 Service Unavailable\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(resp.as_bytes()).await.unwrap();
        });

        let client = reqwest::Client::new();
        let reply = call_with_timeout(
            client.post(format!("http://{addr}/x")),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(reply.body, "not json");
    }
}
