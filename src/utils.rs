use std::time::{SystemTime, UNIX_EPOCH};

/// 获取当前Unix时间戳(秒)
pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// 拼接 base URL 与端点路径，忽略 base 末尾多余的斜杠
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
