/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current UTC time as an RFC 3339 string (print server `createdAt`)
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
