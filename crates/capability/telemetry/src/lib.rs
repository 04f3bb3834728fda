//! 追踪初始化、请求 ID 生成与网关计数器。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 网关计数器快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_accepted: u64,
    pub connections_rejected: u64,
    pub packets_received: u64,
    pub format_errors: u64,
    pub responses_sent: u64,
    pub responses_skipped: u64,
    pub response_failures: u64,
    pub bus_requests: u64,
    pub bus_failures: u64,
}

/// 网关计数器。
#[derive(Debug, Default)]
pub struct TelemetryMetrics {
    connections_accepted: AtomicU64,
    connections_rejected: AtomicU64,
    packets_received: AtomicU64,
    format_errors: AtomicU64,
    responses_sent: AtomicU64,
    responses_skipped: AtomicU64,
    response_failures: AtomicU64,
    bus_requests: AtomicU64,
    bus_failures: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            format_errors: self.format_errors.load(Ordering::Relaxed),
            responses_sent: self.responses_sent.load(Ordering::Relaxed),
            responses_skipped: self.responses_skipped.load(Ordering::Relaxed),
            response_failures: self.response_failures.load(Ordering::Relaxed),
            bus_requests: self.bus_requests.load(Ordering::Relaxed),
            bus_failures: self.bus_failures.load(Ordering::Relaxed),
        }
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局计数器实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id（每个入站数据包一个）。
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 记录通过安全检查的连接。
pub fn record_connection_accepted() {
    metrics()
        .connections_accepted
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录被拒绝的连接（含远端地址无法解析）。
pub fn record_connection_rejected() {
    metrics()
        .connections_rejected
        .fetch_add(1, Ordering::Relaxed);
}

pub fn record_packet_received() {
    metrics().packets_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录被丢弃的格式错误数据包。
pub fn record_format_error() {
    metrics().format_errors.fetch_add(1, Ordering::Relaxed);
}

pub fn record_response_sent() {
    metrics().responses_sent.fetch_add(1, Ordering::Relaxed);
}

/// 记录因连接已关闭而跳过的响应。
pub fn record_response_skipped() {
    metrics().responses_skipped.fetch_add(1, Ordering::Relaxed);
}

pub fn record_response_failure() {
    metrics().response_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录总线读写请求次数。
pub fn record_bus_request() {
    metrics().bus_requests.fetch_add(1, Ordering::Relaxed);
}

/// 记录总线请求未确认或出错。
pub fn record_bus_failure() {
    metrics().bus_failures.fetch_add(1, Ordering::Relaxed);
}
