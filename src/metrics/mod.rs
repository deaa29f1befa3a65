//! # Prometheus 指标收集模块
//!
//! 为通知服务提供统一的 Prometheus 指标收集能力。

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::warn;

/// 全局指标注册表
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// 新消息通知服务指标
pub struct NotifierMetrics {
    /// 处理器调用次数（按结果分类：delivered / skipped / failed）
    pub invocations_total: IntCounterVec,
    /// 单个令牌的投递结果（success / failure）
    pub deliveries_total: IntCounterVec,
    /// 清理的失效令牌数
    pub tokens_pruned_total: IntCounter,
    /// 多播调用耗时（秒）
    pub dispatch_duration_seconds: Histogram,
}

impl NotifierMetrics {
    pub fn new() -> Self {
        let invocations_total = IntCounterVec::new(
            Opts::new(
                "notifier_invocations_total",
                "Total number of notifier invocations by outcome",
            ),
            &["outcome"],
        )
        .expect("Failed to create notifier_invocations_total metric");

        let deliveries_total = IntCounterVec::new(
            Opts::new(
                "notifier_deliveries_total",
                "Total number of per-token delivery results",
            ),
            &["result"],
        )
        .expect("Failed to create notifier_deliveries_total metric");

        let tokens_pruned_total = IntCounter::with_opts(Opts::new(
            "notifier_tokens_pruned_total",
            "Total number of unregistered tokens cleared from user records",
        ))
        .expect("Failed to create notifier_tokens_pruned_total metric");

        let dispatch_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "notifier_dispatch_duration_seconds",
                "Multicast dispatch duration in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )
        .expect("Failed to create notifier_dispatch_duration_seconds metric");

        // 注册指标，忽略重复注册错误（测试中可能会重复创建）
        let _ = REGISTRY.register(Box::new(invocations_total.clone()));
        let _ = REGISTRY.register(Box::new(deliveries_total.clone()));
        let _ = REGISTRY.register(Box::new(tokens_pruned_total.clone()));
        let _ = REGISTRY.register(Box::new(dispatch_duration_seconds.clone()));

        Self {
            invocations_total,
            deliveries_total,
            tokens_pruned_total,
            dispatch_duration_seconds,
        }
    }
}

impl Default for NotifierMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// 获取 Prometheus 指标导出格式
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %err, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
