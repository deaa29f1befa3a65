//! 处理器状态与调用结果

use std::fmt;

use chat_push_core::NotifyError;
use thiserror::Error;
use uuid::Uuid;

use super::delivery::DeliveryErrorKind;

/// 处理器状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerState {
    Start,
    ResolveRecipients,
    FetchTokens,
    BuildPayload,
    Dispatch,
    Reconcile,
    Done,
}

impl HandlerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerState::Start => "START",
            HandlerState::ResolveRecipients => "RESOLVE_RECIPIENTS",
            HandlerState::FetchTokens => "FETCH_TOKENS",
            HandlerState::BuildPayload => "BUILD_PAYLOAD",
            HandlerState::Dispatch => "DISPATCH",
            HandlerState::Reconcile => "RECONCILE",
            HandlerState::Done => "DONE",
        }
    }
}

impl fmt::Display for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 正常提前结束（非错误）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EarlyExit {
    /// 触发事件缺少发送者或会话 ID
    #[error("insufficient message data")]
    InsufficientData,
    /// 会话文档不存在
    #[error("chat not found")]
    ChatNotFound,
    /// 会话没有参与者，或排除发送者后没有接收者
    #[error("no recipients")]
    NoRecipients,
    /// 接收者都没有可投递的令牌
    #[error("no deliverable recipients")]
    NoDeliverableRecipients,
}

/// 流水线中断原因
#[derive(Debug, Error)]
pub enum PipelineStop {
    #[error("early exit: {0}")]
    EarlyExit(#[from] EarlyExit),
    #[error(transparent)]
    Failed(#[from] NotifyError),
}

/// 结果对账汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// 令牌已被清空的用户
    pub pruned_users: Vec<String>,
    /// 清理写入失败的用户
    pub failed_cleanups: Vec<String>,
    /// 未处理的其他失败（仅记录）
    pub other_failures: Vec<(String, DeliveryErrorKind)>,
}

/// 一次多播投递的汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub reconciliation: ReconcileSummary,
}

/// 流水线正常完成的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Skipped(EarlyExit),
    Delivered(DeliveryReport),
}

/// 调用结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    Completed(PipelineOutcome),
    /// 调用内致命错误（已记录，不向调用方抛出）
    Failed { state: HandlerState, error: String },
}

/// 单次调用报告，处理器的完成信号
#[derive(Debug, Clone)]
pub struct InvocationReport {
    pub invocation_id: Uuid,
    pub chat_id: String,
    pub message_id: String,
    /// 经过的状态序列，首个为 START，末个为 DONE
    pub transitions: Vec<HandlerState>,
    pub outcome: InvocationOutcome,
    pub finished_at_ms: i64,
}

impl InvocationReport {
    pub fn final_state(&self) -> HandlerState {
        self.transitions.last().copied().unwrap_or(HandlerState::Start)
    }

    pub fn visited(&self, state: HandlerState) -> bool {
        self.transitions.contains(&state)
    }

    pub fn delivery(&self) -> Option<&DeliveryReport> {
        match &self.outcome {
            InvocationOutcome::Completed(PipelineOutcome::Delivered(report)) => Some(report),
            _ => None,
        }
    }

    pub fn early_exit(&self) -> Option<EarlyExit> {
        match &self.outcome {
            InvocationOutcome::Completed(PipelineOutcome::Skipped(exit)) => Some(*exit),
            _ => None,
        }
    }

    /// 指标标签
    pub fn outcome_label(&self) -> &'static str {
        match &self.outcome {
            InvocationOutcome::Completed(PipelineOutcome::Delivered(_)) => "delivered",
            InvocationOutcome::Completed(PipelineOutcome::Skipped(_)) => "skipped",
            InvocationOutcome::Failed { .. } => "failed",
        }
    }
}
