//! 标准输入触发事件消费者（每行一个 JSON 事件）

use std::sync::Arc;

use chat_push_core::error::{ErrorBuilder, ErrorCode, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use super::trigger::decode_trigger;
use crate::application::{NotificationCommandHandler, NotifyNewMessageCommand};
use crate::domain::model::InvocationReport;

/// 默认同时处理的事件数
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// 逐行读取事件，每个事件独立并发处理
pub struct StdinTriggerConsumer {
    handler: Arc<NotificationCommandHandler>,
    max_in_flight: usize,
}

impl StdinTriggerConsumer {
    pub fn new(handler: Arc<NotificationCommandHandler>) -> Self {
        Self {
            handler,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub async fn run(&self) -> Result<()> {
        info!(max_in_flight = self.max_in_flight, "Starting trigger consumer on stdin");
        self.consume(BufReader::new(tokio::io::stdin())).await
    }

    /// 读取过程中持续回收已完成的调用，输入结束后等待剩余调用完成
    pub async fn consume<R>(&self, reader: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut inflight = JoinSet::new();
        let mut accepted = 0usize;
        let mut rejected = 0usize;

        loop {
            if inflight.len() >= self.max_in_flight {
                if let Some(joined) = inflight.join_next().await {
                    reap(joined);
                }
                continue;
            }

            tokio::select! {
                Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                    reap(joined);
                }
                line = lines.next_line() => {
                    let line = line.map_err(|e| {
                        ErrorBuilder::new(
                            ErrorCode::ServiceUnavailable,
                            "failed to read trigger input",
                        )
                        .details(e.to_string())
                        .build_error()
                    })?;
                    let Some(line) = line else {
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    match decode_trigger(line.as_bytes()) {
                        Ok(event) => {
                            accepted += 1;
                            let handler = Arc::clone(&self.handler);
                            inflight.spawn(async move {
                                handler
                                    .handle_new_message(NotifyNewMessageCommand::new(event))
                                    .await
                            });
                        }
                        Err(e) => {
                            rejected += 1;
                            warn!(error = %e, "Dropping undecodable trigger event");
                        }
                    }
                }
            }
        }

        while let Some(joined) = inflight.join_next().await {
            reap(joined);
        }

        info!(accepted, rejected, "Trigger input exhausted");
        Ok(())
    }
}

fn reap(joined: std::result::Result<InvocationReport, JoinError>) {
    match joined {
        Ok(report) => debug!(
            invocation_id = %report.invocation_id,
            outcome = report.outcome_label(),
            "Invocation finished"
        ),
        Err(e) => error!(error = %e, "Invocation task join error"),
    }
}
