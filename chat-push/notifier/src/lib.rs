//! 新消息推送通知服务
//!
//! 监听新建的聊天消息，向会话中除发送者外的参与者推送通知，
//! 并清理推送网关报告为已注销的令牌。

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod service;

pub use application::{NotificationCommandHandler, NotifyNewMessageCommand};
pub use config::NotifierConfig;
pub use domain::service::{NotificationDomainService, NotificationPolicy};
pub use service::{ApplicationContext, initialize};
