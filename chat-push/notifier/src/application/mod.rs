//! 应用层（命令编排）

pub mod commands;
pub mod handlers;

pub use commands::NotifyNewMessageCommand;
pub use handlers::NotificationCommandHandler;
