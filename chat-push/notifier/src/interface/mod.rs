//! 接口层（触发事件接入）

pub mod runtime;
pub mod trigger;

pub use runtime::StdinTriggerConsumer;
pub use trigger::decode_trigger;
