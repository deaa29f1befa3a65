//! 领域层（业务核心逻辑）

pub mod model;
pub mod repository;
pub mod service;

pub use model::{
    Chat, ContentKind, DeliveryErrorKind, DeliveryOutcome, Document, EarlyExit, HandlerState,
    InvocationOutcome, InvocationReport, Message, NotificationPayload, PipelineOutcome,
    RecipientAddress, TriggerEvent,
};
pub use repository::{CipherKeySource, ContentCipher, DocumentStore, PushGateway};
pub use service::NotificationDomainService;
