//! 领域模型

pub mod chat;
pub mod delivery;
pub mod document;
pub mod message;
pub mod notification;
pub mod outcome;
pub mod secret;

pub use chat::{AddressBook, Chat, RecipientAddress};
pub use delivery::{DeliveryErrorKind, DeliveryOutcome, SendResponse};
pub use document::Document;
pub use message::{ContentKind, Message, MessageDocument, TriggerEvent, TriggerParams};
pub use notification::{DeliveryHints, MessagePriority, NotificationMetadata, NotificationPayload};
pub use outcome::{
    DeliveryReport, EarlyExit, HandlerState, InvocationOutcome, InvocationReport,
    PipelineOutcome, PipelineStop, ReconcileSummary,
};
pub use secret::{CipherKey, DecryptError};
