//! 基础设施层（Repository impl）

pub mod cipher;
pub mod gateway;
pub mod store;

#[cfg(test)]
pub(crate) mod http_stub;

pub use cipher::{AesEcbCipher, ConfiguredKeySource};
pub use gateway::{FcmPushGateway, NoopPushGateway, PushGatewayRef, build_push_gateway};
pub use store::{
    DocumentStoreRef, FirestoreDocumentStore, InMemoryDocumentStore, build_document_store,
};
