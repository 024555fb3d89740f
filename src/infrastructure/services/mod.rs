//! Infrastructure services

mod provisioning_service;
mod query_service;
mod upload_service;

pub use provisioning_service::{
    KnowledgeBaseProvisioner, ProvisionRequest, ProvisionedKnowledgeBase,
};
pub use query_service::QueryService;
pub use upload_service::{DirectoryUploader, UploadReport, UploadedObject};
