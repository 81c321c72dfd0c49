//! # Services
//!
//! The print pipeline stages, each built from explicit collaborators.

pub mod batch_assembly;
pub mod notification;
pub mod print_file;
pub mod print_request_batch;
pub mod print_response;
pub mod statistics;

pub use batch_assembly::{BatchAssemblyService, PrintRequestBatchJob};
pub use notification::{FailedRequest, NotificationKind, NotificationService};
pub use print_file::{PrintBundle, PrintFileFactory};
pub use print_request_batch::PrintRequestBatchService;
pub use print_response::{
    BatchResponse, PrintResponse, PrintResponseFileService, PrintResponseProcessingService,
    PrintResponses,
};
pub use statistics::StatisticsPublisher;
