//! # Models
//!
//! Printable document aggregate and the print requests it owns.

pub mod ero;
pub mod print_request;
pub mod printable_document;
pub mod status_history;

pub use ero::{Address, ElectoralRegistrationOffice, EroContactDetails};
pub use print_request::{
    CertificateFormat, CertificateLanguage, Delivery, DeliveryAddressType, DeliveryClass,
    PrintRequest,
};
pub use printable_document::{DocumentKind, PrintableDocument, SourceType};
pub use status_history::{PrintRequestStatusEntry, StatusHistory};
