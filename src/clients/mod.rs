//! # External Collaborators
//!
//! Ports for the systems the pipeline reads from or writes to but does not
//! own: photo storage, the ERO directory and the email transport.

pub mod email;
pub mod ero_directory;
pub mod object_storage;

pub use email::{EmailNotSentError, EmailSender, InMemoryEmailSender, QueuedEmailSender, SentEmail};
pub use ero_directory::{EroDirectory, StaticEroDirectory};
pub use object_storage::{InMemoryObjectStorage, LocalObjectStorage, ObjectLocation, ObjectStorage};
