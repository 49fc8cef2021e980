#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod catalog;
pub mod form;
pub mod listing;
pub mod message;
pub mod model;
pub mod payload;
pub mod wizard;

pub use catalog::{DatabaseServiceDescriptor, ServiceCategory};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use form::{ConnectionFormState, EngineFamily, FormField};
pub use listing::{ListView, Page, Searchable};
pub use payload::{ConnectionPayload, SubmitMode};
pub use wizard::{ConnectionWizard, TestStatus, WizardStep};
