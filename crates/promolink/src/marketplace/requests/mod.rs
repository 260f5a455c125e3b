pub mod domain;
pub mod service;

pub use domain::{
    validate_request_input, Request, RequestDraft, RequestId, RequestInput, RequestStatus,
    RequestType,
};
pub use service::{RequestFilter, RequestListing, RequestWorkflow};
