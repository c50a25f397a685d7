pub mod batch;
pub mod counter;
pub mod decider;
pub mod request;
pub mod responder;
pub mod response;
pub mod router;
pub mod service;
