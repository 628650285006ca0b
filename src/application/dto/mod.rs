pub mod trace_request;
pub mod trace_response;

pub use trace_request::TraceRequest;
pub use trace_response::TraceResponse;
