pub mod payload;
pub mod responses;

pub use payload::{parse_object, PayloadError};
pub use responses::{GeneratedData, GeneratedResponse, SummaryResponse};
