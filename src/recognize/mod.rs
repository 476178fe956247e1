pub mod client;
pub mod operation;

pub use client::{BatchRecognizeRequest, RecognitionClient};
pub use operation::{Operation, OperationError};
