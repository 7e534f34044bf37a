pub mod client;
pub mod transport;

pub use client::IngestionClient;
pub use transport::{
    FailingTransport, HttpTransport, IngestRequest, NoopTransport, RecordingTransport, Transport,
};
