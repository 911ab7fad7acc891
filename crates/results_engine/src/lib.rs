//! Results engine: portal IO, response decoding and PDF persistence.
mod client;
mod decode;
mod filename;
mod persist;
mod types;

pub use client::{ClientSettings, CycleObserver, LogObserver, PortalClient, ResultsPortal};
pub use decode::{decode_page, DecodedPage};
pub use filename::pdf_filename;
pub use persist::{ensure_output_dir, save_pdf, AtomicFileWriter, PersistError};
pub use types::{CycleUpdate, FailureKind, FetchError, FetchedResults, PdfDocument};
