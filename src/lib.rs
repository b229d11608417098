pub mod db;
pub mod error;
pub mod http_server;
pub mod interpreter;
pub mod report;
pub mod settings;
pub mod storage;

pub use error::{InterpretError, StorageError};
pub use interpreter::{interpret_file, interpret_reader, ParsedReport, QualityGate};
pub use report::render_report;
