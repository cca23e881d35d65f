//! Rendered artifacts and result presentation

pub mod formatter;
pub mod renderer;

pub use formatter::{formatter_for, ConsoleFormatter, JsonFormatter, OutputFormatter};
pub use renderer::FileDocumentRenderer;
