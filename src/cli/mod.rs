pub mod commands;
pub mod output;
pub mod progress;

pub use commands::Cli;
pub use output::Output;
pub use progress::Progress;
