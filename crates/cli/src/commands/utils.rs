use bootstrap_core::{bootstrap::exit_codes, BootstrapError};
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Config(String),
    Bootstrap(BootstrapError),
}

impl CliError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => exit_codes::SETTINGS_ERROR,
            Self::Bootstrap(e) => e.exit_code(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Bootstrap(e) => write!(f, "{} stage failed: {e}", e.stage()),
        }
    }
}

impl std::error::Error for CliError {}

impl From<BootstrapError> for CliError {
    fn from(error: BootstrapError) -> Self {
        Self::Bootstrap(error)
    }
}

pub type CliResult<T> = Result<T, CliError>;

pub fn print_success(message: &str) {
    eprintln!("[SUCCESS] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

pub fn print_info(message: &str) {
    eprintln!("[INFO] {message}");
}
