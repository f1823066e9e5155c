use std::fmt;

#[derive(Debug)]
pub enum MedirError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Settings validation error (negative tolerance, zero sigma, etc.).
    ConfigValidation(String),
    /// IO error (settings file read, etc.).
    Io(String),
}

impl fmt::Display for MedirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for MedirError {}

impl From<std::io::Error> for MedirError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
