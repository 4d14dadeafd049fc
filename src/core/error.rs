use std::io;

#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("config error: {0}")]
    Config(String),
    #[error("bundle error: {0}")]
    Bundle(String),
    #[error("output error: {0}")]
    Output(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            ScanError::Output(err.to_string())
        } else {
            ScanError::Bundle(err.to_string())
        }
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        ScanError::Config(err.to_string())
    }
}

impl From<regex::Error> for ScanError {
    fn from(err: regex::Error) -> Self {
        ScanError::Config(err.to_string())
    }
}
