use thiserror::Error;

/// Failure while parsing a single OpenCover report. Always fatal to that
/// report: no partial coverage is returned.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed XML in {path} at line {line}: {source}")]
    Xml {
        path: String,
        line: u64,
        source: quick_xml::Error,
    },

    #[error("{message} in {path} at line {line}")]
    Invalid {
        message: String,
        path: String,
        line: u64,
    },
}

pub type Result<T> = std::result::Result<T, ParseError>;
