use thiserror::Error;

/// Result type for workbook I/O.
pub type WorkbookResult<T> = Result<T, WorkbookError>;

/// Errors raised while reading an `.xlsx` package.
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// Underlying I/O error (file not found, permission denied, ...).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a readable ZIP container.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A package part is not well-formed XML.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An XML attribute could not be parsed.
    #[error("xml attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// A part every workbook must have is missing.
    #[error("required part not found: {0}")]
    MissingPart(String),

    /// The XML is well-formed but does not describe a valid workbook.
    #[error("malformed workbook: {0}")]
    Malformed(String),
}

impl WorkbookError {
    /// `true` when the failure originates in the filesystem.
    pub fn is_io(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Archive(zip::result::ZipError::Io(_)) => true,
            Self::Xml(quick_xml::Error::Io(_)) => true,
            _ => false,
        }
    }
}
