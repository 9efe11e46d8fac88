use thiserror::Error;

/// Main error type for the part tally crate.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum PartTallyError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),

    // Grid module errors
    #[error("{0}")]
    CoordinateError(#[from] crate::grid::reference::CoordinateError),

    // Source module errors
    #[error("{0}")]
    SourceError(#[from] crate::source::SourceError),

    #[error("{0}")]
    XmlHelperError(#[from] crate::source::xml::XmlError),

    // Settings errors
    #[error("{0}")]
    SettingsError(#[from] crate::settings::SettingsError),
}

pub trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, PartTallyError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| PartTallyError::WithContextError(format!("{}: {}", message, e)))
    }
}
