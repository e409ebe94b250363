use std::fmt;

#[derive(Debug)]
pub enum QrSheetError {
    InvalidConfiguration(String),
    Io(std::io::Error),
}

impl fmt::Display for QrSheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QrSheetError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            QrSheetError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for QrSheetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QrSheetError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for QrSheetError {
    fn from(value: std::io::Error) -> Self {
        QrSheetError::Io(value)
    }
}
