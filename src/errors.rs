use std::{fmt, io, str::Utf8Error};
use quick_xml::events::attributes::AttrError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source document could not be parsed.
    MalformedInput,
    /// A shaped record failed schema validation.
    SchemaViolation,
    /// An attribute the shaper relies on was absent or empty.
    MissingAttribute,
    Io,
    Config,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::MalformedInput, message)
    }

    pub fn missing_attribute(element: &str, attribute: &str) -> Self {
        Error::new(
            ErrorKind::MissingAttribute,
            format!("<{}> element is missing required attribute '{}'", element, attribute),
        )
    }

    pub fn schema_violation(field: &str, detail: &str) -> Self {
        Error::new(
            ErrorKind::SchemaViolation,
            format!("Field '{}' has the following errors: {}", field, detail),
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::new(ErrorKind::Io, value.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(value: quick_xml::Error) -> Self {
        Error::malformed(value.to_string())
    }
}

impl From<AttrError> for Error {
    fn from(value: AttrError) -> Self {
        Error::malformed(value.to_string())
    }
}

impl From<Utf8Error> for Error {
    fn from(value: Utf8Error) -> Self {
        Error::malformed(value.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::new(ErrorKind::Io, value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::new(ErrorKind::Config, value.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(value: regex::Error) -> Self {
        Error::new(ErrorKind::Config, value.to_string())
    }
}

/// Ad-hoc messages are treated as `Io`, the catch-all kind. Anything else
/// goes through `Error::new` with an explicit kind.
impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::new(ErrorKind::Io, value)
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::new(ErrorKind::Io, value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_violation_names_the_field() {
        let err = Error::schema_violation("node.uid", "must be of integer type");
        assert_eq!(err.kind, ErrorKind::SchemaViolation);
        assert!(err.message.contains("node.uid"));
        assert!(err.message.contains("must be of integer type"));
    }

    #[test]
    fn plain_messages_fall_back_to_io() {
        let err: Error = "disk full".into();
        assert_eq!(err.kind, ErrorKind::Io);
        let err: Error = String::from("disk full").into();
        assert_eq!(err.kind, ErrorKind::Io);
    }

    #[test]
    fn quick_xml_errors_are_malformed_input() {
        let err: Error = quick_xml::Error::UnexpectedEof("osm".to_string()).into();
        assert_eq!(err.kind, ErrorKind::MalformedInput);
    }
}
