//! Error conversion implementations.
//!
//! Layer errors are folded into the unified [`Error`] kinds: anything wrong
//! with the containers becomes [`Error::CorruptPackage`], while XML problems
//! inside a named part become [`Error::MalformedPart`].

use super::types::Error;
use crate::ole::OleError;
use crate::ooxml::opc::error::OpcError;

impl From<OleError> for Error {
    fn from(err: OleError) -> Self {
        match err {
            OleError::Io(e) => Error::Io(e),
            other => Error::CorruptPackage(other.to_string()),
        }
    }
}

impl From<OpcError> for Error {
    fn from(err: OpcError) -> Self {
        match err {
            OpcError::XmlError { part, message } => Error::MalformedPart {
                part,
                problems: vec![message],
            },
            other => Error::CorruptPackage(other.to_string()),
        }
    }
}

/// Writing XML into a `String` only fails if a `Display` impl does.
impl From<std::fmt::Error> for Error {
    fn from(_: std::fmt::Error) -> Self {
        Error::InvalidOperation("XML write error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opc_xml_error_becomes_malformed_part() {
        let err: Error = OpcError::xml("/xl/workbook.xml", "unexpected EOF").into();
        match err {
            Error::MalformedPart { part, problems } => {
                assert_eq!(part, "/xl/workbook.xml");
                assert_eq!(problems, ["unexpected EOF"]);
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_container_errors_become_corrupt_package() {
        let err: Error = OpcError::PartNotFound("/[Content_Types].xml".into()).into();
        assert!(matches!(err, Error::CorruptPackage(_)));

        let err: Error = OleError::NotOleFile.into();
        assert!(matches!(err, Error::CorruptPackage(_)));
    }
}
