use thiserror::Error;

use crate::site::ValueSite;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns `true` if the value explicitly opted out of byte access.
    ///
    /// This is the sticky "forbidden" flag: callers may treat intentionally
    /// opaque values differently from malformed input.
    pub fn is_forbidden(&self) -> bool {
        matches!(self.kind(), ErrorKind::ExplicitlyForbidden { .. })
    }

    /// Returns the value the failure is attributed to, if any.
    pub fn site(&self) -> Option<&ValueSite> {
        match self.kind() {
            ErrorKind::InvalidArgument { .. } => None,
            ErrorKind::NoProtocolSupport { site }
            | ErrorKind::ExplicitlyForbidden { site }
            | ErrorKind::UnregisteredProvider { site, .. }
            | ErrorKind::NotAddressable { site, .. }
            | ErrorKind::BoundsCheckFailed { site, .. }
            | ErrorKind::SizeMismatch { site, .. }
            | ErrorKind::StridesUnavailable { site }
            | ErrorKind::TooManyResultsFromProvider { site, .. }
            | ErrorKind::DelegationTooDeep { site, .. }
            | ErrorKind::DelegationFailed { site, .. }
            | ErrorKind::ProviderFailed { site, .. } => Some(site),
        }
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn no_protocol_support(site: ValueSite) -> Error {
        ErrorKind::NoProtocolSupport { site }.into()
    }

    pub fn forbidden(site: ValueSite) -> Error {
        ErrorKind::ExplicitlyForbidden { site }.into()
    }

    pub fn unregistered_provider(site: ValueSite, provider: usize) -> Error {
        ErrorKind::UnregisteredProvider { site, provider }.into()
    }

    pub fn not_addressable(site: ValueSite, reason: impl Into<String>) -> Error {
        ErrorKind::NotAddressable {
            site,
            reason: reason.into(),
        }
        .into()
    }

    pub fn bounds_check(site: ValueSite, offset: i64, length: usize) -> Error {
        ErrorKind::BoundsCheckFailed {
            site,
            offset,
            length,
        }
        .into()
    }

    pub fn size_mismatch(site: ValueSite, length: usize, required: &[usize]) -> Error {
        ErrorKind::SizeMismatch {
            site,
            length: Some(length),
            required: required.to_vec(),
        }
        .into()
    }

    /// A size requirement was rejected before any bytes were extracted.
    pub fn size_rejected(site: ValueSite, required: &[usize]) -> Error {
        ErrorKind::SizeMismatch {
            site,
            length: None,
            required: required.to_vec(),
        }
        .into()
    }

    pub fn strides_unavailable(site: ValueSite) -> Error {
        ErrorKind::StridesUnavailable { site }.into()
    }

    pub fn too_many_results(site: ValueSite, count: usize) -> Error {
        ErrorKind::TooManyResultsFromProvider { site, count }.into()
    }

    pub fn delegation_too_deep(site: ValueSite, limit: usize) -> Error {
        ErrorKind::DelegationTooDeep { site, limit }.into()
    }

    pub fn delegation_failed(site: ValueSite, source: StdErrorBoxed) -> Error {
        ErrorKind::DelegationFailed { site, source }.into()
    }

    pub fn provider_failed(
        site: ValueSite,
        provider: impl Into<String>,
        message: impl Into<String>,
    ) -> Error {
        ErrorKind::ProviderFailed {
            site,
            provider: provider.into(),
            message: message.into(),
        }
        .into()
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("unable to read bytes from {site}")]
    NoProtocolSupport { site: ValueSite },

    #[error("byte access is forbidden for {site}")]
    ExplicitlyForbidden { site: ValueSite },

    #[error("unregistered reader {provider:#x} attached to {site}")]
    UnregisteredProvider { site: ValueSite, provider: usize },

    #[error("cannot point to {site}: {reason}")]
    NotAddressable { site: ValueSite, reason: String },

    #[error("offset {offset} fails bounds check for {site} of length {length}")]
    BoundsCheckFailed {
        site: ValueSite,
        offset: i64,
        length: usize,
    },

    #[error("{site} {}, expected one of {required:?}", describe_length(*length))]
    SizeMismatch {
        site: ValueSite,
        length: Option<usize>,
        required: Vec<usize>,
    },

    #[error("strides required but unavailable for {site}")]
    StridesUnavailable { site: ValueSite },

    #[error("too many results ({count}) produced for {site}")]
    TooManyResultsFromProvider { site: ValueSite, count: usize },

    #[error("delegation too deep (limit {limit}) at {site}")]
    DelegationTooDeep { site: ValueSite, limit: usize },

    #[error("delegation failed for {site}: {source}")]
    DelegationFailed {
        site: ValueSite,
        source: StdErrorBoxed,
    },

    #[error("reader '{provider}' failed for {site}: {message}")]
    ProviderFailed {
        site: ValueSite,
        provider: String,
        message: String,
    },
}

fn describe_length(length: Option<usize>) -> String {
    match length {
        Some(length) => format!("has {length} bytes"),
        None => "cannot provide the requested size".to_string(),
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_flag() {
        let site = ValueSite::new("userdata").at(Some(2));
        assert!(Error::forbidden(site.clone()).is_forbidden());
        assert!(!Error::no_protocol_support(site).is_forbidden());
    }

    #[test]
    fn test_messages_name_the_value() {
        let site = ValueSite::new("userdata").at(Some(1));
        assert_eq!(
            Error::no_protocol_support(site.clone()).to_string(),
            "unable to read bytes from userdata at index 1"
        );
        assert_eq!(
            Error::bounds_check(site.clone(), 9, 4).to_string(),
            "offset 9 fails bounds check for userdata at index 1 of length 4"
        );
        assert_eq!(
            Error::size_mismatch(site, 6, &[4, 8]).to_string(),
            "userdata at index 1 has 6 bytes, expected one of [4, 8]"
        );
    }

    #[test]
    fn test_size_rejected_message() {
        let err = Error::size_rejected(ValueSite::new("userdata"), &[3, 4]);
        assert_eq!(
            err.to_string(),
            "userdata cannot provide the requested size, expected one of [3, 4]"
        );
    }

    #[test]
    fn test_site_accessor() {
        let site = ValueSite::new("table").with_depth(3);
        let err = Error::delegation_too_deep(site.clone(), 32);
        assert_eq!(err.site(), Some(&site));
        assert!(Error::invalid_arg("x", "y").site().is_none());
    }
}
