//! Precondition checks on named arguments.

use url::Url;

use crate::envelope::RequestId;
use crate::error::ProxyError;

/// Checks named arguments against fixed preconditions.
///
/// Each check walks `(name, value)` pairs in order and reports the first
/// failing pair. Names are shown with underscores replaced by spaces, so
/// `event_provider` reads as "event provider".
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentValidator;

impl ArgumentValidator {
    /// Requires every value to be present.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::ContractFailed`] naming the first absent
    /// argument.
    pub fn require_non_null<'a, T, I>(arguments: I) -> Result<(), ProxyError>
    where
        T: ?Sized + 'a,
        I: IntoIterator<Item = (&'a str, Option<&'a T>)>,
    {
        for (name, value) in arguments {
            if value.is_none() {
                return Err(ProxyError::contract_failed(format!(
                    "{} is not available",
                    display_name(name)
                )));
            }
        }
        Ok(())
    }

    /// Requires every value to be an absolute URL with a scheme and a host.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::ProxyProviderMissingOrInvalid`] naming the
    /// first absent or unusable endpoint.
    pub fn require_valid_endpoint<'a, I>(arguments: I) -> Result<(), ProxyError>
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        for (name, value) in arguments {
            let Some(endpoint) = value else {
                return Err(ProxyError::provider_missing_or_invalid(format!(
                    "{} is not available",
                    display_name(name)
                )));
            };
            if !is_endpoint(endpoint) {
                return Err(ProxyError::provider_missing_or_invalid(format!(
                    "{} is not a valid url",
                    display_name(name)
                )));
            }
        }
        Ok(())
    }

    /// Requires every value to be a hex string of exactly `length`
    /// characters. Either letter case is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::InvalidParameterFormatOrValue`] carrying
    /// `request_id` and naming the first offending argument.
    pub fn require_hex_of_length<'a, I>(
        request_id: &RequestId,
        length: usize,
        arguments: I,
    ) -> Result<(), ProxyError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, value) in arguments {
            if !is_hex_of_length(value, length) {
                return Err(ProxyError::invalid_parameter(
                    Some(request_id.clone()),
                    format!(
                        "{} {value} is not a valid hex string of length {length}",
                        display_name(name)
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn display_name(name: &str) -> String {
    name.replace('_', " ")
}

fn is_endpoint(candidate: &str) -> bool {
    Url::parse(candidate).is_ok_and(|url| {
        !url.scheme().is_empty() && url.host_str().is_some_and(|host| !host.is_empty())
    })
}

fn is_hex_of_length(value: &str, length: usize) -> bool {
    value.len() == length && value.bytes().all(|byte| byte.is_ascii_hexdigit())
}
