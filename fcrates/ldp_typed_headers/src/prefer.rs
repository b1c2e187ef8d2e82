//! I define [`Prefer`] and [`PreferenceApplied`] typed headers.
//!

use std::{fmt::Display, str::FromStr};

use headers::{Header, HeaderName};
use tracing::error;

use crate::common::field::{is_token, parse_param, split_csv, split_semis};

/// Constant for `prefer` header-name.
pub static PREFER: HeaderName = HeaderName::from_static("prefer");

/// Constant for `preference-applied` header-name.
pub static PREFERENCE_APPLIED: HeaderName = HeaderName::from_static("preference-applied");

/// The `return` preference, defined in
/// [rfc7240](https://datatracker.ietf.org/doc/html/rfc7240#section-4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferReturn {
    /// Prefer a full representation in the response.
    Representation,

    /// Prefer a minimal response.
    Minimal,
}

impl PreferReturn {
    /// Token of the return preference value.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Representation => "representation",
            Self::Minimal => "minimal",
        }
    }
}

impl FromStr for PreferReturn {
    type Err = InvalidEncodedPrefer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "representation" => Ok(Self::Representation),
            "minimal" => Ok(Self::Minimal),
            _ => Err(InvalidEncodedPrefer::InvalidMemberValue("return")),
        }
    }
}

/// The `handling` preference, defined in
/// [rfc7240](https://datatracker.ietf.org/doc/html/rfc7240#section-4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferHandling {
    /// Strict processing.
    Strict,

    /// Lenient processing.
    Lenient,
}

impl PreferHandling {
    /// Token of the handling preference value.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

impl FromStr for PreferHandling {
    type Err = InvalidEncodedPrefer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(InvalidEncodedPrefer::InvalidMemberValue("handling")),
        }
    }
}

/// `Prefer` header, defined in
/// [rfc7240](https://datatracker.ietf.org/doc/html/rfc7240).
///
/// ```txt
///     Prefer     = "Prefer" ":" 1#preference
///     preference = token [ BWS "=" BWS word ]
///                 *( OWS ";" [ OWS parameter ] )
///     parameter  = token [ BWS "=" BWS word ]
/// ```
///
/// Recognized members are `return`, `include`, `omit`, `wait`,
/// `respond-async` and `handling`. Unrecognized preferences are
/// ignored as the rfc instructs; malformed ones fail decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefer {
    /// The `return` preference.
    pub preferred_return: Option<PreferReturn>,

    /// Iris of the `include` member.
    pub include: Vec<String>,

    /// Iris of the `omit` member.
    pub omit: Vec<String>,

    /// The `wait` preference, in seconds.
    pub wait: Option<u32>,

    /// If the `respond-async` preference is set.
    pub respond_async: bool,

    /// The `handling` preference.
    pub handling: Option<PreferHandling>,
}

/// Error of an invalid encoded `Prefer` header.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InvalidEncodedPrefer {
    /// A preference token is not a valid token.
    #[error("Given header value has a malformed preference token.")]
    MalformedPreference,

    /// A recognized member carries an invalid value.
    #[error("Given header value has an invalid value for the `{0}` member.")]
    InvalidMemberValue(&'static str),
}

impl Header for Prefer {
    #[inline]
    fn name() -> &'static HeaderName {
        &PREFER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        Self: Sized,
        I: Iterator<Item = &'i headers::HeaderValue>,
    {
        let mut prefer = Prefer::default();

        for preference_str in values.flat_map(split_csv) {
            prefer.apply_preference(preference_str).map_err(|e| {
                error!("Error in parsing Prefer header. Error:\n {}", e);
                headers::Error::invalid()
            })?;
        }

        Ok(prefer)
    }

    fn encode<E: Extend<headers::HeaderValue>>(&self, values: &mut E) {
        values.extend(std::iter::once(
            self.str_encode()
                .parse()
                .expect("prefer value is always a valid HeaderValue"),
        ));
    }
}

impl Prefer {
    /// A `Prefer: return=representation` value.
    pub fn return_representation() -> Self {
        Self {
            preferred_return: Some(PreferReturn::Representation),
            ..Default::default()
        }
    }

    /// A `Prefer: return=minimal` value.
    pub fn return_minimal() -> Self {
        Self {
            preferred_return: Some(PreferReturn::Minimal),
            ..Default::default()
        }
    }

    /// Apply one `preference` production. The preference token and
    /// each of its parameters go through the same member rules.
    fn apply_preference(&mut self, preference_str: &str) -> Result<(), InvalidEncodedPrefer> {
        for part in split_semis(preference_str) {
            let (name, value) =
                parse_param(part).ok_or(InvalidEncodedPrefer::MalformedPreference)?;
            debug_assert!(is_token(&name));
            self.apply_member(&name, &value)?;
        }
        Ok(())
    }

    fn apply_member(&mut self, name: &str, value: &str) -> Result<(), InvalidEncodedPrefer> {
        match name {
            "return" => self.preferred_return = Some(value.parse()?),
            "include" => self
                .include
                .extend(value.split_whitespace().map(ToOwned::to_owned)),
            "omit" => self
                .omit
                .extend(value.split_whitespace().map(ToOwned::to_owned)),
            "wait" => {
                self.wait = Some(
                    value
                        .parse()
                        .map_err(|_| InvalidEncodedPrefer::InvalidMemberValue("wait"))?,
                )
            }
            "respond-async" => self.respond_async = true,
            "handling" => self.handling = Some(value.parse()?),
            // Unrecognized preferences are ignored.
            _ => {}
        }
        Ok(())
    }

    /// Get encoded string representation.
    pub fn str_encode(&self) -> String {
        let mut members: Vec<String> = Vec::new();
        if let Some(preferred_return) = self.preferred_return {
            members.push(format!("return={}", preferred_return.token()));
        }
        if !self.include.is_empty() {
            members.push(format!("include=\"{}\"", self.include.join(" ")));
        }
        if !self.omit.is_empty() {
            members.push(format!("omit=\"{}\"", self.omit.join(" ")));
        }
        if let Some(wait) = self.wait {
            members.push(format!("wait={}", wait));
        }
        if self.respond_async {
            members.push("respond-async".to_owned());
        }
        if let Some(handling) = self.handling {
            members.push(format!("handling={}", handling.token()));
        }
        members.join(", ")
    }
}

/// `Preference-Applied` header, defined in
/// [rfc7240](https://datatracker.ietf.org/doc/html/rfc7240#section-3).
/// Only the applied `return` preference is echoed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceApplied {
    /// The applied `return` preference.
    pub preferred_return: PreferReturn,
}

impl Header for PreferenceApplied {
    #[inline]
    fn name() -> &'static HeaderName {
        &PREFERENCE_APPLIED
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        Self: Sized,
        I: Iterator<Item = &'i headers::HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        let value_str = value.to_str().map_err(|_| headers::Error::invalid())?;
        let (name, value) = parse_param(value_str.trim()).ok_or_else(headers::Error::invalid)?;
        if name != "return" {
            return Err(headers::Error::invalid());
        }
        Ok(Self {
            preferred_return: value.parse().map_err(|_| headers::Error::invalid())?,
        })
    }

    fn encode<E: Extend<headers::HeaderValue>>(&self, values: &mut E) {
        values.extend(std::iter::once(
            format!("return={}", self.preferred_return.token())
                .parse()
                .expect("preference-applied value is always a valid HeaderValue"),
        ));
    }
}

impl Display for PreferenceApplied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "return={}", self.preferred_return.token())
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_ok};
    use headers::HeaderValue;
    use rstest::rstest;

    use super::*;

    fn decode(header_value_strs: &[&str]) -> Result<Prefer, headers::Error> {
        let header_values: Vec<HeaderValue> = header_value_strs
            .iter()
            .map(|v| assert_ok!(HeaderValue::from_str(v)))
            .collect();
        Prefer::decode(&mut header_values.iter())
    }

    #[rstest]
    #[case::bad_return(&["return=everything"])]
    #[case::bad_wait(&["wait=soon"])]
    #[case::bad_handling(&["handling=maybe"])]
    #[case::bad_token(&["re turn=minimal"])]
    fn invalid_prefer_will_be_rejected(#[case] header_value_strs: &[&str]) {
        assert_err!(decode(header_value_strs));
    }

    #[test]
    fn recognized_members_will_be_decoded() {
        let prefer = assert_ok!(decode(&[
            r#"return=representation; include="http://www.w3.org/ns/ldp#PreferMembership http://www.trellisldp.org/ns/trellis#PreferAudit""#,
            "respond-async; wait=100",
        ]));

        assert_eq!(prefer.preferred_return, Some(PreferReturn::Representation));
        assert_eq!(
            prefer.include,
            vec![
                "http://www.w3.org/ns/ldp#PreferMembership",
                "http://www.trellisldp.org/ns/trellis#PreferAudit"
            ]
        );
        assert!(prefer.respond_async);
        assert_eq!(prefer.wait, Some(100));
    }

    #[test]
    fn unrecognized_preferences_will_be_ignored() {
        let prefer = assert_ok!(decode(&["foo; bar=1, return=minimal"]));
        assert_eq!(prefer.preferred_return, Some(PreferReturn::Minimal));
    }

    #[rstest]
    #[case(Prefer::return_minimal())]
    #[case(Prefer {
        preferred_return: Some(PreferReturn::Representation),
        omit: vec!["http://www.w3.org/ns/ldp#PreferContainment".to_owned()],
        handling: Some(PreferHandling::Lenient),
        ..Default::default()
    })]
    fn round_trip_preserves_value(#[case] prefer: Prefer) {
        let encoded = prefer.str_encode();
        let re_parsed = assert_ok!(decode(&[&encoded]));
        assert_eq!(prefer, re_parsed);
    }
}
