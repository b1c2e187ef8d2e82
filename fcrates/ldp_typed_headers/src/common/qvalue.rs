//! I define [`QValue`] representing quality weights in
//! negotiation headers.
//!

use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;

/// A quality weight, as defined in
/// [rfc9110](https://www.rfc-editor.org/rfc/rfc9110.html#name-quality-values).
///
/// ```txt
///   weight = OWS ";" OWS "q=" qvalue
///   qvalue = ( "0" [ "." 0*3DIGIT ] )
///          / ( "1" [ "." 0*3("0") ] )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QValue(Decimal);

impl QValue {
    /// The maximum quality weight, `1`.
    pub fn one() -> Self {
        Self(Decimal::ONE)
    }

    /// The minimum quality weight, `0`.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// If the weight is zero, marking the value not acceptable.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }
}

impl Default for QValue {
    #[inline]
    fn default() -> Self {
        Self::one()
    }
}

/// Error of an invalid encoded qvalue.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Given string is not a valid qvalue.")]
pub struct InvalidEncodedQValue;

impl FromStr for QValue {
    type Err = InvalidEncodedQValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let d = Decimal::from_str(s.trim()).map_err(|_| InvalidEncodedQValue)?;
        if d < Decimal::ZERO || d > Decimal::ONE || d.scale() > 3 {
            return Err(InvalidEncodedQValue);
        }
        Ok(Self(d))
    }
}

impl Display for QValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
