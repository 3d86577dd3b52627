//! Three-state market lean used for both trend and bias.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Market lean: -1, 0 or +1.
///
/// Serialized as the signed integer so downstream records keep the
/// `{-1, 0, 1}` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Trend {
    Bearish,
    #[default]
    Neutral,
    Bullish,
}

impl Trend {
    pub fn signum(&self) -> i8 {
        match self {
            Self::Bearish => -1,
            Self::Neutral => 0,
            Self::Bullish => 1,
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::Neutral)
    }
}

impl From<Trend> for i8 {
    fn from(t: Trend) -> Self {
        t.signum()
    }
}

impl TryFrom<i8> for Trend {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Bearish),
            0 => Ok(Self::Neutral),
            1 => Ok(Self::Bullish),
            other => Err(format!("trend must be -1, 0 or 1, got {other}")),
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_signum() {
        assert_eq!(Trend::Bearish.signum(), -1);
        assert_eq!(Trend::Neutral.signum(), 0);
        assert_eq!(Trend::Bullish.signum(), 1);
        assert_eq!(Trend::default(), Trend::Neutral);
    }

    #[test]
    fn test_trend_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Trend::Bearish).unwrap(), "-1");
        let t: Trend = serde_json::from_str("1").unwrap();
        assert_eq!(t, Trend::Bullish);
        assert!(serde_json::from_str::<Trend>("2").is_err());
    }
}
