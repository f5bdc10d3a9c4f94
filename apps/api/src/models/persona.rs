use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A named voice that comments on posts under a bound host identity.
///
/// Only the identity's id is stored; the identity itself is resolved through
/// the content host every time it is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub definition: String,
    pub author_identity: i64,
    pub provider: String,
    #[serde(default)]
    pub cron_enabled: bool,
    #[serde(default, deserialize_with = "lenient_frequency")]
    pub cron_frequency: CronFrequency,
}

/// Stored records may carry frequencies this build does not know; they read as the default.
fn lenient_frequency<'de, D>(deserializer: D) -> Result<CronFrequency, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(CronFrequency::parse_or_default(value.as_ref().and_then(Value::as_str)))
}

/// Recurring interval for a persona's scheduled cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CronFrequency {
    Hourly,
    TwiceDaily,
    /// Least frequent, used whenever a configured value is invalid or absent.
    #[default]
    Daily,
}

impl CronFrequency {
    pub const ALL: [CronFrequency; 3] = [Self::Hourly, Self::TwiceDaily, Self::Daily];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::TwiceDaily => "twicedaily",
            Self::Daily => "daily",
        }
    }

    pub fn period(&self) -> Duration {
        match self {
            Self::Hourly => Duration::from_secs(60 * 60),
            Self::TwiceDaily => Duration::from_secs(12 * 60 * 60),
            Self::Daily => Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Parses a frequency name, falling back to the default on anything unrecognized.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for CronFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == needle)
            .ok_or_else(|| format!("unknown cron frequency '{s}'"))
    }
}

impl fmt::Display for CronFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
