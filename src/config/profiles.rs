//! Named scan profiles.
//!
//! A profile overrides the worker count, connect timeout and rate limit of
//! a configuration with a fixed preset.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Built-in scan profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Many workers, short timeout, no throttling.
    Aggressive,
    /// Balanced settings.
    Default,
    /// Few workers, long timeout, heavy throttling.
    Conservative,
}

/// The values a profile imposes on a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilePreset {
    pub workers: usize,
    pub timeout: Duration,
    pub rate_limit: Duration,
}

impl Profile {
    /// All built-in profiles in display order.
    pub const ALL: [Profile; 3] = [Self::Aggressive, Self::Default, Self::Conservative];

    pub fn preset(self) -> ProfilePreset {
        match self {
            Self::Aggressive => ProfilePreset {
                workers: 500,
                timeout: Duration::from_millis(500),
                rate_limit: Duration::ZERO,
            },
            Self::Default => ProfilePreset {
                workers: 100,
                timeout: Duration::from_millis(1000),
                rate_limit: Duration::from_millis(10),
            },
            Self::Conservative => ProfilePreset {
                workers: 50,
                timeout: Duration::from_millis(3000),
                rate_limit: Duration::from_millis(50),
            },
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Aggressive => "Fast scan with many workers and no throttling",
            Self::Default => "Balanced speed and reliability",
            Self::Conservative => "Slow, low-noise scan for fragile or monitored networks",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aggressive => write!(f, "aggressive"),
            Self::Default => write!(f, "default"),
            Self::Conservative => write!(f, "conservative"),
        }
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aggressive" => Ok(Self::Aggressive),
            "default" => Ok(Self::Default),
            "conservative" => Ok(Self::Conservative),
            _ => Err(ConfigError::UnknownProfile(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parsing() {
        assert_eq!("aggressive".parse::<Profile>().unwrap(), Profile::Aggressive);
        assert_eq!("Default".parse::<Profile>().unwrap(), Profile::Default);
        assert_eq!(" conservative ".parse::<Profile>().unwrap(), Profile::Conservative);
        assert!(matches!(
            "stealth".parse::<Profile>(),
            Err(ConfigError::UnknownProfile(_))
        ));
    }

    #[test]
    fn test_presets() {
        let aggressive = Profile::Aggressive.preset();
        assert_eq!(aggressive.workers, 500);
        assert_eq!(aggressive.timeout, Duration::from_millis(500));
        assert_eq!(aggressive.rate_limit, Duration::ZERO);

        let conservative = Profile::Conservative.preset();
        assert_eq!(conservative.workers, 50);
        assert_eq!(conservative.timeout, Duration::from_secs(3));
        assert_eq!(conservative.rate_limit, Duration::from_millis(50));
    }

    #[test]
    fn test_display_round_trips_names() {
        for profile in Profile::ALL {
            assert_eq!(profile.to_string().parse::<Profile>().unwrap(), profile);
        }
    }
}
