use std::time::Duration;

use crate::error::DeclarationError;

/// A fixed-rate interval measured in whole minutes, always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    minutes: u32,
}

impl Rate {
    pub fn minutes(minutes: u32) -> Result<Self, DeclarationError> {
        if minutes == 0 {
            return Err(DeclarationError::NonPositiveRate);
        }
        Ok(Self { minutes })
    }

    pub fn as_minutes(self) -> u32 {
        self.minutes
    }

    pub fn period(self) -> Duration {
        Duration::from_secs(u64::from(self.minutes) * 60)
    }

    pub fn expression(self) -> String {
        if self.minutes == 1 {
            "rate(1 minute)".to_string()
        } else {
            format!("rate({} minutes)", self.minutes)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleProps {
    pub rate: Rate,
    pub enabled: bool,
}

impl RuleProps {
    pub fn new(rate: Rate) -> Self {
        Self {
            rate,
            enabled: true,
        }
    }
}
