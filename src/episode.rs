use core::fmt;
use regex::Regex;
use std::{str::FromStr, sync::LazyLock};
use thiserror::Error;

static EPISODE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^E?(\d+)(?:(?:-E?|E)(\d+))?$").expect("episode token pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EpisodeParseError {
    #[error("empty episode string")]
    Empty,
    #[error("invalid episode format: {0}")]
    InvalidFormat(String),
    #[error("start episode ({start}) cannot be greater than end episode ({end})")]
    ReversedRange { start: u32, end: u32 },
}

/// One episode or an inclusive run of episodes, as found in a release name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeInfo {
    pub start: u32,
    pub end: u32,
    pub is_range: bool,
}

impl EpisodeInfo {
    pub fn single(episode: u32) -> Self {
        Self {
            start: episode,
            end: episode,
            is_range: false,
        }
    }

    /// Parses tokens such as `22`, `E22`, `22-23`, `E22-E23`, `E22E23` or `22E23`.
    pub fn parse(token: &str) -> Result<Self, EpisodeParseError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(EpisodeParseError::Empty);
        }

        let caps = EPISODE_TOKEN
            .captures(token)
            .ok_or_else(|| EpisodeParseError::InvalidFormat(token.to_string()))?;

        let number = |digits: &str| {
            digits
                .parse::<u32>()
                .map_err(|_| EpisodeParseError::InvalidFormat(token.to_string()))
        };

        let start = number(&caps[1])?;

        match caps.get(2) {
            Some(m) => {
                let end = number(m.as_str())?;
                if start > end {
                    return Err(EpisodeParseError::ReversedRange { start, end });
                }
                Ok(Self {
                    start,
                    end,
                    is_range: true,
                })
            }
            None => Ok(Self::single(start)),
        }
    }

    /// Episode used when only a single catalog lookup makes sense.
    pub fn first(&self) -> u32 {
        self.start
    }

    pub fn episodes(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    /// Zero-padded form used inside file names: `05` or `22-23`.
    pub fn padded(&self) -> String {
        if self.is_range {
            format!("{:02}-{:02}", self.start, self.end)
        } else {
            format!("{:02}", self.start)
        }
    }
}

impl fmt::Display for EpisodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_range {
            write!(f, "{}-{}", self.start, self.end)
        } else {
            write!(f, "{}", self.start)
        }
    }
}

impl FromStr for EpisodeInfo {
    type Err = EpisodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
