//! Playback spec and declarative input parsing
//!
//! A [`PlaybackSpec`] is the desired playback configuration of an embed.
//! Inputs arrive one at a time as `(name, value)` string pairs and are
//! merged field by field into a new spec value.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Desired playback configuration
///
/// `video_id` may be absent while only `start`/`end` have been set; such a
/// spec is accumulated but never issued to the player.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSpec {
    pub video_id: Option<String>,
    pub start_seconds: Option<f64>,
    pub end_seconds: Option<f64>,
}

/// Load command issued to the player
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub video_id: String,
    pub start_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_seconds: Option<f64>,
}

impl PlaybackSpec {
    pub fn for_video(video_id: impl Into<String>) -> Self {
        Self {
            video_id: Some(video_id.into()),
            ..Default::default()
        }
    }

    /// Apply one input change, producing the next spec
    ///
    /// A new video discards the previous segment bounds. Bound changes keep
    /// whatever video (or lack of one) the spec already has.
    pub fn merge(&self, change: &InputChange) -> Self {
        match change {
            InputChange::Video(video_id) => Self::for_video(video_id.clone()),
            InputChange::Start(start) => Self {
                start_seconds: Some(*start),
                ..self.clone()
            },
            InputChange::End(end) => Self {
                end_seconds: Some(*end),
                ..self.clone()
            },
            InputChange::Range { start, end } => Self {
                video_id: self.video_id.clone(),
                start_seconds: start.or(self.start_seconds),
                end_seconds: end.or(self.end_seconds),
            },
        }
    }

    /// Issuable form of this spec, `None` without a video id
    ///
    /// Start defaults to the beginning of the video. Bounds are passed
    /// through unchecked, even when `start > end`.
    pub fn to_load_request(&self) -> Option<LoadRequest> {
        let video_id = self.video_id.clone()?;
        Some(LoadRequest {
            video_id,
            start_seconds: self.start_seconds.unwrap_or(0.0),
            end_seconds: self.end_seconds,
        })
    }
}

impl LoadRequest {
    /// Seconds of video this request plays, given the full video duration
    pub fn segment_length(&self, duration: f64) -> f64 {
        let end = self.end_seconds.map_or(duration, |end| end.min(duration));
        (end - self.start_seconds).max(0.0)
    }
}

/// Declarative inputs an embed observes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputName {
    /// `v`: video identifier
    Video,
    /// `start`: loop start in seconds
    Start,
    /// `end`: loop end in seconds
    End,
    /// `range`: `start-end` shorthand
    Range,
}

impl InputName {
    pub const ALL: [InputName; 4] = [
        InputName::Video,
        InputName::Start,
        InputName::End,
        InputName::Range,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputName::Video => "v",
            InputName::Start => "start",
            InputName::End => "end",
            InputName::Range => "range",
        }
    }
}

impl fmt::Display for InputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputName {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InputName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| InputError::UnknownInput(s.to_string()))
    }
}

/// Rejected input change
///
/// Rejections are never surfaced to the host; the embed logs and drops them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("unknown input '{0}'")]
    UnknownInput(String),

    #[error("empty value for input '{0}'")]
    Empty(InputName),

    #[error("input '{name}' is not a non-negative number: {value:?}")]
    Malformed { name: InputName, value: String },
}

/// One validated input change
#[derive(Debug, Clone, PartialEq)]
pub enum InputChange {
    Video(String),
    Start(f64),
    End(f64),
    /// At least one side is present
    Range { start: Option<f64>, end: Option<f64> },
}

impl InputChange {
    /// Validate a raw `(name, value)` pair
    pub fn parse(name: &str, value: &str) -> Result<Self, InputError> {
        let name: InputName = name.parse()?;
        if value.is_empty() {
            return Err(InputError::Empty(name));
        }

        let malformed = || InputError::Malformed {
            name,
            value: value.to_string(),
        };

        match name {
            InputName::Video => Ok(InputChange::Video(value.to_string())),
            InputName::Start => parse_seconds(value).map(InputChange::Start).ok_or_else(malformed),
            InputName::End => parse_seconds(value).map(InputChange::End).ok_or_else(malformed),
            InputName::Range => parse_range(value).ok_or_else(malformed),
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, InputChange::Video(_))
    }
}

/// Parse a seconds value: finite and non-negative, surrounding whitespace allowed
pub fn parse_seconds(value: &str) -> Option<f64> {
    let seconds: f64 = value.trim().parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

/// Parse `"a-b"`, `"a-"`, `"-b"` or `"a"`
///
/// Any present side that fails to parse rejects the whole value.
fn parse_range(value: &str) -> Option<InputChange> {
    let (start, end) = match value.split_once('-') {
        Some((start, end)) => (start.trim(), end.trim()),
        None => (value.trim(), ""),
    };

    let side = |raw: &str| -> Option<Option<f64>> {
        if raw.is_empty() {
            Some(None)
        } else {
            parse_seconds(raw).map(Some)
        }
    };

    let (start, end) = (side(start)?, side(end)?);
    if start.is_none() && end.is_none() {
        return None;
    }
    Some(InputChange::Range { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_resets_bounds() {
        let spec = PlaybackSpec {
            video_id: Some("old".to_string()),
            start_seconds: Some(5.0),
            end_seconds: Some(9.0),
        };
        let next = spec.merge(&InputChange::Video("new".to_string()));
        assert_eq!(next, PlaybackSpec::for_video("new"));
    }

    #[test]
    fn test_bounds_keep_video() {
        let spec = PlaybackSpec::for_video("abc")
            .merge(&InputChange::Start(10.0))
            .merge(&InputChange::End(20.0));
        assert_eq!(
            spec,
            PlaybackSpec {
                video_id: Some("abc".to_string()),
                start_seconds: Some(10.0),
                end_seconds: Some(20.0),
            }
        );
    }

    #[test]
    fn test_bounds_without_video_are_not_issuable() {
        let spec = PlaybackSpec::default().merge(&InputChange::Start(3.0));
        assert_eq!(spec.start_seconds, Some(3.0));
        assert!(spec.to_load_request().is_none());
    }

    #[test]
    fn test_load_request_defaults_start() {
        let request = PlaybackSpec::for_video("abc").to_load_request().unwrap();
        assert_eq!(request.start_seconds, 0.0);
        assert_eq!(request.end_seconds, None);
    }

    #[test]
    fn test_inverted_bounds_pass_through() {
        let request = PlaybackSpec::for_video("abc")
            .merge(&InputChange::Start(30.0))
            .merge(&InputChange::End(10.0))
            .to_load_request()
            .unwrap();
        assert_eq!(request.start_seconds, 30.0);
        assert_eq!(request.end_seconds, Some(10.0));
        assert_eq!(request.segment_length(60.0), 0.0);
    }

    #[test]
    fn test_segment_length_clamps_to_duration() {
        let request = LoadRequest {
            video_id: "abc".to_string(),
            start_seconds: 10.0,
            end_seconds: Some(500.0),
        };
        assert_eq!(request.segment_length(100.0), 90.0);
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("12"), Some(12.0));
        assert_eq!(parse_seconds(" 12.5 "), Some(12.5));
        assert_eq!(parse_seconds("1e2"), Some(100.0));
        assert_eq!(parse_seconds("0"), Some(0.0));
        for bad in ["abc", "-1", "NaN", "inf", "12s", "1:30"] {
            assert_eq!(parse_seconds(bad), None, "{bad} should be rejected");
        }
    }

    #[test]
    fn test_parse_inputs() {
        assert_eq!(
            InputChange::parse("v", "dQw4w9WgXcQ"),
            Ok(InputChange::Video("dQw4w9WgXcQ".to_string()))
        );
        assert_eq!(InputChange::parse("start", "4"), Ok(InputChange::Start(4.0)));
        assert_eq!(InputChange::parse("end", "8.25"), Ok(InputChange::End(8.25)));
        assert_eq!(
            InputChange::parse("start", "soon"),
            Err(InputError::Malformed {
                name: InputName::Start,
                value: "soon".to_string()
            })
        );
        assert_eq!(
            InputChange::parse("end", ""),
            Err(InputError::Empty(InputName::End))
        );
        assert_eq!(
            InputChange::parse("video-id", "x"),
            Err(InputError::UnknownInput("video-id".to_string()))
        );
    }

    #[test]
    fn test_parse_range_forms() {
        let range = |v| InputChange::parse("range", v);
        assert_eq!(
            range("10-20"),
            Ok(InputChange::Range { start: Some(10.0), end: Some(20.0) })
        );
        assert_eq!(
            range("10-"),
            Ok(InputChange::Range { start: Some(10.0), end: None })
        );
        assert_eq!(
            range("-20"),
            Ok(InputChange::Range { start: None, end: Some(20.0) })
        );
        assert_eq!(
            range("7"),
            Ok(InputChange::Range { start: Some(7.0), end: None })
        );
        assert!(range("-").is_err());
        assert!(range("10-x").is_err());
    }

    #[test]
    fn test_range_merge_keeps_unset_side() {
        let spec = PlaybackSpec::for_video("abc")
            .merge(&InputChange::Range { start: Some(1.0), end: Some(2.0) })
            .merge(&InputChange::Range { start: None, end: Some(5.0) });
        assert_eq!(spec.start_seconds, Some(1.0));
        assert_eq!(spec.end_seconds, Some(5.0));
    }

    #[test]
    fn test_input_name_roundtrip() {
        for name in InputName::ALL {
            assert_eq!(name.as_str().parse::<InputName>(), Ok(name));
        }
    }
}
