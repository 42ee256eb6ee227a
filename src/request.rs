//! Generation Requests
//!
//! Validated, immutable story requests. The inbound JSON shape
//! ([`StoryRequestPayload`]) is loose; converting it into a [`GenerationRequest`]
//! rejects missing fields and unrecognized enum values.

use crate::error::StoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reading level of the child the story is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgeBand {
    /// Ages 3-5, read aloud by an adult
    PreReader,
    /// Ages 5-7
    EarlyReader,
    /// Ages 7-9
    DevelopingReader,
    /// Ages 9-12
    IndependentReader,
}

impl AgeBand {
    pub const ALL: [AgeBand; 4] = [
        AgeBand::PreReader,
        AgeBand::EarlyReader,
        AgeBand::DevelopingReader,
        AgeBand::IndependentReader,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBand::PreReader => "pre-reader",
            AgeBand::EarlyReader => "early-reader",
            AgeBand::DevelopingReader => "developing-reader",
            AgeBand::IndependentReader => "independent-reader",
        }
    }

    /// Bands that qualify for the higher-capability model on long stories.
    pub fn is_advanced(&self) -> bool {
        matches!(self, AgeBand::DevelopingReader | AgeBand::IndependentReader)
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeBand {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgeBand::ALL
            .into_iter()
            .find(|band| band.as_str() == s.trim())
            .ok_or_else(|| StoryError::UnknownAgeBand(s.to_string()))
    }
}

/// Requested story length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LengthTier {
    Short,
    Medium,
    Long,
    Epic,
}

impl LengthTier {
    pub const ALL: [LengthTier; 4] = [
        LengthTier::Short,
        LengthTier::Medium,
        LengthTier::Long,
        LengthTier::Epic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthTier::Short => "short",
            LengthTier::Medium => "medium",
            LengthTier::Long => "long",
            LengthTier::Epic => "epic",
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self, LengthTier::Long | LengthTier::Epic)
    }
}

impl fmt::Display for LengthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LengthTier {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LengthTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s.trim())
            .ok_or_else(|| StoryError::UnknownTier(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Boy,
    Girl,
    #[default]
    Neutral,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Boy => "boy",
            Gender::Girl => "girl",
            Gender::Neutral => "neutral",
        }
    }
}

impl FromStr for Gender {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "boy" => Ok(Gender::Boy),
            "girl" => Ok(Gender::Girl),
            "neutral" | "" => Ok(Gender::Neutral),
            other => Err(StoryError::InvalidRequest(format!(
                "unknown gender '{}' (expected boy, girl or neutral)",
                other
            ))),
        }
    }
}

/// Inbound request body as sent by the hosting endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRequestPayload {
    pub child_name: Option<String>,
    pub child_age: Option<String>,
    pub story_length: Option<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    pub gender: Option<String>,
    pub custom_prompt: Option<String>,
    pub include_name_in_story: Option<bool>,
}

impl StoryRequestPayload {
    pub fn from_json(json: &str) -> Result<Self, StoryError> {
        serde_json::from_str(json)
            .map_err(|e| StoryError::InvalidRequest(format!("malformed request body: {}", e)))
    }
}

/// A validated story request. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    child_name: String,
    age_band: AgeBand,
    length_tier: LengthTier,
    themes: Vec<String>,
    gender: Gender,
    custom_prompt: Option<String>,
    include_name_in_story: bool,
}

impl GenerationRequest {
    /// Build a request from already-typed fields, applying the same checks as
    /// the inbound boundary.
    pub fn new(
        child_name: impl Into<String>,
        age_band: AgeBand,
        length_tier: LengthTier,
        themes: Vec<String>,
        gender: Gender,
        custom_prompt: Option<String>,
        include_name_in_story: bool,
    ) -> Result<Self, StoryError> {
        let child_name = child_name.into().trim().to_string();
        if child_name.is_empty() {
            return Err(StoryError::InvalidRequest(
                "childName is required".to_string(),
            ));
        }

        let themes: Vec<String> = themes
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if themes.is_empty() {
            return Err(StoryError::InvalidRequest(
                "at least one theme is required".to_string(),
            ));
        }

        let custom_prompt = custom_prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Ok(Self {
            child_name,
            age_band,
            length_tier,
            themes,
            gender,
            custom_prompt,
            include_name_in_story,
        })
    }

    pub fn child_name(&self) -> &str {
        &self.child_name
    }

    pub fn age_band(&self) -> AgeBand {
        self.age_band
    }

    pub fn length_tier(&self) -> LengthTier {
        self.length_tier
    }

    pub fn themes(&self) -> &[String] {
        &self.themes
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn custom_prompt(&self) -> Option<&str> {
        self.custom_prompt.as_deref()
    }

    pub fn include_name_in_story(&self) -> bool {
        self.include_name_in_story
    }
}

impl TryFrom<StoryRequestPayload> for GenerationRequest {
    type Error = StoryError;

    fn try_from(payload: StoryRequestPayload) -> Result<Self, Self::Error> {
        let child_name = required(payload.child_name, "childName")?;
        let age_band = required(payload.child_age, "childAge")?
            .parse::<AgeBand>()
            .map_err(|e| StoryError::InvalidRequest(e.to_string()))?;
        let length_tier = required(payload.story_length, "storyLength")?
            .parse::<LengthTier>()
            .map_err(|e| StoryError::InvalidRequest(e.to_string()))?;
        let gender = match payload.gender {
            Some(g) => g.parse::<Gender>()?,
            None => Gender::default(),
        };

        GenerationRequest::new(
            child_name,
            age_band,
            length_tier,
            payload.themes,
            gender,
            payload.custom_prompt,
            payload.include_name_in_story.unwrap_or(true),
        )
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, StoryError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StoryError::InvalidRequest(format!("{} is required", field)))
}
