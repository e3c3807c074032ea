use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownField;

/// Display text plus target URL; rendered as an anchor rather than plain text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

impl Link {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Link(Link),
    Text(String),
    Number(serde_json::Number),
}

impl FieldValue {
    /// The string filters compare against. Links match on their visible text.
    pub fn filter_key(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Link(link) => Cow::Borrowed(link.text.as_str()),
            FieldValue::Text(text) => Cow::Borrowed(text.as_str()),
            FieldValue::Number(number) => Cow::Owned(number.to_string()),
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            FieldValue::Link(link) => Some(link),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<Link> for FieldValue {
    fn from(value: Link) -> Self {
        FieldValue::Link(value)
    }
}

/// One line of the replay feed. Field order here is the display order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRecord {
    #[serde(alias = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<FieldValue>,
    #[serde(alias = "User", skip_serializing_if = "Option::is_none")]
    pub user: Option<FieldValue>,
    #[serde(alias = "Game", skip_serializing_if = "Option::is_none")]
    pub game: Option<FieldValue>,
    #[serde(alias = "Difficulty", skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<FieldValue>,
    #[serde(alias = "Shot", skip_serializing_if = "Option::is_none")]
    pub shot: Option<FieldValue>,
    #[serde(alias = "Route", skip_serializing_if = "Option::is_none")]
    pub route: Option<FieldValue>,
    #[serde(alias = "Score", skip_serializing_if = "Option::is_none")]
    pub score: Option<FieldValue>,
    #[serde(
        alias = "Upload Date",
        alias = "upload date",
        skip_serializing_if = "Option::is_none"
    )]
    pub upload_date: Option<FieldValue>,
    #[serde(alias = "Comment", skip_serializing_if = "Option::is_none")]
    pub comment: Option<FieldValue>,
    #[serde(alias = "Replay", skip_serializing_if = "Option::is_none")]
    pub replay: Option<FieldValue>,
    #[serde(alias = "Character", skip_serializing_if = "Option::is_none")]
    pub character: Option<FieldValue>,
    #[serde(alias = "Season", skip_serializing_if = "Option::is_none")]
    pub season: Option<FieldValue>,
    #[serde(alias = "Goast", skip_serializing_if = "Option::is_none")]
    pub goast: Option<FieldValue>,
}

impl ReplayRecord {
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        field.value(self)
    }

    /// Builder used by fixtures and headless callers.
    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        *field.slot(&mut self) = Some(value.into());
        self
    }
}

impl AsRef<ReplayRecord> for ReplayRecord {
    fn as_ref(&self) -> &ReplayRecord {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Id,
    User,
    Game,
    Difficulty,
    Shot,
    Route,
    Score,
    UploadDate,
    Comment,
    Replay,
    Character,
    Season,
    Goast,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Id,
        Field::User,
        Field::Game,
        Field::Difficulty,
        Field::Shot,
        Field::Route,
        Field::Score,
        Field::UploadDate,
        Field::Comment,
        Field::Replay,
        Field::Character,
        Field::Season,
        Field::Goast,
    ];

    /// Wire name used by the feed.
    pub fn name(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::User => "user",
            Field::Game => "game",
            Field::Difficulty => "difficulty",
            Field::Shot => "shot",
            Field::Route => "route",
            Field::Score => "score",
            Field::UploadDate => "uploadDate",
            Field::Comment => "comment",
            Field::Replay => "replay",
            Field::Character => "character",
            Field::Season => "season",
            Field::Goast => "goast",
        }
    }

    /// Accepts `uploadDate`, `Upload Date`, `upload_date` and friends.
    pub fn parse(name: &str) -> Option<Field> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        Field::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(&normalized))
    }

    pub fn value(self, record: &ReplayRecord) -> Option<&FieldValue> {
        match self {
            Field::Id => record.id.as_ref(),
            Field::User => record.user.as_ref(),
            Field::Game => record.game.as_ref(),
            Field::Difficulty => record.difficulty.as_ref(),
            Field::Shot => record.shot.as_ref(),
            Field::Route => record.route.as_ref(),
            Field::Score => record.score.as_ref(),
            Field::UploadDate => record.upload_date.as_ref(),
            Field::Comment => record.comment.as_ref(),
            Field::Replay => record.replay.as_ref(),
            Field::Character => record.character.as_ref(),
            Field::Season => record.season.as_ref(),
            Field::Goast => record.goast.as_ref(),
        }
    }

    fn slot(self, record: &mut ReplayRecord) -> &mut Option<FieldValue> {
        match self {
            Field::Id => &mut record.id,
            Field::User => &mut record.user,
            Field::Game => &mut record.game,
            Field::Difficulty => &mut record.difficulty,
            Field::Shot => &mut record.shot,
            Field::Route => &mut record.route,
            Field::Score => &mut record.score,
            Field::UploadDate => &mut record.upload_date,
            Field::Comment => &mut record.comment,
            Field::Replay => &mut record.replay,
            Field::Character => &mut record.character,
            Field::Season => &mut record.season,
            Field::Goast => &mut record.goast,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Field::parse(value).ok_or_else(|| UnknownField(value.to_string()))
    }
}
