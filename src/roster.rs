//! Group/member roster that drives caption content.
//!
//! The roster is loaded once from a JSON document shaped like
//! `{"Teams": [{"Logo": "...", "Players": [{"IGN": "...", "Name": "...", "Language": "..."}]}]}`
//! and never mutated afterwards.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// Languages with a dedicated font pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Korean,
    Turkish,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Korean, Language::Turkish];

    /// Lowercase name, also used as the font pool directory name
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Korean => "korean",
            Language::Turkish => "turkish",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of parsing a raw language string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageTag {
    Recognized(Language),
    Unrecognized(String),
}

impl LanguageTag {
    /// Case-insensitive parse; never fails
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(trimmed))
            .map(LanguageTag::Recognized)
            .unwrap_or_else(|| LanguageTag::Unrecognized(raw.to_string()))
    }

    pub fn language(&self) -> Option<Language> {
        match self {
            LanguageTag::Recognized(lang) => Some(*lang),
            LanguageTag::Unrecognized(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Member {
    /// In-game name, always shown
    pub ign: String,
    /// Real name, shown after the IGN when non-empty
    pub name: String,
    pub language: LanguageTag,
}

impl Member {
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    /// Logo sprite id
    pub logo: String,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub groups: Vec<Group>,
}

impl Roster {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// Load and parse a roster file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let doc: RosterDocument = serde_json::from_str(content)?;
        Ok(doc.into())
    }

    pub fn group(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    pub fn member(&self, group: usize, member: usize) -> Option<&Member> {
        self.groups.get(group)?.members.get(member)
    }

    pub fn member_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }

    /// Members whose real name would be shown
    pub fn named_member_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| &g.members)
            .filter(|m| m.has_name())
            .count()
    }
}

// On-disk shape

#[derive(Deserialize)]
struct RosterDocument {
    #[serde(rename = "Teams", default)]
    teams: Vec<TeamDocument>,
}

#[derive(Deserialize)]
struct TeamDocument {
    #[serde(rename = "Logo", default)]
    logo: String,
    #[serde(rename = "Players", default)]
    players: Vec<PlayerDocument>,
}

#[derive(Deserialize)]
struct PlayerDocument {
    #[serde(rename = "IGN")]
    ign: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Language", default)]
    language: String,
}

impl From<RosterDocument> for Roster {
    fn from(doc: RosterDocument) -> Self {
        let groups = doc
            .teams
            .into_iter()
            .map(|team| Group {
                logo: team.logo,
                members: team
                    .players
                    .into_iter()
                    .map(|p| Member {
                        language: LanguageTag::parse(&p.language),
                        ign: p.ign,
                        name: p.name,
                    })
                    .collect(),
            })
            .collect();
        Roster { groups }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "Teams": [
            {
                "Logo": "G1",
                "Players": [
                    {"IGN": "A", "Name": "", "Language": "English"},
                    {"IGN": "B", "Name": "Bee", "Language": "KOREAN"}
                ]
            },
            {
                "Logo": "G2",
                "Players": [
                    {"IGN": "C", "Name": "Cem", "Language": "turkish"},
                    {"IGN": "D", "Name": "Dee", "Language": "klingon"}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_language_parse() {
        assert_eq!(
            LanguageTag::parse("english"),
            LanguageTag::Recognized(Language::English)
        );
        assert_eq!(
            LanguageTag::parse("Korean"),
            LanguageTag::Recognized(Language::Korean)
        );
        assert_eq!(
            LanguageTag::parse(" TURKISH "),
            LanguageTag::Recognized(Language::Turkish)
        );
        assert_eq!(
            LanguageTag::parse("German"),
            LanguageTag::Unrecognized("German".to_string())
        );
        assert_eq!(LanguageTag::parse("").language(), None);
    }

    #[test]
    fn test_from_json() {
        let roster = Roster::from_json(SAMPLE).unwrap();

        assert_eq!(roster.groups.len(), 2);
        assert_eq!(roster.member_count(), 4);
        assert_eq!(roster.named_member_count(), 3);
        assert_eq!(roster.group(0).unwrap().logo, "G1");

        let bee = roster.member(0, 1).unwrap();
        assert_eq!(bee.ign, "B");
        assert_eq!(bee.language.language(), Some(Language::Korean));

        let dee = roster.member(1, 1).unwrap();
        assert_eq!(dee.language, LanguageTag::Unrecognized("klingon".to_string()));
    }

    #[test]
    fn test_missing_optional_fields() {
        let roster = Roster::from_json(r#"{"Teams": [{"Logo": "X", "Players": [{"IGN": "solo"}]}]}"#)
            .unwrap();

        let solo = roster.member(0, 0).unwrap();
        assert!(!solo.has_name());
        assert_eq!(solo.language, LanguageTag::Unrecognized(String::new()));
    }

    #[test]
    fn test_unparseable_is_error() {
        assert!(Roster::from_json("{\"Teams\": 3}").is_err());
        assert!(Roster::from_json("not json").is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let roster = Roster::load(file.path()).unwrap();
        assert_eq!(roster.groups.len(), 2);

        assert!(Roster::load(Path::new("/nonexistent/roster.json")).is_err());
    }
}
