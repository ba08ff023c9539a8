//! The local player's private character sheet.
//!
//! [`PrivateInfo`] is only ever replaced wholesale by the server. What the
//! UI shows is a derived copy, [`PrivateInfo::with_public_clues`], that folds
//! clues other players have published into the matching relationship and
//! into one summary block.

use serde::{Deserialize, Serialize};

use super::game::Clue;
use super::lenient::null_as_default;

/// First line of the summary block kept in `other_info`.
pub const PUBLIC_CLUES_SECTION_TITLE: &str = "--- Public clues ---";

/// Prefix for a public clue copied into a relationship.
pub const PUBLIC_CLUE_PREFIX: &str = "Publicly revealed: ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSheet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// What the local character knows about someone else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Who this is about, usually `"Name (role)"`
    #[serde(rename = "name")]
    pub subject_name: String,

    #[serde(rename = "desc", default, deserialize_with = "null_as_default")]
    pub description: String,

    /// Grows only; no two entries share the same text
    #[serde(default, deserialize_with = "null_as_default")]
    pub clues: Vec<String>,
}

impl Relationship {
    pub fn new(subject_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
            description: description.into(),
            clues: Vec::new(),
        }
    }

    /// Append `clue` unless the exact text is already present.
    pub fn add_clue(&mut self, clue: impl Into<String>) -> bool {
        let clue = clue.into();
        if self.clues.contains(&clue) {
            return false;
        }
        self.clues.push(clue);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event: String,
}

/// Secret per-player data. Owned by the local client only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivateInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub character: CharacterSheet,
    #[serde(deserialize_with = "null_as_default")]
    pub statement: String,
    #[serde(deserialize_with = "null_as_default")]
    pub secrets: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub relationships: Vec<Relationship>,
    #[serde(deserialize_with = "null_as_default")]
    pub timeline: Vec<TimelineEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub other_info: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub objectives: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub rules: Vec<String>,
}

/// Public clue lines grouped by the publisher's leading name token, in the
/// order each token is first seen. A publisher name that starts with a space
/// has an empty token and is left out, so it never matches a relationship.
fn group_by_publisher(clues: &[Clue]) -> Vec<(&str, Vec<String>)> {
    let mut groups: Vec<(&str, Vec<String>)> = Vec::new();
    for clue in clues {
        let token = clue.publisher_name.split(' ').next().unwrap_or_default();
        if token.is_empty() {
            continue;
        }
        let line = format!("{PUBLIC_CLUE_PREFIX}{}", clue.content);
        match groups.iter_mut().find(|(t, _)| *t == token) {
            Some((_, lines)) => lines.push(line),
            None => groups.push((token, vec![line])),
        }
    }
    groups
}

fn summary_block(clues: &[Clue]) -> String {
    std::iter::once(PUBLIC_CLUES_SECTION_TITLE.to_string())
        .chain(
            clues
                .iter()
                .map(|c| format!("[{} revealed] {}", c.publisher_name, c.content)),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

impl PrivateInfo {
    /// Derived view with `public_clues` folded in. `self` is untouched.
    ///
    /// A relationship picks up the clues of the first publisher whose
    /// leading name token occurs in its subject name. The same clue text is
    /// never added twice. When there is at least one public clue, a summary
    /// block replaces any previous one in `other_info`.
    pub fn with_public_clues(&self, public_clues: &[Clue]) -> PrivateInfo {
        let groups = group_by_publisher(public_clues);

        let relationships = self
            .relationships
            .iter()
            .map(|rel| {
                let mut rel = rel.clone();
                let matched = groups
                    .iter()
                    .find(|(token, _)| rel.subject_name.contains(token));
                if let Some((_, lines)) = matched {
                    for line in lines {
                        rel.add_clue(line.as_str());
                    }
                }
                rel
            })
            .collect();

        let other_info = if public_clues.is_empty() {
            self.other_info.clone()
        } else {
            let block = summary_block(public_clues);
            let mut replaced = false;
            let mut items: Vec<String> = self
                .other_info
                .iter()
                .map(|item| {
                    if !replaced && item.starts_with(PUBLIC_CLUES_SECTION_TITLE) {
                        replaced = true;
                        block.clone()
                    } else {
                        item.clone()
                    }
                })
                .collect();
            if !replaced {
                items.push(block);
            }
            items
        };

        PrivateInfo {
            relationships,
            other_info,
            ..self.clone()
        }
    }

    pub fn relationship(&self, subject_name: &str) -> Option<&Relationship> {
        self.relationships
            .iter()
            .find(|r| r.subject_name == subject_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn info() -> PrivateInfo {
        let mut mate = Relationship::new("Zhang (Second Mate)", "resents the promotion");
        mate.add_clue("muddy shoes in his cabin");
        PrivateInfo {
            character: CharacterSheet {
                name: "Hong (Captain)".to_string(),
                description: "runs the ship".to_string(),
            },
            relationships: vec![mate, Relationship::new("Lin (Singer)", "secret partner")],
            other_info: vec!["you own a pistol".to_string()],
            ..PrivateInfo::default()
        }
    }

    #[test]
    fn test_decode_wire_names() {
        let info: PrivateInfo = serde_json::from_value(serde_json::json!({
            "character": {"name": "Hong", "description": "captain"},
            "relationships": [{"name": "Liu (First Mate)", "desc": "protege", "clues": ["dead"]}],
            "timeline": [{"time": "20:25", "event": "found the body"}]
        }))
        .unwrap();

        assert_eq!(info.relationships[0].subject_name, "Liu (First Mate)");
        assert_eq!(info.relationships[0].clues, vec!["dead".to_string()]);
        assert_eq!(info.timeline[0].time, "20:25");
        assert!(info.secrets.is_empty());
    }

    #[test]
    fn test_null_fields_decode_as_defaults() {
        let info: PrivateInfo = serde_json::from_value(serde_json::json!({
            "statement": null,
            "secrets": null,
            "character": null,
            "relationships": [{"name": "Lin", "desc": null, "clues": null}],
            "other_info": ["kept"]
        }))
        .unwrap();

        assert_eq!(info.statement, "");
        assert!(info.secrets.is_empty());
        assert_eq!(info.character, CharacterSheet::default());
        assert_eq!(info.relationships[0], Relationship::new("Lin", ""));
        assert_eq!(info.other_info, vec!["kept".to_string()]);
    }

    #[test]
    fn test_add_clue_dedupes() {
        let mut rel = Relationship::new("Lin", "");
        assert!(rel.add_clue("a"));
        assert!(!rel.add_clue("a"));
        assert_eq!(rel.clues.len(), 1);
    }

    #[test]
    fn test_enrichment_matches_leading_token() {
        let clues = vec![Clue::new("Zhang (Second Mate)", "saw a knife")];
        let enriched = info().with_public_clues(&clues);

        assert_eq!(
            enriched.relationships[0].clues,
            vec![
                "muddy shoes in his cabin".to_string(),
                "Publicly revealed: saw a knife".to_string(),
            ]
        );
        assert!(enriched.relationships[1].clues.is_empty());
    }

    #[test]
    fn test_enrichment_leaves_original_untouched() {
        let original = info();
        let clues = vec![Clue::new("Zhang", "x")];
        let _ = original.with_public_clues(&clues);
        assert_eq!(original, info());
    }

    #[test]
    fn test_same_public_clue_added_once() {
        let clues = vec![Clue::new("Zhang", "x"), Clue::new("Zhang", "x")];
        let enriched = info().with_public_clues(&clues);
        assert_eq!(enriched.relationships[0].clues.len(), 2);
    }

    #[test]
    fn test_summary_block_replaced_not_duplicated() {
        let clues = vec![Clue::new("Zhang", "x"), Clue::new("Lin (Singer)", "y")];
        let once = info().with_public_clues(&clues);
        let twice = once.with_public_clues(&clues);

        assert_eq!(once, twice);
        assert_eq!(once.other_info.len(), 2);
        assert_eq!(
            once.other_info[1],
            "--- Public clues ---\n[Zhang revealed] x\n[Lin (Singer) revealed] y"
        );
    }

    #[test]
    fn test_no_public_clues_no_block() {
        let enriched = info().with_public_clues(&[]);
        assert_eq!(enriched, info());
    }

    #[test]
    fn test_empty_publisher_token_matches_nothing() {
        let clues = vec![Clue::new(" leading space", "z")];
        let enriched = info().with_public_clues(&clues);
        assert!(enriched.relationships.iter().all(|r| !r.clues.iter().any(|c| c.ends_with('z'))));
        assert_eq!(enriched.other_info.len(), 2);
    }
}
