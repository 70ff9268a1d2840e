use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::capability::Capability;
use crate::model::character::{Character, CharacterRegistry};
use crate::model::event_result::{UpdateSource, WorldUpdate, WorldUpdateReport};

/// Destinations must be longer than this many characters.
const MIN_DESTINATION_CHARS: usize = 2;

/// How the two update channels settle disagreements inside one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationPolicy {
    /// A character moved by a capability call keeps that location for the
    /// rest of the step; text matches for it are deferred.
    #[default]
    AuthoritativeWins,
    /// Every accepted update overwrites the previous one, in channel order.
    LastWriteWins,
}

fn compile_pattern(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(pattern_err) => match Regex::new(r"$^") {
            Ok(never) => {
                tracing::error!(%pattern_err, "movement pattern failed to compile");
                never
            }
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

// Subject phrase, movement verb, optional article, destination.
static MOVEMENT_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        compile_pattern(
            r"(?i)([A-Za-z ]+) (?:moved|went|traveled|journeyed|walked) to (?:the )?([A-Za-z0-9 ]+)",
        ),
        compile_pattern(
            r"(?i)([A-Za-z ]+) (?:entered|arrived at|reached) (?:the )?([A-Za-z0-9 ]+)",
        ),
    ]
});

/// Character registry plus the two channels that write to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldTracker {
    registry: CharacterRegistry,
    policy: ReconciliationPolicy,

    /// Characters the authoritative channel touched in the current step.
    #[serde(skip)]
    touched: HashSet<String>,
}

impl WorldTracker {
    pub fn new(registry: CharacterRegistry, policy: ReconciliationPolicy) -> Self {
        Self {
            registry,
            policy,
            touched: HashSet::new(),
        }
    }

    pub fn begin_step(&mut self) {
        self.touched.clear();
    }

    pub fn policy(&self) -> ReconciliationPolicy {
        self.policy
    }

    pub fn registry(&self) -> &CharacterRegistry {
        &self.registry
    }

    pub fn get(&self, name: &str) -> Option<&Character> {
        self.registry.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.registry.names()
    }

    /// Apply the world change implied by an executed capability.
    ///
    /// Returns `None` for capabilities that do not touch locations. A blank
    /// destination is rejected even when the caller skipped tool validation.
    pub fn apply_authoritative(&mut self, capability: &Capability) -> Option<WorldUpdate> {
        let Capability::MoveCharacter(args) = capability else {
            return None;
        };

        let location = args.location.trim();
        if location.is_empty() {
            return Some(WorldUpdate::Rejected {
                source: UpdateSource::Authoritative,
                reason: format!("no destination given for '{}'", args.character_name),
            });
        }

        let Some(name) = self
            .registry
            .find_ignore_case(&args.character_name)
            .map(str::to_string)
        else {
            tracing::warn!(
                character = %args.character_name,
                "model tried to move an unknown character"
            );
            return Some(WorldUpdate::Rejected {
                source: UpdateSource::Authoritative,
                reason: format!("unknown character '{}'", args.character_name),
            });
        };

        self.registry.set_location(&name, location);
        self.touched.insert(name.clone());
        tracing::debug!(character = %name, %location, "authoritative location update");

        Some(WorldUpdate::Applied {
            source: UpdateSource::Authoritative,
            character: name,
            location: location.to_string(),
        })
    }

    /// Scan narrative text for movement phrases and update locations.
    ///
    /// Patterns are tried in order, matches in textual order; within the
    /// scan the last accepted match for a character wins.
    pub fn apply_heuristic(&mut self, text: &str) -> WorldUpdateReport {
        let mut report = WorldUpdateReport::default();

        for pattern in MOVEMENT_PATTERNS.iter() {
            for caps in pattern.captures_iter(text) {
                let candidate = caps.get(1).map_or("", |m| m.as_str()).trim();
                let location = caps.get(2).map_or("", |m| m.as_str()).trim();

                if candidate.is_empty() {
                    continue;
                }

                let Some(name) = self.match_candidate(candidate) else {
                    tracing::trace!(%candidate, "movement phrase names no tracked character");
                    continue;
                };

                if location.chars().count() <= MIN_DESTINATION_CHARS {
                    report.push(WorldUpdate::Rejected {
                        source: UpdateSource::Heuristic,
                        reason: format!("destination '{location}' for {name} is too short"),
                    });
                    continue;
                }

                if self.policy == ReconciliationPolicy::AuthoritativeWins
                    && self.touched.contains(&name)
                {
                    tracing::debug!(
                        character = %name,
                        %location,
                        "skipping text-derived move, character already moved by a tool call"
                    );
                    report.push(WorldUpdate::Deferred {
                        source: UpdateSource::Heuristic,
                        character: name,
                        reason: "moved by a tool call this step".to_string(),
                    });
                    continue;
                }

                self.registry.set_location(&name, location);
                tracing::debug!(character = %name, %location, "heuristic location update");
                report.push(WorldUpdate::Applied {
                    source: UpdateSource::Heuristic,
                    character: name,
                    location: location.to_string(),
                });
            }
        }

        report
    }

    /// First registered name that contains, or is contained in, the
    /// candidate phrase (ignoring case).
    fn match_candidate(&self, candidate: &str) -> Option<String> {
        let candidate = candidate.to_lowercase();
        self.registry
            .names()
            .find(|name| {
                let name = name.to_lowercase();
                candidate.contains(&name) || name.contains(&candidate)
            })
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::capability::{MoveCharacter, SpeakToCharacter};

    fn tracker(policy: ReconciliationPolicy) -> WorldTracker {
        let registry = CharacterRegistry::from_roster(vec![
            Character::new("Elara", "Adventurer").at("Camp"),
            Character::new("Kael", "Ranger").at("Camp"),
        ])
        .unwrap();
        WorldTracker::new(registry, policy)
    }

    fn location(tracker: &WorldTracker, name: &str) -> String {
        tracker.get(name).unwrap().location.clone()
    }

    fn move_to(name: &str, location: &str) -> Capability {
        Capability::MoveCharacter(MoveCharacter {
            character_name: name.into(),
            location: location.into(),
        })
    }

    #[test]
    fn heuristic_picks_up_walked_to() {
        let mut tracker = tracker(ReconciliationPolicy::default());
        let report = tracker.apply_heuristic("Elara walked to the Old Mill");

        assert_eq!(location(&tracker, "Elara"), "Old Mill");
        assert_eq!(report.applied().count(), 1);
    }

    #[test]
    fn heuristic_ignores_text_without_movement() {
        let mut tracker = tracker(ReconciliationPolicy::default());
        let before = tracker.clone();
        let report = tracker.apply_heuristic("El");

        assert_eq!(tracker, before);
        assert!(report.results.is_empty());
    }

    #[test]
    fn heuristic_rejects_short_destinations() {
        let mut tracker = tracker(ReconciliationPolicy::default());
        let report = tracker.apply_heuristic("Kael went to XY");

        assert_eq!(location(&tracker, "Kael"), "Camp");
        assert!(matches!(report.results[0], WorldUpdate::Rejected { .. }));
    }

    #[test]
    fn heuristic_matches_partial_names() {
        let mut tracker = tracker(ReconciliationPolicy::default());
        tracker.apply_heuristic("Then brave Kael entered the Crystal Cave.");
        assert_eq!(location(&tracker, "Kael"), "Crystal Cave");
    }

    #[test]
    fn heuristic_matches_names_that_contain_the_subject() {
        let mut tracker = tracker(ReconciliationPolicy::default());
        tracker.apply_heuristic("El walked to the Old Mill");

        assert_eq!(location(&tracker, "Elara"), "Old Mill");
        assert_eq!(location(&tracker, "Kael"), "Camp");
    }

    #[test]
    fn heuristic_prefers_first_registered_match() {
        let registry = CharacterRegistry::from_roster(vec![
            Character::new("Ana", "Scout").at("Camp"),
            Character::new("Anastasia", "Captain").at("Camp"),
        ])
        .unwrap();
        let mut tracker = WorldTracker::new(registry, ReconciliationPolicy::default());

        let report = tracker.apply_heuristic("Anastasia went to the Harbor");

        assert_eq!(location(&tracker, "Ana"), "Harbor");
        assert_eq!(location(&tracker, "Anastasia"), "Camp");
        assert_eq!(report.applied().count(), 1);
    }

    #[test]
    fn heuristic_handles_several_sentences() {
        let mut tracker = tracker(ReconciliationPolicy::default());
        tracker.apply_heuristic("Elara went to the market. Kael arrived at the Harbor.");

        assert_eq!(location(&tracker, "Elara"), "market");
        assert_eq!(location(&tracker, "Kael"), "Harbor");
    }

    #[test]
    fn later_patterns_overwrite_earlier_ones() {
        let mut tracker = tracker(ReconciliationPolicy::default());
        tracker.apply_heuristic("Elara reached the Tower. Elara walked to the Gate.");
        // "walked to" belongs to the first pattern, "reached" to the second.
        assert_eq!(location(&tracker, "Elara"), "Tower");
    }

    #[test]
    fn authoritative_match_ignores_case() {
        let mut tracker = tracker(ReconciliationPolicy::default());
        let update = tracker.apply_authoritative(&move_to("elara", "Market"));

        assert_eq!(location(&tracker, "Elara"), "Market");
        assert!(update.unwrap().is_applied());
    }

    #[test]
    fn authoritative_drops_unknown_characters() {
        let mut tracker = tracker(ReconciliationPolicy::default());
        let before = tracker.clone();
        let update = tracker.apply_authoritative(&move_to("Zed", "Market"));

        assert!(matches!(update, Some(WorldUpdate::Rejected { .. })));
        assert_eq!(tracker.registry(), before.registry());
        assert_eq!(tracker.names().count(), 2);
    }

    #[test]
    fn authoritative_rejects_blank_destination() {
        let mut tracker = tracker(ReconciliationPolicy::default());
        let before = tracker.clone();
        let update = tracker.apply_authoritative(&move_to("Elara", "   "));

        assert!(matches!(
            update,
            Some(WorldUpdate::Rejected {
                source: UpdateSource::Authoritative,
                ..
            })
        ));
        assert_eq!(tracker, before);
    }

    #[test]
    fn speech_does_not_touch_locations() {
        let mut tracker = tracker(ReconciliationPolicy::default());
        let update = tracker.apply_authoritative(&Capability::SpeakToCharacter(SpeakToCharacter {
            speaking_character: "Kael".into(),
            target_character: "Elara".into(),
            message: "Ready?".into(),
        }));
        assert_eq!(update, None);
    }

    #[test]
    fn authoritative_wins_defers_text_moves() {
        let mut tracker = tracker(ReconciliationPolicy::AuthoritativeWins);
        tracker.begin_step();
        tracker.apply_authoritative(&move_to("Elara", "Market"));
        let report = tracker.apply_heuristic("Elara walked to the Old Mill");

        assert_eq!(location(&tracker, "Elara"), "Market");
        assert!(matches!(report.results[0], WorldUpdate::Deferred { .. }));
    }

    #[test]
    fn last_write_wins_lets_text_overwrite() {
        let mut tracker = tracker(ReconciliationPolicy::LastWriteWins);
        tracker.begin_step();
        tracker.apply_authoritative(&move_to("Elara", "Market"));
        tracker.apply_heuristic("Elara walked to the Old Mill");

        assert_eq!(location(&tracker, "Elara"), "Old Mill");
    }

    #[test]
    fn begin_step_forgets_previous_tool_moves() {
        let mut tracker = tracker(ReconciliationPolicy::AuthoritativeWins);
        tracker.begin_step();
        tracker.apply_authoritative(&move_to("Elara", "Market"));
        tracker.begin_step();
        tracker.apply_heuristic("Elara walked to the Old Mill");

        assert_eq!(location(&tracker, "Elara"), "Old Mill");
    }
}
