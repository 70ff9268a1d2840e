use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LOCATION: &str = "Starting Location";
pub const MIN_CHARACTERS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub role: String,
    pub location: String,
}

impl Character {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            location: DEFAULT_LOCATION.into(),
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("every character needs a name")]
    EmptyName,

    #[error("character '{0}' needs a role")]
    EmptyRole(String),

    #[error("character '{0}' is already in the cast")]
    DuplicateCharacter(String),

    #[error("at least {MIN_CHARACTERS} characters are needed to start, got {0}")]
    TooFewCharacters(usize),
}

/// World-state registry: name -> role + location, kept in registration order.
///
/// The set of characters is fixed once the story starts; only locations
/// change afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRegistry {
    characters: Vec<Character>,
}

impl CharacterRegistry {
    /// Validate a setup roster and build the registry from it.
    pub fn from_roster(roster: Vec<Character>) -> Result<Self, SetupError> {
        if roster.len() < MIN_CHARACTERS {
            return Err(SetupError::TooFewCharacters(roster.len()));
        }

        let mut registry = Self::default();
        for character in roster {
            registry.register(character)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, character: Character) -> Result<(), SetupError> {
        let name = character.name.trim();
        if name.is_empty() {
            return Err(SetupError::EmptyName);
        }
        if character.role.trim().is_empty() {
            return Err(SetupError::EmptyRole(name.to_string()));
        }
        if self.get(name).is_some() {
            return Err(SetupError::DuplicateCharacter(name.to_string()));
        }

        self.characters.push(Character {
            name: name.to_string(),
            role: character.role.trim().to_string(),
            location: character.location,
        });
        Ok(())
    }

    /// Exact, case-sensitive lookup by canonical name.
    pub fn get(&self, name: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.name == name)
    }

    /// Canonical name of the first character whose name equals `name`
    /// ignoring case.
    pub fn find_ignore_case(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        self.characters
            .iter()
            .find(|c| c.name.to_lowercase() == wanted)
            .map(|c| c.name.as_str())
    }

    /// Returns false when no character has that exact name.
    pub fn set_location(&mut self, name: &str, location: &str) -> bool {
        match self.characters.iter_mut().find(|c| c.name == name) {
            Some(character) => {
                character.location = location.to_string();
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.characters.iter().map(|c| c.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}
