use crate::model::character::Character;

pub const GENRES: [&str; 6] = ["Fantasy", "Sci-Fi", "Medieval", "Mystery", "Horror", "Western"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation {
    pub name: &'static str,
    pub role: &'static str,
    pub description: &'static str,
}

impl Recommendation {
    pub fn to_character(self) -> Character {
        Character::new(self.name, self.role)
    }
}

const FANTASY: [Recommendation; 2] = [
    Recommendation {
        name: "Elara",
        role: "Brave Adventurer",
        description: "A courageous explorer with a magical amulet and a mysterious past.",
    },
    Recommendation {
        name: "Kael",
        role: "Mysterious Companion",
        description: "A skilled ranger with cryptic knowledge of ancient secrets.",
    },
];

const SCI_FI: [Recommendation; 2] = [
    Recommendation {
        name: "Nova",
        role: "Starship Captain",
        description: "A brilliant commander navigating the politics of the galactic alliance.",
    },
    Recommendation {
        name: "Axel",
        role: "Rogue AI Engineer",
        description: "A gifted scientist with controversial views on artificial consciousness.",
    },
];

const MEDIEVAL: [Recommendation; 2] = [
    Recommendation {
        name: "Roland",
        role: "Knight of the Realm",
        description: "A noble warrior sworn to protect the kingdom against all threats.",
    },
    Recommendation {
        name: "Lyra",
        role: "Court Mystic",
        description: "An enigmatic advisor with powers drawn from ancient traditions.",
    },
];

const MYSTERY: [Recommendation; 2] = [
    Recommendation {
        name: "Detective Blake",
        role: "Private Investigator",
        description: "A sharp-witted sleuth with a knack for impossible cases.",
    },
    Recommendation {
        name: "Morgan",
        role: "Mysterious Client",
        description: "A wealthy patron with secrets that could endanger everyone involved.",
    },
];

const HORROR: [Recommendation; 2] = [
    Recommendation {
        name: "Dr. Evelyn Price",
        role: "Paranormal Researcher",
        description: "A skeptical scientist forced to confront inexplicable phenomena.",
    },
    Recommendation {
        name: "Vincent",
        role: "Enigmatic Guide",
        description: "A local who knows the dark history and legends of the region.",
    },
];

const WESTERN: [Recommendation; 2] = [
    Recommendation {
        name: "Wyatt",
        role: "Grizzled Sheriff",
        description: "A lawman with a troubled past keeping order in a lawless land.",
    },
    Recommendation {
        name: "Rose",
        role: "Saloon Owner",
        description: "A shrewd businesswoman who knows everyone's secrets in town.",
    },
];

/// Normalize a genre label into its lookup key ("Sci-Fi" -> "sci_fi").
pub fn genre_key(genre: &str) -> String {
    genre.trim().to_lowercase().replace('-', "_")
}

/// Suggested starting cast for a genre. Unknown genres get the fantasy cast.
pub fn recommendations(genre: &str) -> &'static [Recommendation] {
    match genre_key(genre).as_str() {
        "sci_fi" => &SCI_FI,
        "medieval" => &MEDIEVAL,
        "mystery" => &MYSTERY,
        "horror" => &HORROR,
        "western" => &WESTERN,
        _ => &FANTASY,
    }
}
