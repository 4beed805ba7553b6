use serde::{
    Deserialize,
    Serialize,
};

/// Base alphabet the decks are generated from: letter plus the example word
/// spoken on the card back.
const BASE_ALPHABET: &[(char, &str)] = &[
    ('A', "Apple"),
    ('B', "Ball"),
    ('C', "Cat"),
    ('D', "Dog"),
    ('E', "Elephant"),
    ('F', "Fish"),
    ('G', "Guitar"),
    ('H', "Hat"),
    ('I', "Igloo"),
    ('J', "Juice"),
    ('K', "Kite"),
    ('L', "Lion"),
    ('M', "Moon"),
    ('N', "Nest"),
    ('O', "Octopus"),
    ('P', "Pig"),
    ('Q', "Queen"),
    ('R', "Rainbow"),
    ('S', "Sun"),
    ('T', "Turtle"),
    ('U', "Umbrella"),
    ('V', "Violin"),
    ('W', "Whale"),
    ('X', "X-Ray"),
    ('Y', "Yo-Yo"),
    ('Z', "Zebra"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckId {
    Uppercase,
    Lowercase,
    Mixed,
}

impl DeckId {
    pub const ALL: [DeckId; 3] = [DeckId::Uppercase, DeckId::Lowercase, DeckId::Mixed];

    /// Stable form used in storage keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeckId::Uppercase => "uppercase",
            DeckId::Lowercase => "lowercase",
            DeckId::Mixed => "mixed",
        }
    }

    pub fn parse(s: &str) -> Option<DeckId> {
        match s {
            "uppercase" => Some(DeckId::Uppercase),
            "lowercase" => Some(DeckId::Lowercase),
            "mixed" => Some(DeckId::Mixed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    pub id: DeckId,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub card_count: usize,
}

pub static DECKS: [Deck; 3] = [
    Deck {
        id: DeckId::Uppercase,
        name: "Uppercase Letters",
        description: "Learn A B C to Z",
        icon: "ABC",
        card_count: 26,
    },
    Deck {
        id: DeckId::Lowercase,
        name: "Lowercase Letters",
        description: "Learn a b c to z",
        icon: "abc",
        card_count: 26,
    },
    Deck {
        id: DeckId::Mixed,
        name: "All Letters",
        description: "Both Aa Bb Cc to Zz",
        icon: "AaBb",
        card_count: 52,
    },
];

pub fn deck_by_id(id: DeckId) -> &'static Deck {
    match id {
        DeckId::Uppercase => &DECKS[0],
        DeckId::Lowercase => &DECKS[1],
        DeckId::Mixed => &DECKS[2],
    }
}

/// One learnable unit. Uppercase and lowercase variants of the same letter
/// are distinct cards with distinct ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub front_glyph: String,
    pub back_glyph: String,
    pub example_word: String,
    pub spoken_prompt: String,
}

fn uppercase_card(letter: char, word: &str) -> Card {
    Card {
        id: letter.to_string(),
        front_glyph: letter.to_string(),
        back_glyph: letter.to_string(),
        example_word: word.to_string(),
        spoken_prompt: format!("{} is for {}", letter, word),
    }
}

fn lowercase_card(letter: char, word: &str) -> Card {
    let lower = letter.to_ascii_lowercase();
    Card {
        // "_lower" suffix keeps the id distinct from the uppercase variant
        id: format!("{}_lower", lower),
        front_glyph: lower.to_string(),
        back_glyph: lower.to_string(),
        example_word: word.to_string(),
        spoken_prompt: format!("{} is for {}", lower, word),
    }
}

/// Deterministic card list for a deck, in base-alphabet order. The mixed deck
/// lists the full uppercase block before the lowercase block.
pub fn cards_for_deck(id: DeckId) -> Vec<Card> {
    match id {
        DeckId::Uppercase => {
            BASE_ALPHABET.iter().map(|&(letter, word)| uppercase_card(letter, word)).collect()
        }
        DeckId::Lowercase => {
            BASE_ALPHABET.iter().map(|&(letter, word)| lowercase_card(letter, word)).collect()
        }
        DeckId::Mixed => BASE_ALPHABET
            .iter()
            .map(|&(letter, word)| uppercase_card(letter, word))
            .chain(BASE_ALPHABET.iter().map(|&(letter, word)| lowercase_card(letter, word)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_sizes_match_their_card_lists() {
        for deck in &DECKS {
            assert_eq!(cards_for_deck(deck.id).len(), deck.card_count);
        }
    }

    #[test]
    fn mixed_deck_is_uppercase_then_lowercase() {
        let cards = cards_for_deck(DeckId::Mixed);
        assert_eq!(cards.len(), 52);
        assert_eq!(cards[0].id, "A");
        assert_eq!(cards[25].id, "Z");
        assert_eq!(cards[26].id, "a_lower");
        assert_eq!(cards[51].id, "z_lower");
    }

    #[test]
    fn case_variants_never_share_an_id() {
        let upper = cards_for_deck(DeckId::Uppercase);
        let lower = cards_for_deck(DeckId::Lowercase);
        for (up, low) in upper.iter().zip(lower.iter()) {
            assert_ne!(up.id, low.id);
        }
    }

    #[test]
    fn spoken_prompts_name_the_example_word() {
        let cards = cards_for_deck(DeckId::Lowercase);
        assert_eq!(cards[0].spoken_prompt, "a is for Apple");
        assert_eq!(cards[0].example_word, "Apple");
        assert_eq!(cards[0].front_glyph, "a");
    }

    #[test]
    fn deck_id_strings_round_trip() {
        for id in DeckId::ALL {
            assert_eq!(DeckId::parse(id.as_str()), Some(id));
        }
        assert_eq!(DeckId::parse("cursive"), None);
    }

    #[test]
    fn deck_lookup_matches_id() {
        for id in DeckId::ALL {
            assert_eq!(deck_by_id(id).id, id);
        }
    }
}
