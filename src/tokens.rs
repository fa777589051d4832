//! Token identity suggestions for content that looks meme-worthy.

use crate::feeds::TokenRequest;

pub const DEFAULT_SUPPLY: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSuggestion {
    pub name: String,
    pub symbol: String,
    pub description: String,
}

impl TokenSuggestion {
    /// Pre-filled creation request; the creator still has to be entered.
    pub fn into_request(self, creator: impl Into<String>) -> TokenRequest {
        TokenRequest {
            name: self.name,
            symbol: self.symbol,
            creator: creator.into(),
            initial_supply: DEFAULT_SUPPLY,
            description: self.description,
        }
    }
}

/// Derives a name and ticker from keywords, or from the content itself.
pub fn suggest(keywords: &[String], content: &str) -> TokenSuggestion {
    let description = if content.trim().is_empty() {
        "A new meme token".to_string()
    } else {
        content.to_string()
    };

    let (name, symbol) = match keywords {
        [first, rest @ ..] => {
            let mut base = capitalize(first);
            if let Some(second) = rest.first() {
                base.push_str(&capitalize(second));
            }
            let consonants: String = base
                .chars()
                .filter(|c| !matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
                .take(4)
                .collect();
            let symbol = if consonants.chars().count() < 3 {
                prefix_upper(&base, 4)
            } else {
                consonants.to_uppercase()
            };
            (format!("{} Coin", base), symbol)
        }
        [] => match content.split_whitespace().find(|w| w.chars().count() > 3) {
            Some(word) => {
                let base = capitalize(word);
                let symbol = prefix_upper(&base, 3);
                (format!("{} Token", base), symbol)
            }
            None => ("Meme Token".to_string(), "MEME".to_string()),
        },
    };

    TokenSuggestion {
        name,
        symbol,
        description,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn prefix_upper(word: &str, len: usize) -> String {
    word.chars().take(len).collect::<String>().to_uppercase()
}
