use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Default, Clone)]
pub struct Category {
    /// UUID of the category
    pub id: Uuid,
    /// Name of the category, unique case-insensitively
    pub name: String,
    /// Accent color of the category
    pub color: Color,
}

/// The fixed accent palette categories draw their colors from.
#[derive(Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Blue,
    Green,
    Orange,
    Pink,
    Purple,
    Red,
    Teal,
    Yellow,
    Indigo,
    Mint,
    Cyan,
    Brown,
    Gray,
}

pub const PALETTE: [Color; 13] = [
    Color::Blue,
    Color::Green,
    Color::Orange,
    Color::Pink,
    Color::Purple,
    Color::Red,
    Color::Teal,
    Color::Yellow,
    Color::Indigo,
    Color::Mint,
    Color::Cyan,
    Color::Brown,
    Color::Gray,
];

impl Color {
    pub fn name(&self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Orange => "orange",
            Color::Pink => "pink",
            Color::Purple => "purple",
            Color::Red => "red",
            Color::Teal => "teal",
            Color::Yellow => "yellow",
            Color::Indigo => "indigo",
            Color::Mint => "mint",
            Color::Cyan => "cyan",
            Color::Brown => "brown",
            Color::Gray => "gray",
        }
    }

    pub fn from_name(name: &str) -> Option<Color> {
        PALETTE
            .iter()
            .copied()
            .find(|color| color.name() == name.to_lowercase())
    }
}
