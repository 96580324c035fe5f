//! Language selection and localised category labels.

use crate::text_utils::capitalize_first;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    Ru,
    En,
}

impl Lang {
    /// Maps a Telegram `language_code` (e.g. `en-US`) to a supported language.
    pub fn from_code(code: &str) -> Self {
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        if primary.eq_ignore_ascii_case("en") {
            Lang::En
        } else {
            Lang::Ru
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lang::Ru => "ru",
            Lang::En => "en",
        }
    }

    /// Language name as it should appear in generation prompts.
    pub fn prompt_name(self) -> &'static str {
        match self {
            Lang::Ru => "Russian",
            Lang::En => "English",
        }
    }
}

/// Category tags the generator may return.
pub const KNOWN_CATEGORIES: [&str; 8] = [
    "breakfast",
    "soup",
    "main",
    "salad",
    "snack",
    "dessert",
    "drink",
    "mix",
];

pub fn category_label(tag: &str, lang: Lang) -> String {
    let label = match (lang, tag) {
        (Lang::Ru, "breakfast") => "🍳 Завтраки",
        (Lang::Ru, "soup") => "🍲 Супы",
        (Lang::Ru, "main") => "🍝 Вторые блюда",
        (Lang::Ru, "salad") => "🥗 Салаты",
        (Lang::Ru, "snack") => "🥪 Закуски",
        (Lang::Ru, "dessert") => "🍰 Десерты",
        (Lang::Ru, "drink") => "🥤 Напитки",
        (Lang::Ru, "mix") => "🍱 Комплексные обеды",
        (Lang::En, "breakfast") => "🍳 Breakfast",
        (Lang::En, "soup") => "🍲 Soups",
        (Lang::En, "main") => "🍝 Main Dishes",
        (Lang::En, "salad") => "🥗 Salads",
        (Lang::En, "snack") => "🥪 Snacks",
        (Lang::En, "dessert") => "🍰 Desserts",
        (Lang::En, "drink") => "🥤 Drinks",
        (Lang::En, "mix") => "🍱 Set Meals",
        _ => return capitalize_first(tag),
    };
    label.to_string()
}
