//! Keyboard actions and their callback-data encoding.

use crate::session::{DishRef, Style};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Style(Style),
    Cook,
    AddMore,
    Reset,
    Repeat,
    Back,
    Category(String),
    Dish(DishRef),
}

impl Action {
    /// Encodes the action as Telegram callback data (max 64 bytes).
    pub fn to_callback_data(&self) -> String {
        match self {
            Action::Style(style) => format!("style:{}", style.as_str()),
            Action::Cook => "cook".to_string(),
            Action::AddMore => "add".to_string(),
            Action::Reset => "reset".to_string(),
            Action::Repeat => "repeat".to_string(),
            Action::Back => "back".to_string(),
            Action::Category(tag) => format!("cat:{tag}"),
            Action::Dish(dish) => format!("dish:{}:{}", dish.generation, dish.index),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "cook" => return Some(Action::Cook),
            "add" => return Some(Action::AddMore),
            "reset" => return Some(Action::Reset),
            "repeat" => return Some(Action::Repeat),
            "back" => return Some(Action::Back),
            _ => {}
        }
        let (kind, rest) = data.split_once(':')?;
        match kind {
            "style" => Style::parse(rest).map(Action::Style),
            "cat" if !rest.is_empty() => Some(Action::Category(rest.to_string())),
            "dish" => {
                let (generation, index) = rest.split_once(':')?;
                Some(Action::Dish(DishRef {
                    generation: generation.parse().ok()?,
                    index: index.parse().ok()?,
                }))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_data_parses_back() {
        let actions = [
            Action::Style(Style::Exotic),
            Action::Cook,
            Action::AddMore,
            Action::Reset,
            Action::Repeat,
            Action::Back,
            Action::Category("soup".into()),
            Action::Dish(DishRef {
                generation: 12,
                index: 3,
            }),
        ];
        for action in actions {
            let data = action.to_callback_data();
            assert!(data.len() <= 64);
            assert_eq!(Action::parse(&data), Some(action));
        }
    }

    #[test]
    fn garbage_callback_data_is_rejected() {
        for data in ["", "dish:1", "dish:x:1", "dish:1:-1", "style:spicy", "cat:", "unknown"] {
            assert_eq!(Action::parse(data), None, "{data}");
        }
    }
}
