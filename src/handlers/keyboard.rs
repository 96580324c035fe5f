use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::controller::Button;

/// Maps controller button rows onto an inline keyboard, one button per
/// callback.
pub fn build_markup(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.action.to_callback_data()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::build_markup;
    use crate::action::Action;
    use crate::controller::Button;
    use crate::session::DishRef;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn build_markup_keeps_rows_and_callback_data() {
        let rows = vec![
            vec![Button {
                label: "Плов".into(),
                action: Action::Dish(DishRef {
                    generation: 3,
                    index: 0,
                }),
            }],
            vec![
                Button {
                    label: "➕".into(),
                    action: Action::AddMore,
                },
                Button {
                    label: "🗑".into(),
                    action: Action::Reset,
                },
            ],
        ];
        let markup = build_markup(&rows);

        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[1].len(), 2);
        assert_eq!(markup.inline_keyboard[0][0].text, "Плов");
        match &markup.inline_keyboard[0][0].kind {
            InlineKeyboardButtonKind::CallbackData(data) => assert_eq!(data, "dish:3:0"),
            _ => panic!("expected callback data"),
        }
    }
}
