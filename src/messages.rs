//! Shared text sent by the bot.
//!
//! Keep all user-facing strings in this module so they stay in one place and are
//! easy to update or translate. Strings are HTML; callers escape any
//! interpolated user or model text.

use crate::locale::Lang;

pub fn welcome(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "👋 Здравствуйте.\n\n🎤 <b>Отправьте</b> голосовое или текстовое сообщение с перечнем продуктов, и я подскажу, что из них можно приготовить.\n📝 Или напишите <b>«Дай рецепт [блюдо]»</b>.",
        Lang::En => "👋 Hello.\n\n🎤 <b>Send</b> a voice or text message with a list of products, and I'll suggest what you can cook.\n📝 Or write <b>\"Give me recipe [dish]\"</b>.",
    }
}

pub fn help(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "Пришлите продукты через запятую, например: <i>курица, рис, лук</i>.\n\n<b>Команды:</b>\n/start - Начать заново.\n/reset - Сбросить продукты.\n/author - Автор бота.\n/help - Эта подсказка.",
        Lang::En => "Send your products separated by commas, e.g. <i>chicken, rice, onion</i>.\n\n<b>Commands:</b>\n/start - Start over.\n/reset - Forget the products.\n/author - About the author.\n/help - This help.",
    }
}

pub fn author(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "👨‍💻 Автор бота: @inikonoff",
        Lang::En => "👨‍💻 Bot creator: @inikonoff",
    }
}

pub fn products_accepted(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "✅ Продукты приняты.\nКакой стиль готовки?",
        Lang::En => "✅ Products accepted.\nWhat cooking style?",
    }
}

pub fn added_products(lang: Lang, items: &str) -> String {
    match lang {
        Lang::Ru => format!("➕ Добавил: <b>{items}</b>.\nКакой стиль готовки?"),
        Lang::En => format!("➕ Added: <b>{items}</b>.\nWhat cooking style?"),
    }
}

pub fn not_products(lang: Lang, text: &str) -> String {
    match lang {
        Lang::Ru => format!("🤨 <b>«{text}»</b> — не похоже на продукты."),
        Lang::En => format!("🤨 <b>\"{text}\"</b> doesn't look like food."),
    }
}

pub fn send_more_products(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "✍️ Напишите, что добавить.",
        Lang::En => "✍️ Tell me what to add.",
    }
}

pub fn what_to_cook(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "📂 <b>Что будем готовить?</b>",
        Lang::En => "📂 <b>What shall we cook?</b>",
    }
}

pub fn nothing_to_cook(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "🤷 Из этих продуктов ничего не получается. Добавьте что-нибудь ещё или начните заново.",
        Lang::En => "🤷 Nothing can be made from these products. Add something else or start over.",
    }
}

pub fn menu_title(lang: Lang, category: &str) -> String {
    match lang {
        Lang::Ru => format!("🍽 <b>Меню: {category}</b>\n\n"),
        Lang::En => format!("🍽 <b>Menu: {category}</b>\n\n"),
    }
}

pub fn generation_failed(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "😔 Кухня не справилась с заказом. Попробуйте ещё раз.",
        Lang::En => "😔 The kitchen couldn't handle that order. Please try again.",
    }
}

pub fn menu_expired(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "⌛ Это меню устарело. Выберите категорию заново.",
        Lang::En => "⌛ This menu has expired. Please pick a category again.",
    }
}

pub fn nothing_to_repeat(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "🤔 Пока нечего повторять. Пришлите продукты или название блюда.",
        Lang::En => "🤔 Nothing to repeat yet. Send products or a dish name.",
    }
}

pub fn unclear(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "🤔 Не понял. Пришлите список продуктов через запятую или напишите «Дай рецепт [блюдо]».",
        Lang::En => "🤔 I didn't get that. Send a comma-separated product list or write \"Give me recipe [dish]\".",
    }
}

pub fn thanks_reply(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "На здоровье! 👨‍🍳",
        Lang::En => "You're welcome! 👨‍🍳",
    }
}

pub fn bon_appetit(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "👨‍🍳 <b>Приятного аппетита!</b>",
        Lang::En => "👨‍🍳 <b>Bon appétit!</b>",
    }
}

pub fn heard(lang: Lang, text: &str) -> String {
    match lang {
        Lang::Ru => format!("🎧 Услышал: <i>{text}</i>"),
        Lang::En => format!("🎧 Heard: <i>{text}</i>"),
    }
}

pub fn speech_not_recognized(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "Речь не распознана",
        Lang::En => "Speech was not recognized",
    }
}

pub fn internal_error(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "⚠️ Что-то пошло не так. Попробуйте ещё раз чуть позже.",
        Lang::En => "⚠️ Something went wrong. Please try again a bit later.",
    }
}

pub fn style_classic_label(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "🏠 Классический / Домашний",
        Lang::En => "🏠 Classic / Home-style",
    }
}

pub fn style_exotic_label(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "🌶 Экзотический / Необычный",
        Lang::En => "🌶 Exotic / Unusual",
    }
}

pub fn add_more_label(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "➕ Добавить продукты",
        Lang::En => "➕ Add products",
    }
}

pub fn reset_label(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "🗑 Сброс",
        Lang::En => "🗑 Reset",
    }
}

pub fn retry_label(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "🔁 Повторить",
        Lang::En => "🔁 Retry",
    }
}

pub fn back_to_categories_label(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "⬅️ Назад к категориям",
        Lang::En => "⬅️ Back to categories",
    }
}

pub fn another_variant_label(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "🔄 Другой вариант",
        Lang::En => "🔄 Another variant",
    }
}
