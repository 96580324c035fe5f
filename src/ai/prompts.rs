//! System prompts used by the generation gateway.
//!
//! Every prompt asks for a JSON payload (or a fixed text layout for recipes);
//! the gateway still parses answers defensively.

use crate::locale::{Lang, KNOWN_CATEGORIES};
use crate::session::Style;

pub const VALIDATE_TEMPERATURE: f64 = 0.1;
pub const CATEGORIES_TEMPERATURE: f64 = 0.2;
pub const DISHES_TEMPERATURE: f64 = 0.5;
pub const RECIPE_TEMPERATURE: f64 = 0.4;
pub const FREESTYLE_TEMPERATURE: f64 = 0.6;
pub const INTENT_TEMPERATURE: f64 = 0.1;

pub const SHORT_MAX_TOKENS: u32 = 300;
pub const DISHES_MAX_TOKENS: u32 = 1500;
pub const RECIPE_MAX_TOKENS: u32 = 2500;

const PAIRING_RULES: &str = "Balance the dish: pair fat with acid, sweet with salty, soft with crunchy. \
One ingredient leads the dish. Avoid hot fish with dairy and stacking several heavy proteins.";

pub fn validate_ingredients() -> &'static str {
    "You check whether a message lists edible products.\n\
Accept: foods, drinks, spices, herbs, general categories like \"vegetables\", minor typos.\n\
Reject: inedible items, insults, gibberish, greetings on their own, empty input.\n\
Reply with JSON only: {\"valid\": true|false, \"reason\": \"short reason\"}"
}

pub fn validate_input(text: &str) -> String {
    format!("Products to check: \"{text}\"")
}

pub fn analyze_categories(products: &str, allow_mix: bool) -> String {
    let sections = KNOWN_CATEGORIES
        .iter()
        .filter(|tag| allow_mix || **tag != "mix")
        .map(|tag| format!("\"{tag}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You sort a pantry into menu sections.\n\
Pantry: {products}\n\
Always available: salt, sugar, water, oil, basic spices.\n\
Sections: {sections}.\n\
Return the 2-4 sections that can realistically be cooked from the pantry, most fitting first. \
Return [] only if nothing at all can be made.\n\
Reply with a JSON array of section names only, e.g. [\"main\", \"soup\"]."
    )
}

pub fn generate_dishes(
    products: &str,
    category: &str,
    style: Style,
    count: usize,
    lang: Lang,
) -> String {
    let style_hint = match style {
        Style::Classic => "classic home cooking, familiar dishes",
        Style::Exotic => "unusual, exotic or fusion dishes",
    };
    let lang_name = lang.prompt_name();
    format!(
        "You design dishes for the \"{category}\" section.\n\
Ingredients: {products}\n\
Style: {style_hint}.\n\
{PAIRING_RULES}\n\
Suggest exactly {count} dishes using only the ingredients plus pantry staples.\n\
Write display names and descriptions in {lang_name}.\n\
Reply with JSON only:\n\
[{{\"name\": \"dish name\", \"display_name\": \"short name for a button\", \"desc\": \"one appetising sentence\"}}]"
    )
}

fn recipe_layout(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "<Название блюда>\n\
📦 Ингредиенты:\n\
- <продукт> — <количество>\n\
📊 Пищевая ценность на порцию:\n\
Белки: <г> · Жиры: <г> · Углеводы: <г> · Энергия: <ккал>\n\
⏱ Время: <минуты>\n\
👨‍🍳 Приготовление:\n\
1. <шаг>\n\
💡 Совет шефа: <одного ингредиента не хватает для баланса — назовите его>",
        Lang::En => "<Dish name>\n\
📦 Ingredients:\n\
- <product> — <amount>\n\
📊 Nutrition per serving:\n\
Protein: <g> · Fat: <g> · Carbohydrates: <g> · Energy: <kcal>\n\
⏱ Time: <minutes>\n\
👨‍🍳 Steps:\n\
1. <step>\n\
💡 Chef's tip: <one missing ingredient that would balance the dish>",
    }
}

pub fn generate_recipe(dish: &str, products: &str, lang: Lang) -> String {
    let layout = recipe_layout(lang);
    let lang_name = lang.prompt_name();
    format!(
        "You write a precise recipe card for \"{dish}\".\n\
Pantry: {products}\n\
{PAIRING_RULES}\n\
Use pantry items and staples. Do not comment on pantry items you leave out.\n\
Always fill in the nutrition line with numbers per serving.\n\
Write everything in {lang_name}, plain text, following this layout:\n{layout}"
    )
}

pub fn generate_freestyle_recipe(dish: &str, lang: Lang) -> String {
    let layout = recipe_layout(lang);
    let lang_name = lang.prompt_name();
    format!(
        "You write a recipe card for \"{dish}\" without pantry limits.\n\
If the name is a metaphor rather than food, cook it symbolically but keep the layout.\n\
Always fill in the nutrition line with numbers per serving.\n\
Write everything in {lang_name}, plain text, following this layout:\n{layout}"
    )
}

pub fn determine_intent(last_bot_message: Option<&str>) -> String {
    let context = last_bot_message.unwrap_or("(none)");
    format!(
        "You classify one message sent to a cooking assistant.\n\
The assistant's previous message was: \"{context}\"\n\
Intents:\n\
- \"ingredients\": the user lists products they have (put them in \"products\")\n\
- \"add\": the user adds products to an earlier list (put them in \"products\")\n\
- \"select\": the user picks a dish from the offered menu (put it in \"dish\")\n\
- \"recipe\": the user asks for a recipe of a named dish (put it in \"dish\")\n\
- \"small_talk\": greetings or thanks (set \"kind\" to \"greeting\" or \"gratitude\")\n\
- \"unclear\": anything else\n\
Reply with JSON only: {{\"intent\": \"...\", \"dish\": null, \"products\": null, \"kind\": null}}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_is_only_offered_when_allowed() {
        assert!(analyze_categories("a", true).contains("\"mix\""));
        assert!(!analyze_categories("a", false).contains("\"mix\""));
    }

    #[test]
    fn recipe_prompt_requests_nutrition_in_language() {
        let ru = generate_recipe("Плов", "рис", Lang::Ru);
        assert!(ru.contains("Белки") && ru.contains("Russian"));
        let en = generate_freestyle_recipe("Pilaf", Lang::En);
        assert!(en.contains("Protein") && en.contains("English"));
    }
}
