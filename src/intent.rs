//! Classification of incoming utterances.
//!
//! Cheap phrase checks run first; only free text that still could mean several
//! things in a non-idle session is sent to the generation gateway. A gateway
//! answer that cannot be parsed always ends up as [`Intent::Unclear`].

use tracing::debug;

use crate::action::Action;
use crate::ai::gateway::{GenerationGateway, IntentKind, IntentPayload, SmallTalkKind};
use crate::session::{Session, Status};
use crate::text_utils::{looks_like_list, normalize_for_match, strip_prefix_ci};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmallTalk {
    Gratitude,
    Greeting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    NewIngredients(String),
    AddIngredients(String),
    SelectDish(String),
    DirectRecipeRequest(String),
    SmallTalk(SmallTalk),
    Command(Action),
    Unclear,
}

const RESET_PHRASES: [&str; 8] = [
    "сброс",
    "сбросить",
    "заново",
    "начать заново",
    "новые продукты",
    "reset",
    "start over",
    "new products",
];

const REPEAT_PHRASES: [&str; 7] = [
    "другой вариант",
    "еще вариант",
    "другой рецепт",
    "повтори",
    "another",
    "another variant",
    "another one",
];

const BACK_PHRASES: [&str; 4] = ["назад", "к категориям", "back", "back to categories"];

const COOK_PHRASES: [&str; 5] = ["готовить", "готовим", "что приготовить", "cook", "let's cook"];

const GRATITUDE_PHRASES: [&str; 8] = [
    "спасибо",
    "спс",
    "благодарю",
    "мерси",
    "thanks",
    "thank you",
    "thx",
    "cheers",
];

const GREETING_PHRASES: [&str; 9] = [
    "привет",
    "здравствуй",
    "здравствуйте",
    "добрый день",
    "добрый вечер",
    "доброе утро",
    "hello",
    "hi",
    "hey",
];

// Longest first so "дай рецепт" wins over "рецепт".
const RECIPE_PREFIXES: [&str; 9] = [
    "give me a recipe for",
    "give me a recipe",
    "give me recipe",
    "как приготовить",
    "how to cook",
    "дай рецепт",
    "recipe for",
    "рецепт",
    "recipe",
];

const ADD_PREFIXES: [&str; 8] = [
    "добавь",
    "добавить",
    "и еще",
    "еще",
    "ещё",
    "плюс",
    "add",
    "plus",
];

/// Gratitude is only recognised in short messages.
const GRATITUDE_MAX_WORDS: usize = 4;

fn is_phrase(normalized: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| normalized == *p)
}

fn is_gratitude(normalized: &str) -> bool {
    normalized.split_whitespace().count() <= GRATITUDE_MAX_WORDS
        && GRATITUDE_PHRASES
            .iter()
            .any(|p| strip_prefix_ci(normalized, p).is_some())
}

fn strip_any<'a>(text: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|p| strip_prefix_ci(text, p))
        .filter(|rest| !rest.is_empty())
}

/// New list or an addition, depending on what the session already holds.
fn ingredients(text: &str, session: &Session) -> Intent {
    if session.has_products() && session.status != Status::RecipeSent {
        Intent::AddIngredients(text.to_string())
    } else {
        Intent::NewIngredients(text.to_string())
    }
}

/// Deterministic part of the classifier. `None` means the text is ambiguous.
pub fn classify_fast(text: &str, session: &Session) -> Option<Intent> {
    let text = text.trim();
    let normalized = normalize_for_match(text);
    if normalized.is_empty() {
        return Some(Intent::Unclear);
    }

    if is_phrase(&normalized, &RESET_PHRASES) {
        return Some(Intent::Command(Action::Reset));
    }
    if is_phrase(&normalized, &REPEAT_PHRASES) {
        return Some(Intent::Command(Action::Repeat));
    }
    if session.has_products() {
        if is_phrase(&normalized, &BACK_PHRASES) {
            return Some(Intent::Command(Action::Back));
        }
        if is_phrase(&normalized, &COOK_PHRASES) {
            return Some(Intent::Command(Action::Cook));
        }
    }
    if is_gratitude(&normalized) {
        // Closing only makes sense right after a recipe; otherwise the words
        // are taken literally.
        return Some(if session.status == Status::RecipeSent {
            Intent::SmallTalk(SmallTalk::Gratitude)
        } else {
            ingredients(text, session)
        });
    }
    if is_phrase(&normalized, &GREETING_PHRASES) {
        return Some(Intent::SmallTalk(SmallTalk::Greeting));
    }
    if let Some(dish) = strip_any(text, &RECIPE_PREFIXES) {
        return Some(Intent::DirectRecipeRequest(dish.to_string()));
    }
    if session.status == Status::AwaitingAddition {
        let items = strip_any(text, &ADD_PREFIXES).unwrap_or(text);
        return Some(Intent::AddIngredients(items.to_string()));
    }
    if let Some(items) = strip_any(text, &ADD_PREFIXES) {
        return Some(if session.has_products() {
            Intent::AddIngredients(items.to_string())
        } else {
            Intent::NewIngredients(items.to_string())
        });
    }
    if looks_like_list(text) {
        return Some(ingredients(text, session));
    }
    if !session.has_products() {
        return Some(Intent::NewIngredients(text.to_string()));
    }
    session
        .find_dish(text)
        .map(|dish| Intent::SelectDish(dish.name.clone()))
}

/// Turns the gateway's payload into an [`Intent`] valid for this session.
pub fn coerce_payload(payload: IntentPayload, text: &str, session: &Session) -> Intent {
    let non_empty = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    match payload.intent {
        IntentKind::Ingredients => {
            ingredients(&non_empty(payload.products).unwrap_or_else(|| text.to_string()), session)
        }
        IntentKind::Add => {
            let items = non_empty(payload.products).unwrap_or_else(|| text.to_string());
            if session.has_products() {
                Intent::AddIngredients(items)
            } else {
                Intent::NewIngredients(items)
            }
        }
        IntentKind::Select => match non_empty(payload.dish) {
            Some(name) => match session.find_dish(&name) {
                Some(dish) => Intent::SelectDish(dish.name.clone()),
                None => Intent::DirectRecipeRequest(name),
            },
            None => Intent::Unclear,
        },
        IntentKind::Recipe => match non_empty(payload.dish) {
            Some(name) => Intent::DirectRecipeRequest(name),
            None => Intent::Unclear,
        },
        IntentKind::SmallTalk => match payload.kind.unwrap_or_default() {
            SmallTalkKind::Gratitude if session.status == Status::RecipeSent => {
                Intent::SmallTalk(SmallTalk::Gratitude)
            }
            _ => Intent::SmallTalk(SmallTalk::Greeting),
        },
        IntentKind::Unclear => Intent::Unclear,
    }
}

pub async fn classify(text: &str, session: &Session, gateway: &dyn GenerationGateway) -> Intent {
    if let Some(intent) = classify_fast(text, session) {
        debug!(user_id = session.user_id, ?intent, "classified locally");
        return intent;
    }
    let payload = gateway
        .determine_intent(text.trim(), session.last_bot_message())
        .await;
    let intent = coerce_payload(payload, text.trim(), session);
    debug!(user_id = session.user_id, ?intent, "classified by gateway");
    intent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Dish;
    use crate::tests::util::FakeGateway;

    fn with_products(products: &str) -> Session {
        let mut session = Session::new(1);
        session.set_products(products);
        session.set_status(Status::AwaitingStyle);
        session
    }

    #[test]
    fn idle_text_is_a_new_list() {
        let session = Session::new(1);
        assert_eq!(
            classify_fast("курица, рис, лук", &session),
            Some(Intent::NewIngredients("курица, рис, лук".into()))
        );
        assert_eq!(
            classify_fast("asdkjh", &session),
            Some(Intent::NewIngredients("asdkjh".into()))
        );
    }

    #[test]
    fn list_with_products_is_an_addition() {
        let session = with_products("курица");
        assert_eq!(
            classify_fast("сыр, хлеб", &session),
            Some(Intent::AddIngredients("сыр, хлеб".into()))
        );
        assert_eq!(
            classify_fast("добавь сыр", &session),
            Some(Intent::AddIngredients("сыр".into()))
        );
    }

    #[test]
    fn list_after_recipe_starts_over() {
        let mut session = with_products("курица");
        session.set_status(Status::RecipeSent);
        assert_eq!(
            classify_fast("сыр, хлеб", &session),
            Some(Intent::NewIngredients("сыр, хлеб".into()))
        );
    }

    #[test]
    fn gratitude_only_closes_after_recipe() {
        let mut session = with_products("курица");
        assert_eq!(
            classify_fast("Спасибо!", &session),
            Some(Intent::AddIngredients("Спасибо!".into()))
        );
        session.set_status(Status::RecipeSent);
        assert_eq!(
            classify_fast("Спасибо!", &session),
            Some(Intent::SmallTalk(SmallTalk::Gratitude))
        );
        assert_eq!(
            classify_fast("thank you so much", &session),
            Some(Intent::SmallTalk(SmallTalk::Gratitude))
        );
    }

    #[test]
    fn commands_win_in_any_state() {
        let mut session = with_products("курица");
        session.set_status(Status::RecipeSent);
        assert_eq!(
            classify_fast("Сброс", &session),
            Some(Intent::Command(Action::Reset))
        );
        assert_eq!(
            classify_fast("ещё вариант", &session),
            Some(Intent::Command(Action::Repeat))
        );
        assert_eq!(
            classify_fast("reset", &Session::new(2)),
            Some(Intent::Command(Action::Reset))
        );
    }

    #[test]
    fn recipe_prefix_is_a_direct_request() {
        let session = Session::new(1);
        assert_eq!(
            classify_fast("Дай рецепт борща", &session),
            Some(Intent::DirectRecipeRequest("борща".into()))
        );
        assert_eq!(
            classify_fast("recipe for carbonara", &session),
            Some(Intent::DirectRecipeRequest("carbonara".into()))
        );
    }

    #[test]
    fn awaiting_addition_takes_any_text() {
        let mut session = with_products("курица");
        session.set_status(Status::AwaitingAddition);
        assert_eq!(
            classify_fast("сыр", &session),
            Some(Intent::AddIngredients("сыр".into()))
        );
    }

    #[test]
    fn dish_name_selects_from_menu() {
        let mut session = with_products("курица, рис");
        session.set_status(Status::None);
        session.set_dishes(vec![Dish {
            name: "plov".into(),
            display_name: "Плов".into(),
            description: String::new(),
        }]);
        assert_eq!(
            classify_fast("плов", &session),
            Some(Intent::SelectDish("plov".into()))
        );
        assert_eq!(classify_fast("а если без риса", &session), None);
    }

    #[test]
    fn coerce_select_without_match_requests_recipe() {
        let session = with_products("курица");
        let payload = IntentPayload {
            intent: IntentKind::Select,
            dish: Some("Борщ".into()),
            ..IntentPayload::default()
        };
        assert_eq!(
            coerce_payload(payload, "борщ", &session),
            Intent::DirectRecipeRequest("Борщ".into())
        );
    }

    #[test]
    fn coerce_gratitude_respects_status() {
        let session = with_products("курица");
        let payload = IntentPayload {
            intent: IntentKind::SmallTalk,
            kind: Some(SmallTalkKind::Gratitude),
            ..IntentPayload::default()
        };
        assert_eq!(
            coerce_payload(payload, "мерси вам", &session),
            Intent::SmallTalk(SmallTalk::Greeting)
        );
    }

    #[tokio::test]
    async fn malformed_gateway_answer_is_unclear() {
        let session = with_products("курица");
        let gateway = FakeGateway::default();
        let intent = classify("а если без риса", &session, &gateway).await;
        assert_eq!(intent, Intent::Unclear);
    }

    #[tokio::test]
    async fn gateway_answer_is_used_for_ambiguous_text() {
        let session = with_products("курица");
        let gateway = FakeGateway {
            intent: IntentPayload {
                intent: IntentKind::Add,
                products: Some("сыр".into()),
                ..IntentPayload::default()
            },
            ..FakeGateway::default()
        };
        let intent = classify("а ещё у меня есть сыр", &session, &gateway).await;
        assert_eq!(intent, Intent::AddIngredients("сыр".into()));
    }
}
