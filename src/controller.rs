//! Conversation state machine.
//!
//! A turn takes the per-user lock, works on a copy of the session and writes it
//! back only if the turn commits. Rejected input, gateway failures and stale
//! menus leave the stored session exactly as it was.

use std::sync::Arc;

use anyhow::Result;
use teloxide::utils::html::escape;
use tracing::{debug, info};

use crate::action::Action;
use crate::ai::gateway::GenerationGateway;
use crate::intent::{classify, Intent, SmallTalk};
use crate::locale::{category_label, Lang};
use crate::messages;
use crate::session::{DishRef, Role, Session, SessionStore, Status, Style, UserId, UserLocks};

/// Maximum grapheme length of a dish button.
const BUTTON_LABEL_MAX: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Outbound message: HTML text plus an optional keyboard of actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Vec<Vec<Button>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Vec::new(),
        }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: Vec<Vec<Button>>) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }

    /// All actions offered by the keyboard, row by row.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.keyboard.iter().flatten().map(|b| &b.action)
    }
}

struct Outcome {
    replies: Vec<Reply>,
    commit: bool,
    record: bool,
}

impl Outcome {
    /// Leave the stored session untouched.
    fn keep(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            commit: false,
            record: false,
        }
    }

    /// Persist the session and remember the exchange in the history.
    fn commit(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            commit: true,
            record: true,
        }
    }

    /// Persist the session without adding history entries.
    fn commit_quiet(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            commit: true,
            record: false,
        }
    }
}

#[derive(Clone)]
pub struct Controller {
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn GenerationGateway>,
    locks: Arc<UserLocks>,
}

impl Controller {
    pub fn new(store: Arc<dyn SessionStore>, gateway: Arc<dyn GenerationGateway>) -> Self {
        Self {
            store,
            gateway,
            locks: Arc::new(UserLocks::new()),
        }
    }

    pub async fn session(&self, user_id: UserId) -> Result<Session> {
        self.store.get(user_id).await
    }

    /// Handle a text message (typed or transcribed).
    pub async fn handle_text(&self, user_id: UserId, lang: Lang, text: &str) -> Result<Vec<Reply>> {
        let _guard = self.locks.acquire(user_id).await;
        let mut session = self.store.get(user_id).await?;
        session.lang = lang;

        let intent = classify(text, &session, self.gateway.as_ref()).await;
        debug!(user_id, phase = ?session.phase(), ?intent, "text turn");
        let outcome = self.on_intent(&mut session, intent).await;
        self.finish(session, Some(text), outcome).await
    }

    /// Handle a keyboard button press.
    pub async fn handle_action(
        &self,
        user_id: UserId,
        lang: Lang,
        action: Action,
    ) -> Result<Vec<Reply>> {
        let _guard = self.locks.acquire(user_id).await;
        let mut session = self.store.get(user_id).await?;
        session.lang = lang;

        debug!(user_id, phase = ?session.phase(), ?action, "action turn");
        let outcome = self.on_action(&mut session, action).await;
        self.finish(session, None, outcome).await
    }

    async fn finish(
        &self,
        mut session: Session,
        user_text: Option<&str>,
        outcome: Outcome,
    ) -> Result<Vec<Reply>> {
        if outcome.commit {
            if outcome.record {
                let cap = self.store.history_cap();
                if let Some(text) = user_text {
                    session.push_history(Role::User, text, cap);
                }
                if let Some(reply) = outcome.replies.last() {
                    session.push_history(Role::Bot, &reply.text, cap);
                }
            }
            self.store.save(&session).await?;
        }
        Ok(outcome.replies)
    }

    async fn on_intent(&self, session: &mut Session, intent: Intent) -> Outcome {
        match intent {
            Intent::Command(action) => self.on_action(session, action).await,
            Intent::NewIngredients(text) => self.on_new_ingredients(session, &text).await,
            Intent::AddIngredients(text) => self.on_add_ingredients(session, &text).await,
            Intent::SelectDish(name) => self.deliver_recipe(session, &name).await,
            Intent::DirectRecipeRequest(dish) => self.deliver_recipe(session, &dish).await,
            Intent::SmallTalk(SmallTalk::Gratitude) => {
                info!(user_id = session.user_id, "conversation closed");
                session.reset();
                Outcome::commit_quiet(Reply::text(messages::thanks_reply(session.lang)))
            }
            Intent::SmallTalk(SmallTalk::Greeting) => {
                Outcome::keep(Reply::text(messages::welcome(session.lang)))
            }
            Intent::Unclear => Outcome::keep(Reply::with_keyboard(
                messages::unclear(session.lang),
                follow_up_keyboard(session),
            )),
        }
    }

    async fn on_action(&self, session: &mut Session, action: Action) -> Outcome {
        match action {
            Action::Reset => {
                session.reset();
                Outcome::commit_quiet(Reply::text(messages::welcome(session.lang)))
            }
            Action::Style(style) => self.derive_categories(session, style).await,
            Action::Cook => {
                let style = session.style.unwrap_or(Style::Classic);
                self.derive_categories(session, style).await
            }
            Action::AddMore => {
                if !session.has_products() {
                    return Outcome::keep(Reply::text(messages::welcome(session.lang)));
                }
                session.set_status(Status::AwaitingAddition);
                Outcome::commit(Reply::text(messages::send_more_products(session.lang)))
            }
            Action::Category(tag) => self.show_dishes(session, &tag).await,
            Action::Dish(dish) => self.select_dish(session, dish).await,
            Action::Repeat => match session.current_dish.clone() {
                Some(dish) => self.deliver_recipe(session, &dish).await,
                None => Outcome::keep(Reply::text(messages::nothing_to_repeat(session.lang))),
            },
            Action::Back => self.back(session).await,
        }
    }

    async fn on_new_ingredients(&self, session: &mut Session, text: &str) -> Outcome {
        let lang = session.lang;
        if !self.gateway.validate_ingredients(text).await {
            info!(user_id = session.user_id, "ingredients rejected");
            return Outcome::keep(Reply::text(messages::not_products(lang, &escape(text))));
        }
        session.reset();
        session.set_products(text);
        session.set_status(Status::AwaitingStyle);
        info!(user_id = session.user_id, "ingredients accepted");
        Outcome::commit(Reply::with_keyboard(
            messages::products_accepted(lang),
            style_keyboard(lang),
        ))
    }

    async fn on_add_ingredients(&self, session: &mut Session, text: &str) -> Outcome {
        if !session.has_products() {
            return self.on_new_ingredients(session, text).await;
        }
        let lang = session.lang;
        if !self.gateway.validate_ingredients(text).await {
            return Outcome::keep(Reply::text(messages::not_products(lang, &escape(text))));
        }
        session.append_products(text);
        session.set_status(Status::AwaitingStyle);
        debug!(user_id = session.user_id, products = %session.products, "ingredients appended");
        Outcome::commit(Reply::with_keyboard(
            messages::added_products(lang, &escape(text.trim())),
            style_keyboard(lang),
        ))
    }

    async fn derive_categories(&self, session: &mut Session, style: Style) -> Outcome {
        let lang = session.lang;
        if !session.has_products() {
            return Outcome::keep(Reply::text(messages::welcome(lang)));
        }
        let categories = self.gateway.analyze_categories(&session.products).await;
        if categories.is_empty() {
            info!(user_id = session.user_id, "no categories for products");
            return Outcome::keep(Reply::with_keyboard(
                messages::nothing_to_cook(lang),
                vec![
                    vec![Button::new(messages::retry_label(lang), Action::Style(style))],
                    vec![
                        Button::new(messages::add_more_label(lang), Action::AddMore),
                        Button::new(messages::reset_label(lang), Action::Reset),
                    ],
                ],
            ));
        }
        session.style = Some(style);
        session.set_categories(categories);
        session.set_status(Status::None);
        Outcome::commit(categories_reply(session))
    }

    async fn show_dishes(&self, session: &mut Session, tag: &str) -> Outcome {
        let lang = session.lang;
        if !session.has_category(tag) {
            return Outcome::keep(self.expired(session));
        }
        let style = session.style.unwrap_or(Style::Classic);
        let dishes = self
            .gateway
            .generate_dishes_list(&session.products, tag, style, lang)
            .await;
        if dishes.is_empty() {
            return Outcome::keep(Reply::with_keyboard(
                messages::generation_failed(lang),
                vec![
                    vec![Button::new(
                        messages::retry_label(lang),
                        Action::Category(tag.to_string()),
                    )],
                    vec![Button::new(
                        messages::back_to_categories_label(lang),
                        Action::Back,
                    )],
                ],
            ));
        }
        session.set_dishes(dishes);
        session.set_status(Status::None);

        let mut text = messages::menu_title(lang, &escape(&category_label(tag, lang)));
        let mut keyboard = Vec::new();
        for (index, dish) in session.generated_dishes.iter().enumerate() {
            text.push_str(&format!(
                "{}. <b>{}</b>\n<i>{}</i>\n\n",
                index + 1,
                escape(&dish.display_name),
                escape(&dish.description)
            ));
            keyboard.push(vec![Button::new(
                crate::text_utils::truncate_label(&dish.display_name, BUTTON_LABEL_MAX),
                Action::Dish(session.dish_ref(index)),
            )]);
        }
        keyboard.push(vec![Button::new(
            messages::back_to_categories_label(lang),
            Action::Back,
        )]);
        Outcome::commit(Reply::with_keyboard(text.trim_end().to_string(), keyboard))
    }

    async fn select_dish(&self, session: &mut Session, dish: DishRef) -> Outcome {
        let Some(name) = session.get_dish(dish).map(|d| d.name.clone()) else {
            debug!(user_id = session.user_id, ?dish, current = session.dish_generation, "stale dish reference");
            return Outcome::keep(self.expired(session));
        };
        self.deliver_recipe(session, &name).await
    }

    async fn deliver_recipe(&self, session: &mut Session, dish: &str) -> Outcome {
        let lang = session.lang;
        let products = session.has_products().then_some(session.products.as_str());
        let Some(recipe) = self.gateway.generate_recipe(dish, products, lang).await else {
            info!(user_id = session.user_id, dish, "recipe generation failed");
            let mut keyboard = vec![vec![Button::new(messages::retry_label(lang), Action::Repeat)]];
            if session.current_dish.as_deref() != Some(dish) {
                // Retry needs the dish name between turns.
                keyboard.clear();
            }
            keyboard.push(vec![Button::new(messages::reset_label(lang), Action::Reset)]);
            return Outcome::keep(Reply::with_keyboard(messages::generation_failed(lang), keyboard));
        };
        session.set_current_dish(dish);
        session.set_status(Status::RecipeSent);
        info!(user_id = session.user_id, dish, "recipe delivered");

        let text = format!("{}\n\n{}", escape(recipe.trim()), messages::bon_appetit(lang));
        let mut keyboard = vec![vec![Button::new(
            messages::another_variant_label(lang),
            Action::Repeat,
        )]];
        if !session.available_categories.is_empty() {
            keyboard.push(vec![Button::new(
                messages::back_to_categories_label(lang),
                Action::Back,
            )]);
        }
        keyboard.push(vec![Button::new(messages::reset_label(lang), Action::Reset)]);
        Outcome::commit(Reply::with_keyboard(text, keyboard))
    }

    async fn back(&self, session: &mut Session) -> Outcome {
        if !session.available_categories.is_empty() {
            session.set_status(Status::None);
            return Outcome::commit(categories_reply(session));
        }
        if session.has_products() {
            let style = session.style.unwrap_or(Style::Classic);
            return self.derive_categories(session, style).await;
        }
        Outcome::keep(Reply::text(messages::welcome(session.lang)))
    }

    fn expired(&self, session: &Session) -> Reply {
        let lang = session.lang;
        let keyboard = if !session.available_categories.is_empty() || session.has_products() {
            vec![vec![Button::new(
                messages::back_to_categories_label(lang),
                Action::Back,
            )]]
        } else {
            Vec::new()
        };
        Reply::with_keyboard(messages::menu_expired(lang), keyboard)
    }
}

fn style_keyboard(lang: Lang) -> Vec<Vec<Button>> {
    vec![
        vec![Button::new(
            messages::style_classic_label(lang),
            Action::Style(Style::Classic),
        )],
        vec![Button::new(
            messages::style_exotic_label(lang),
            Action::Style(Style::Exotic),
        )],
        vec![
            Button::new(messages::add_more_label(lang), Action::AddMore),
            Button::new(messages::reset_label(lang), Action::Reset),
        ],
    ]
}

fn categories_reply(session: &Session) -> Reply {
    let lang = session.lang;
    let mut keyboard: Vec<Vec<Button>> = session
        .available_categories
        .iter()
        .map(|tag| {
            vec![Button::new(
                category_label(tag, lang),
                Action::Category(tag.clone()),
            )]
        })
        .collect();
    keyboard.push(vec![
        Button::new(messages::add_more_label(lang), Action::AddMore),
        Button::new(messages::reset_label(lang), Action::Reset),
    ]);
    Reply::with_keyboard(messages::what_to_cook(lang), keyboard)
}

/// Keyboard offered with a clarifying question, based on what the user has.
fn follow_up_keyboard(session: &Session) -> Vec<Vec<Button>> {
    let lang = session.lang;
    match session.phase() {
        crate::session::Phase::Idle => Vec::new(),
        crate::session::Phase::AwaitingStyle | crate::session::Phase::AwaitingProducts => {
            style_keyboard(lang)
        }
        _ => categories_reply(session).keyboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryStore;
    use crate::tests::util::FakeGateway;

    fn controller(gateway: FakeGateway) -> (Controller, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(4));
        (Controller::new(store.clone(), Arc::new(gateway)), store)
    }

    #[tokio::test]
    async fn empty_categories_keep_products() -> Result<()> {
        let (controller, _) = controller(FakeGateway {
            categories: Vec::new(),
            ..FakeGateway::cooking()
        });
        controller.handle_text(1, Lang::Ru, "курица, рис").await?;
        let replies = controller
            .handle_action(1, Lang::Ru, Action::Style(Style::Classic))
            .await?;

        assert_eq!(replies[0].text, messages::nothing_to_cook(Lang::Ru));
        let session = controller.session(1).await?;
        assert_eq!(session.products, "курица, рис");
        assert_eq!(session.status, Status::AwaitingStyle);
        Ok(())
    }

    #[tokio::test]
    async fn recipe_failure_keeps_current_dish() -> Result<()> {
        let gateway = FakeGateway::cooking();
        let recipes = gateway.recipes.clone();
        let (controller, _) = controller(gateway);
        controller.handle_text(1, Lang::Ru, "курица, рис").await?;
        controller.handle_text(1, Lang::Ru, "дай рецепт плова").await?;
        assert_eq!(
            controller.session(1).await?.current_dish.as_deref(),
            Some("плова")
        );

        recipes.lock().await.clear();
        let replies = controller.handle_action(1, Lang::Ru, Action::Repeat).await?;
        assert_eq!(replies[0].text, messages::generation_failed(Lang::Ru));
        assert!(replies[0].actions().any(|a| *a == Action::Repeat));

        let session = controller.session(1).await?;
        assert_eq!(session.current_dish.as_deref(), Some("плова"));
        assert_eq!(session.status, Status::RecipeSent);
        Ok(())
    }

    #[tokio::test]
    async fn stale_category_button_is_expired() -> Result<()> {
        let (controller, _) = controller(FakeGateway::cooking());
        controller.handle_text(1, Lang::En, "chicken, rice").await?;
        let replies = controller
            .handle_action(1, Lang::En, Action::Category("dessert".into()))
            .await?;
        assert_eq!(replies[0].text, messages::menu_expired(Lang::En));
        Ok(())
    }

    #[tokio::test]
    async fn reset_is_honored_mid_flow() -> Result<()> {
        let (controller, store) = controller(FakeGateway::cooking());
        controller.handle_text(1, Lang::Ru, "курица, рис").await?;
        controller
            .handle_action(1, Lang::Ru, Action::Style(Style::Exotic))
            .await?;
        let replies = controller.handle_text(1, Lang::Ru, "сброс").await?;

        assert_eq!(replies[0].text, messages::welcome(Lang::Ru));
        assert!(store.get(1).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn add_more_then_free_text_appends() -> Result<()> {
        let (controller, _) = controller(FakeGateway::cooking());
        controller.handle_text(1, Lang::Ru, "курица, рис").await?;
        controller.handle_action(1, Lang::Ru, Action::AddMore).await?;
        controller.handle_text(1, Lang::Ru, "сыр").await?;

        let session = controller.session(1).await?;
        assert_eq!(session.products, "курица, рис, сыр");
        assert_eq!(session.status, Status::AwaitingStyle);
        Ok(())
    }

    #[tokio::test]
    async fn history_records_committed_turns_only() -> Result<()> {
        let (controller, _) = controller(FakeGateway::cooking());
        controller.handle_text(1, Lang::Ru, "курица, рис").await?;
        controller.handle_text(1, Lang::Ru, "бензин, стекло").await?;

        let session = controller.session(1).await?;
        assert_eq!(session.dialog_history.len(), 2);
        assert_eq!(session.dialog_history[0].role, Role::User);
        assert_eq!(
            session.last_bot_message(),
            Some(messages::products_accepted(Lang::Ru))
        );
        Ok(())
    }
}
