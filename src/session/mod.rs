//! Per-user conversation state and the store contract used by the controller.
//!
//! A [`Session`] carries everything one user accumulated during a conversation.
//! Stores only persist whole sessions; the fine-grained operations are provided
//! on top of `load`/`save` so every backend behaves identically.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locale::Lang;
use crate::text_utils::normalize_for_match;

pub mod lock;
pub mod memory;
pub mod sqlite;

pub use lock::UserLocks;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Stable identifier of a user, as handed over by the messaging front end.
pub type UserId = i64;

pub const DEFAULT_HISTORY_CAP: usize = 8;

/// Separator used when more ingredients are appended to an existing list.
pub const PRODUCTS_DELIMITER: &str = ", ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogEntry {
    pub role: Role,
    pub text: String,
}

/// Which follow-up utterances are meaningful right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    None,
    AwaitingStyle,
    AwaitingAddition,
    RecipeSent,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::None => "none",
            Status::AwaitingStyle => "awaiting_style",
            Status::AwaitingAddition => "awaiting_addition",
            Status::RecipeSent => "recipe_sent",
        }
    }

    /// Unknown values map to [`Status::None`] so an old row never breaks a turn.
    pub fn parse(value: &str) -> Self {
        match value {
            "awaiting_style" => Status::AwaitingStyle,
            "awaiting_addition" => Status::AwaitingAddition,
            "recipe_sent" => Status::RecipeSent,
            _ => Status::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Classic,
    Exotic,
}

impl Style {
    pub fn as_str(self) -> &'static str {
        match self {
            Style::Classic => "classic",
            Style::Exotic => "exotic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "classic" => Some(Style::Classic),
            "exotic" => Some(Style::Exotic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "desc", default)]
    pub description: String,
}

/// Address of a dish inside one specific generated menu.
///
/// `generation` is bumped every time a new menu is stored, so a button from a
/// previous menu can be told apart from a valid one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DishRef {
    pub generation: u64,
    pub index: usize,
}

/// Conversation phase derived from the session contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingProducts,
    AwaitingStyle,
    AwaitingCategory,
    AwaitingDishSelection,
    RecipeDelivered,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub user_id: UserId,
    pub products: String,
    pub dialog_history: Vec<DialogEntry>,
    pub available_categories: Vec<String>,
    pub generated_dishes: Vec<Dish>,
    pub dish_generation: u64,
    pub current_dish: Option<String>,
    pub status: Status,
    pub style: Option<Style>,
    pub lang: Lang,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    pub fn has_products(&self) -> bool {
        !self.products.is_empty()
    }

    /// True when nothing user-visible is left in the session.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.dialog_history.is_empty()
            && self.available_categories.is_empty()
            && self.generated_dishes.is_empty()
            && self.current_dish.is_none()
            && self.status == Status::None
            && self.style.is_none()
    }

    pub fn phase(&self) -> Phase {
        match self.status {
            Status::RecipeSent => Phase::RecipeDelivered,
            _ if !self.has_products() => Phase::Idle,
            Status::AwaitingStyle => Phase::AwaitingStyle,
            Status::AwaitingAddition => Phase::AwaitingProducts,
            Status::None if !self.generated_dishes.is_empty() => Phase::AwaitingDishSelection,
            Status::None if !self.available_categories.is_empty() => Phase::AwaitingCategory,
            Status::None => Phase::AwaitingProducts,
        }
    }

    pub fn set_products(&mut self, products: &str) {
        self.products = products.trim().to_string();
        self.invalidate_menus();
    }

    /// Appends verbatim; repeated ingredients are kept.
    pub fn append_products(&mut self, products: &str) {
        let products = products.trim();
        if products.is_empty() {
            return;
        }
        if self.products.is_empty() {
            self.products = products.to_string();
        } else {
            self.products.push_str(PRODUCTS_DELIMITER);
            self.products.push_str(products);
        }
        self.invalidate_menus();
    }

    fn invalidate_menus(&mut self) {
        self.available_categories.clear();
        self.generated_dishes.clear();
    }

    /// Pushes an entry and keeps only the `cap` most recent ones.
    pub fn push_history(&mut self, role: Role, text: &str, cap: usize) {
        self.dialog_history.push(DialogEntry {
            role,
            text: text.to_string(),
        });
        let cap = cap.max(1);
        if self.dialog_history.len() > cap {
            let excess = self.dialog_history.len() - cap;
            self.dialog_history.drain(..excess);
        }
    }

    pub fn last_bot_message(&self) -> Option<&str> {
        self.dialog_history
            .iter()
            .rev()
            .find(|entry| entry.role == Role::Bot)
            .map(|entry| entry.text.as_str())
    }

    pub fn set_categories(&mut self, categories: Vec<String>) {
        self.available_categories = categories;
    }

    pub fn has_category(&self, tag: &str) -> bool {
        self.available_categories.iter().any(|c| c == tag)
    }

    /// Stores a new menu and returns its generation.
    pub fn set_dishes(&mut self, dishes: Vec<Dish>) -> u64 {
        self.dish_generation += 1;
        self.generated_dishes = dishes;
        self.dish_generation
    }

    pub fn dish_ref(&self, index: usize) -> DishRef {
        DishRef {
            generation: self.dish_generation,
            index,
        }
    }

    /// Returns `None` for a reference into an older menu or past the end.
    pub fn get_dish(&self, dish: DishRef) -> Option<&Dish> {
        if dish.generation != self.dish_generation {
            return None;
        }
        self.generated_dishes.get(dish.index)
    }

    pub fn find_dish(&self, name: &str) -> Option<&Dish> {
        let needle = normalize_for_match(name);
        if needle.is_empty() {
            return None;
        }
        self.generated_dishes.iter().find(|dish| {
            normalize_for_match(&dish.name) == needle
                || normalize_for_match(&dish.display_name) == needle
        })
    }

    pub fn set_current_dish(&mut self, dish: &str) {
        self.current_dish = Some(dish.to_string());
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Clears everything the user built up. The menu generation and the
    /// language survive so buttons from before the reset stay stale.
    pub fn reset(&mut self) {
        *self = Self {
            user_id: self.user_id,
            dish_generation: self.dish_generation,
            lang: self.lang,
            ..Self::default()
        };
    }
}

/// Repository of sessions keyed by user.
///
/// Backends implement `load`, `save` and `history_cap`; the conversation
/// operations are provided in terms of those.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, user_id: UserId) -> Result<Option<Session>>;

    async fn save(&self, session: &Session) -> Result<()>;

    fn history_cap(&self) -> usize;

    /// Returns the stored session or a fresh one; nothing is written.
    async fn get(&self, user_id: UserId) -> Result<Session> {
        Ok(self
            .load(user_id)
            .await?
            .unwrap_or_else(|| Session::new(user_id)))
    }

    async fn clear(&self, user_id: UserId) -> Result<()> {
        tracing::debug!(user_id, "Clearing session");
        if let Some(mut session) = self.load(user_id).await? {
            session.reset();
            self.save(&session).await?;
        }
        Ok(())
    }

    async fn set_products(&self, user_id: UserId, products: &str) -> Result<()> {
        let mut session = self.get(user_id).await?;
        session.set_products(products);
        self.save(&session).await
    }

    async fn append_products(&self, user_id: UserId, products: &str) -> Result<()> {
        let mut session = self.get(user_id).await?;
        session.append_products(products);
        self.save(&session).await
    }

    async fn add_history(&self, user_id: UserId, role: Role, text: &str) -> Result<()> {
        let mut session = self.get(user_id).await?;
        session.push_history(role, text, self.history_cap());
        self.save(&session).await
    }

    async fn set_categories(&self, user_id: UserId, categories: Vec<String>) -> Result<()> {
        let mut session = self.get(user_id).await?;
        session.set_categories(categories);
        self.save(&session).await
    }

    async fn set_dishes(&self, user_id: UserId, dishes: Vec<Dish>) -> Result<u64> {
        let mut session = self.get(user_id).await?;
        let generation = session.set_dishes(dishes);
        self.save(&session).await?;
        Ok(generation)
    }

    async fn get_dish(&self, user_id: UserId, dish: DishRef) -> Result<Option<String>> {
        let session = self.get(user_id).await?;
        Ok(session.get_dish(dish).map(|d| d.name.clone()))
    }

    async fn set_current_dish(&self, user_id: UserId, dish: &str) -> Result<()> {
        let mut session = self.get(user_id).await?;
        session.set_current_dish(dish);
        self.save(&session).await
    }

    async fn set_status(&self, user_id: UserId, status: Status) -> Result<()> {
        let mut session = self.get(user_id).await?;
        session.set_status(status);
        self.save(&session).await
    }
}
