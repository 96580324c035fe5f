//! Boundary to the text-generation service.
//!
//! Every call goes through [`LlmGateway::ask`]: one attempt at the requested
//! temperature, one retry at [`MIN_TEMPERATURE`], then a sentinel. Nothing in
//! here returns an error to the controller.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::ai::common::{extract_json, is_refusal, ChatClient};
use crate::ai::config::AiConfig;
use crate::ai::prompts;
use crate::locale::{Lang, KNOWN_CATEGORIES};
use crate::session::{Dish, Style};
use crate::text_utils::count_items;

pub const MIN_TEMPERATURE: f64 = 0.0;

/// Returned when the category answer cannot be parsed.
pub const FALLBACK_CATEGORY: &str = "main";

/// `mix` needs at least this many listed products.
pub const MIX_MIN_ITEMS: usize = 5;

pub const MAX_DISHES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Ingredients,
    Add,
    Select,
    Recipe,
    SmallTalk,
    #[default]
    #[serde(other)]
    Unclear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmallTalkKind {
    Gratitude,
    #[default]
    #[serde(other)]
    Greeting,
}

/// Structured answer of the intent classifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct IntentPayload {
    #[serde(default)]
    pub intent: IntentKind,
    #[serde(default)]
    pub dish: Option<String>,
    #[serde(default)]
    pub products: Option<String>,
    #[serde(default)]
    pub kind: Option<SmallTalkKind>,
}

impl IntentPayload {
    pub fn unclear() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn validate_ingredients(&self, text: &str) -> bool;

    /// Empty means nothing can be cooked or the service is unavailable.
    async fn analyze_categories(&self, products: &str) -> Vec<String>;

    async fn generate_dishes_list(
        &self,
        products: &str,
        category: &str,
        style: Style,
        lang: Lang,
    ) -> Vec<Dish>;

    /// `products` of `None` asks for a freestyle recipe.
    async fn generate_recipe(&self, dish: &str, products: Option<&str>, lang: Lang)
        -> Option<String>;

    async fn determine_intent(&self, text: &str, last_bot_message: Option<&str>) -> IntentPayload;
}

/// Why a gateway request produced nothing usable.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Unavailable,
    Refused,
    /// The last non-empty answer that failed to parse.
    Malformed(String),
}

#[derive(Deserialize)]
struct ValidationJson {
    #[serde(default)]
    valid: bool,
}

#[derive(Deserialize)]
struct DishJson {
    #[serde(default)]
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default, alias = "description")]
    desc: String,
}

pub fn parse_validation(text: &str) -> Option<bool> {
    serde_json::from_str::<ValidationJson>(&extract_json(text))
        .ok()
        .map(|v| v.valid)
}

/// Parses a JSON array of category tags and keeps the known ones, in order.
///
/// `Some(vec![])` means the model explicitly returned an empty list.
pub fn parse_categories(text: &str, allow_mix: bool) -> Option<Vec<String>> {
    let raw: Vec<String> = serde_json::from_str(&extract_json(text)).ok()?;
    if raw.is_empty() {
        return Some(Vec::new());
    }
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.trim().to_lowercase();
        let known = KNOWN_CATEGORIES.contains(&tag.as_str());
        if known && (allow_mix || tag != "mix") && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    if tags.is_empty() {
        tags.push(FALLBACK_CATEGORY.to_string());
    }
    Some(tags)
}

pub fn parse_dishes(text: &str) -> Option<Vec<Dish>> {
    let raw: Vec<DishJson> = serde_json::from_str(&extract_json(text)).ok()?;
    let dishes: Vec<Dish> = raw
        .into_iter()
        .filter(|d| !d.name.trim().is_empty())
        .take(MAX_DISHES)
        .map(|d| {
            let name = d.name.trim().to_string();
            let display_name = d
                .display_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| name.clone());
            Dish {
                name,
                display_name,
                description: d.desc.trim().to_string(),
            }
        })
        .collect();
    (!dishes.is_empty()).then_some(dishes)
}

pub fn parse_intent(text: &str) -> Option<IntentPayload> {
    serde_json::from_str(&extract_json(text)).ok()
}

/// True when protein, fat, carbohydrate and energy figures are all present.
pub fn has_nutrition_block(recipe: &str) -> bool {
    let lowered = recipe.to_lowercase();
    let groups: [&[&str]; 4] = [
        &["белк", "protein"],
        &["жир", "fat"],
        &["углевод", "carb"],
        &["ккал", "kcal", "энерг", "energy", "калор", "calor"],
    ];
    groups
        .iter()
        .all(|markers| markers.iter().any(|m| lowered.contains(m)))
}

/// Target menu size for a product list.
pub fn dish_target(products: &str) -> usize {
    if count_items(products) < 7 {
        5
    } else {
        6
    }
}

/// Gateway backed by an OpenAI-compatible chat endpoint.
#[derive(Clone)]
pub struct LlmGateway {
    chat: ChatClient,
}

impl LlmGateway {
    pub fn new(config: &AiConfig) -> Result<Self> {
        Ok(Self {
            chat: ChatClient::new(config)?,
        })
    }

    pub fn with_client(chat: ChatClient) -> Self {
        Self { chat }
    }

    /// One attempt at `temperature`, one retry at [`MIN_TEMPERATURE`].
    async fn ask<T, F>(
        &self,
        op: &'static str,
        system: &str,
        user: &str,
        temperature: f64,
        max_tokens: u32,
        accept: F,
    ) -> Result<T, Failure>
    where
        T: Send,
        F: Fn(&str) -> Option<T> + Send + Sync,
    {
        let mut failure = Failure::Unavailable;
        for (attempt, temperature) in [temperature, MIN_TEMPERATURE].into_iter().enumerate() {
            match self.chat.complete(system, user, temperature, max_tokens).await {
                Ok(text) if text.is_empty() => {
                    warn!(op, attempt, "empty generation response");
                }
                Ok(text) if is_refusal(&text) => {
                    warn!(op, attempt, "generation refused");
                    failure = Failure::Refused;
                }
                Ok(text) => match accept(&text) {
                    Some(value) => {
                        debug!(op, attempt, "generation accepted");
                        return Ok(value);
                    }
                    None => {
                        warn!(op, attempt, "malformed generation response");
                        failure = Failure::Malformed(text);
                    }
                },
                Err(err) => {
                    warn!(op, attempt, error = %err, "generation request failed");
                }
            }
        }
        Err(failure)
    }
}

#[async_trait]
impl GenerationGateway for LlmGateway {
    #[instrument(level = "trace", skip(self))]
    async fn validate_ingredients(&self, text: &str) -> bool {
        let result = self
            .ask(
                "validate_ingredients",
                prompts::validate_ingredients(),
                &prompts::validate_input(text),
                prompts::VALIDATE_TEMPERATURE,
                prompts::SHORT_MAX_TOKENS,
                parse_validation,
            )
            .await;
        match result {
            Ok(valid) => valid,
            Err(Failure::Malformed(raw)) => raw.to_lowercase().contains("true"),
            Err(_) => false,
        }
    }

    #[instrument(level = "trace", skip(self))]
    async fn analyze_categories(&self, products: &str) -> Vec<String> {
        let allow_mix = count_items(products) >= MIX_MIN_ITEMS;
        let result = self
            .ask(
                "analyze_categories",
                &prompts::analyze_categories(products, allow_mix),
                "Sort the pantry",
                prompts::CATEGORIES_TEMPERATURE,
                prompts::SHORT_MAX_TOKENS,
                |text| parse_categories(text, allow_mix),
            )
            .await;
        match result {
            Ok(tags) => tags,
            Err(Failure::Malformed(_)) => vec![FALLBACK_CATEGORY.to_string()],
            Err(_) => Vec::new(),
        }
    }

    #[instrument(level = "trace", skip(self))]
    async fn generate_dishes_list(
        &self,
        products: &str,
        category: &str,
        style: Style,
        lang: Lang,
    ) -> Vec<Dish> {
        let count = dish_target(products);
        self.ask(
            "generate_dishes_list",
            &prompts::generate_dishes(products, category, style, count, lang),
            "Draft the menu",
            prompts::DISHES_TEMPERATURE,
            prompts::DISHES_MAX_TOKENS,
            parse_dishes,
        )
        .await
        .unwrap_or_default()
    }

    #[instrument(level = "trace", skip(self))]
    async fn generate_recipe(
        &self,
        dish: &str,
        products: Option<&str>,
        lang: Lang,
    ) -> Option<String> {
        let (system, temperature) = match products {
            Some(products) => (
                prompts::generate_recipe(dish, products, lang),
                prompts::RECIPE_TEMPERATURE,
            ),
            None => (
                prompts::generate_freestyle_recipe(dish, lang),
                prompts::FREESTYLE_TEMPERATURE,
            ),
        };
        let result = self
            .ask(
                "generate_recipe",
                &system,
                "Start cooking",
                temperature,
                prompts::RECIPE_MAX_TOKENS,
                |text| has_nutrition_block(text).then(|| text.to_string()),
            )
            .await;
        match result {
            Ok(recipe) => Some(recipe),
            Err(Failure::Malformed(recipe)) => {
                warn!(dish, "recipe without nutrition block after retry");
                Some(recipe)
            }
            Err(_) => None,
        }
    }

    #[instrument(level = "trace", skip(self))]
    async fn determine_intent(&self, text: &str, last_bot_message: Option<&str>) -> IntentPayload {
        self.ask(
            "determine_intent",
            &prompts::determine_intent(last_bot_message),
            text,
            prompts::INTENT_TEMPERATURE,
            prompts::SHORT_MAX_TOKENS,
            parse_intent,
        )
        .await
        .unwrap_or_else(|_| IntentPayload::unclear())
    }
}
