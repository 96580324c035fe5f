use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::ai::gateway::{GenerationGateway, IntentPayload};
use crate::db::{connect_db, migrate};
use crate::locale::Lang;
use crate::session::{Dish, SqliteStore, Style};

pub async fn init_test_store(history_cap: usize) -> SqliteStore {
    let pool = connect_db("sqlite::memory:", 1)
        .await
        .expect("failed to create in-memory database");
    migrate(&pool).await.expect("failed to apply migrations");
    SqliteStore::new(pool, history_cap)
}

pub fn dish(name: &str, display_name: &str) -> Dish {
    Dish {
        name: name.to_string(),
        display_name: display_name.to_string(),
        description: format!("{display_name} на скорую руку"),
    }
}

/// Scripted gateway. Validation passes unless the text contains one of
/// `rejected`; the recipe is the first entry of `recipes`, if any.
#[derive(Clone, Default)]
pub struct FakeGateway {
    pub valid: bool,
    pub rejected: Vec<&'static str>,
    pub categories: Vec<String>,
    pub dishes: Vec<Dish>,
    pub recipes: Arc<Mutex<Vec<String>>>,
    pub intent: IntentPayload,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl FakeGateway {
    pub fn cooking() -> Self {
        Self {
            valid: true,
            rejected: vec!["бензин", "стекло", "petrol"],
            categories: vec!["main".into(), "soup".into()],
            dishes: vec![dish("plov", "Плов"), dish("chicken_soup", "Куриный суп")],
            recipes: Arc::new(Mutex::new(vec![
                "Плов\n\nИнгредиенты: курица, рис.\n\nКБЖУ на порцию: 450 ккал".into(),
            ])),
            intent: IntentPayload::unclear(),
            calls: Arc::default(),
        }
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: String) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl GenerationGateway for FakeGateway {
    async fn validate_ingredients(&self, text: &str) -> bool {
        self.record(format!("validate:{text}")).await;
        let lower = text.to_lowercase();
        self.valid && !self.rejected.iter().any(|w| lower.contains(w))
    }

    async fn analyze_categories(&self, products: &str) -> Vec<String> {
        self.record(format!("categories:{products}")).await;
        self.categories.clone()
    }

    async fn generate_dishes_list(
        &self,
        products: &str,
        category: &str,
        style: Style,
        _lang: Lang,
    ) -> Vec<Dish> {
        self.record(format!("dishes:{category}:{}:{products}", style.as_str()))
            .await;
        self.dishes.clone()
    }

    async fn generate_recipe(
        &self,
        dish: &str,
        products: Option<&str>,
        _lang: Lang,
    ) -> Option<String> {
        self.record(format!("recipe:{dish}:{}", products.unwrap_or("-")))
            .await;
        self.recipes.lock().await.first().cloned()
    }

    async fn determine_intent(&self, text: &str, _last_bot_message: Option<&str>) -> IntentPayload {
        self.record(format!("intent:{text}")).await;
        self.intent.clone()
    }
}
