use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Sqlite};

use super::{Session, SessionStore, Status, Style, UserId};
use crate::locale::Lang;

#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: i64,
    products: String,
    dialog_history: String,
    status: String,
    generated_dishes: String,
    dish_generation: i64,
    available_categories: String,
    current_dish: Option<String>,
    style: Option<String>,
    lang: String,
}

impl SessionRow {
    fn into_session(self) -> Result<Session> {
        Ok(Session {
            user_id: self.user_id,
            products: self.products,
            dialog_history: serde_json::from_str(&self.dialog_history)?,
            available_categories: serde_json::from_str(&self.available_categories)?,
            generated_dishes: serde_json::from_str(&self.generated_dishes)?,
            dish_generation: self.dish_generation.max(0) as u64,
            current_dish: self.current_dish,
            status: Status::parse(&self.status),
            style: self.style.as_deref().and_then(Style::parse),
            lang: Lang::from_code(&self.lang),
        })
    }
}

/// Durable session store backed by the `sessions` table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    history_cap: usize,
}

impl SqliteStore {
    pub fn new(pool: Pool<Sqlite>, history_cap: usize) -> Self {
        Self {
            pool,
            history_cap: history_cap.max(1),
        }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn load(&self, user_id: UserId) -> Result<Option<Session>> {
        tracing::trace!(user_id, "Fetching session");
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT user_id, products, dialog_history, status, generated_dishes, dish_generation, \
             available_categories, current_dish, style, lang FROM sessions WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(SessionRow::into_session).transpose()
    }

    async fn save(&self, session: &Session) -> Result<()> {
        tracing::debug!(
            user_id = session.user_id,
            status = session.status.as_str(),
            dishes = session.generated_dishes.len(),
            "Saving session",
        );
        sqlx::query(
            "INSERT INTO sessions (user_id, products, dialog_history, status, generated_dishes, \
             dish_generation, available_categories, current_dish, style, lang, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, strftime('%s', 'now')) \
             ON CONFLICT(user_id) DO UPDATE SET products = excluded.products, \
             dialog_history = excluded.dialog_history, status = excluded.status, \
             generated_dishes = excluded.generated_dishes, dish_generation = excluded.dish_generation, \
             available_categories = excluded.available_categories, current_dish = excluded.current_dish, \
             style = excluded.style, lang = excluded.lang, updated_at = excluded.updated_at",
        )
        .bind(session.user_id)
        .bind(&session.products)
        .bind(serde_json::to_string(&session.dialog_history)?)
        .bind(session.status.as_str())
        .bind(serde_json::to_string(&session.generated_dishes)?)
        .bind(session.dish_generation as i64)
        .bind(serde_json::to_string(&session.available_categories)?)
        .bind(session.current_dish.as_deref())
        .bind(session.style.map(Style::as_str))
        .bind(session.lang.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn history_cap(&self) -> usize {
        self.history_cap
    }
}
