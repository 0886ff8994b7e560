use crate::aspect::AspectRatio;
use crate::cache::DeckCache;
use crate::themes::Theme;
use crate::types::{Presentation, Slide, SlideType};
use deadpool_sqlite::Pool;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Persistence for presentations and their slides, with a read-through
/// entity cache in front. Write errors are logged and reported as `false`
/// so route handlers translate them, mirroring the generator's
/// never-propagate policy at this boundary.
pub struct PresentationStore {
    pool: Pool,
    cache: Arc<DeckCache>,
}

impl PresentationStore {
    pub fn new(pool: Pool, cache: Arc<DeckCache>) -> Self {
        Self { pool, cache }
    }

    pub fn cache(&self) -> &DeckCache {
        &self.cache
    }

    /// Upsert a presentation and its full slide set in one transaction.
    /// The slide set is replaced wholesale (delete then reinsert), never
    /// partially merged. The entity cache is updated only after commit so
    /// it can never hold data that did not actually persist. On success
    /// the record's timestamps are rewritten to the persisted values so
    /// callers hand back exactly what the store holds.
    pub async fn save(&self, presentation: &mut Presentation) -> bool {
        presentation.updated_at = chrono::Utc::now().timestamp();

        let to_store = presentation.clone();
        let conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "pool error during save");
                return false;
            }
        };

        let result = conn
            .interact(move |conn| -> rusqlite::Result<i64> {
                let tx = conn.transaction()?;

                // Preserve the original created_at across upserts.
                let existing_created: Option<i64> = tx
                    .query_row(
                        "SELECT created_at FROM presentations WHERE id = ?1",
                        params![to_store.id],
                        |row| row.get(0),
                    )
                    .optional()?;
                let created_at = existing_created.unwrap_or(to_store.created_at);

                let colors_json =
                    serde_json::to_string(&to_store.colors).unwrap_or_else(|_| "{}".to_string());

                tx.execute(
                    "INSERT INTO presentations
                        (id, topic, num_slides, custom_content, theme, font, colors,
                         aspect_ratio, custom_width, custom_height, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     ON CONFLICT(id) DO UPDATE SET
                        topic = excluded.topic,
                        num_slides = excluded.num_slides,
                        custom_content = excluded.custom_content,
                        theme = excluded.theme,
                        font = excluded.font,
                        colors = excluded.colors,
                        aspect_ratio = excluded.aspect_ratio,
                        custom_width = excluded.custom_width,
                        custom_height = excluded.custom_height,
                        updated_at = excluded.updated_at",
                    params![
                        to_store.id,
                        to_store.topic,
                        to_store.num_slides as i64,
                        to_store.custom_content,
                        to_store.theme.as_str(),
                        to_store.font,
                        colors_json,
                        to_store.aspect_ratio.as_str(),
                        to_store.custom_width,
                        to_store.custom_height,
                        created_at,
                        to_store.updated_at,
                    ],
                )?;

                tx.execute(
                    "DELETE FROM slides WHERE presentation_id = ?1",
                    params![to_store.id],
                )?;
                for (i, slide) in to_store.slides.iter().enumerate() {
                    let content_json =
                        serde_json::to_string(&slide.content).unwrap_or_else(|_| "[]".to_string());
                    let citations_json = serde_json::to_string(&slide.citations)
                        .unwrap_or_else(|_| "[]".to_string());
                    tx.execute(
                        "INSERT INTO slides
                            (presentation_id, slide_type, title, content,
                             image_suggestion, citations, slide_order)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            to_store.id,
                            slide.slide_type.as_str(),
                            slide.title,
                            content_json,
                            slide.image_suggestion,
                            citations_json,
                            i as i64,
                        ],
                    )?;
                }

                tx.commit()?;
                Ok(created_at)
            })
            .await;

        match result {
            Ok(Ok(created_at)) => {
                presentation.created_at = created_at;
                self.cache.set_presentation(presentation);
                true
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, id = %presentation.id, "failed to save presentation");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, id = %presentation.id, "interact error during save");
                false
            }
        }
    }

    /// Cache-first fetch; on miss, query the store and populate the cache.
    pub async fn get(&self, id: &str) -> Option<Presentation> {
        if let Some(cached) = self.cache.get_presentation(id) {
            return Some(cached);
        }

        let key = id.to_string();
        let conn = self.pool.get().await.ok()?;
        let result = conn
            .interact(move |conn| load_presentation(conn, &key))
            .await;

        match result {
            Ok(Ok(Some(presentation))) => {
                self.cache.set_presentation(&presentation);
                Some(presentation)
            }
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                tracing::error!(error = %e, id, "failed to load presentation");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, id, "interact error during get");
                None
            }
        }
    }

    /// Delete slides before the parent row. The cache entry goes first so a
    /// concurrent read cannot resurrect the record mid-delete.
    pub async fn delete(&self, id: &str) -> bool {
        self.cache.delete_presentation(id);

        let key = id.to_string();
        let conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "pool error during delete");
                return false;
            }
        };

        let result = conn
            .interact(move |conn| -> rusqlite::Result<usize> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM slides WHERE presentation_id = ?1", params![key])?;
                let deleted =
                    tx.execute("DELETE FROM presentations WHERE id = ?1", params![key])?;
                tx.commit()?;
                Ok(deleted)
            })
            .await;

        match result {
            Ok(Ok(deleted)) => deleted > 0,
            Ok(Err(e)) => {
                tracing::error!(error = %e, id, "failed to delete presentation");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, id, "interact error during delete");
                false
            }
        }
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Vec<Presentation> {
        let conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "pool error during list");
                return Vec::new();
            }
        };

        let result = conn
            .interact(move |conn| -> rusqlite::Result<Vec<Presentation>> {
                let mut stmt = conn.prepare(
                    "SELECT id FROM presentations ORDER BY created_at LIMIT ?1 OFFSET ?2",
                )?;
                let ids = stmt
                    .query_map(params![limit, offset], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                let mut presentations = Vec::with_capacity(ids.len());
                for id in ids {
                    if let Some(p) = load_presentation(conn, &id)? {
                        presentations.push(p);
                    }
                }
                Ok(presentations)
            })
            .await;

        match result {
            Ok(Ok(presentations)) => presentations,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "failed to list presentations");
                Vec::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "interact error during list");
                Vec::new()
            }
        }
    }

    /// Substring match against topic via SQL LIKE.
    pub async fn search(&self, topic: &str) -> Vec<Presentation> {
        let pattern = format!("%{topic}%");
        let conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "pool error during search");
                return Vec::new();
            }
        };

        let result = conn
            .interact(move |conn| -> rusqlite::Result<Vec<Presentation>> {
                let mut stmt = conn.prepare(
                    "SELECT id FROM presentations WHERE topic LIKE ?1 ORDER BY created_at",
                )?;
                let ids = stmt
                    .query_map(params![pattern], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                let mut presentations = Vec::with_capacity(ids.len());
                for id in ids {
                    if let Some(p) = load_presentation(conn, &id)? {
                        presentations.push(p);
                    }
                }
                Ok(presentations)
            })
            .await;

        match result {
            Ok(Ok(presentations)) => presentations,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "failed to search presentations");
                Vec::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "interact error during search");
                Vec::new()
            }
        }
    }
}

/// Load one presentation with its ordered slides. Unknown theme and
/// aspect-ratio strings from older rows coerce to their defaults.
fn load_presentation(conn: &Connection, id: &str) -> rusqlite::Result<Option<Presentation>> {
    let row = conn
        .query_row(
            "SELECT id, topic, num_slides, custom_content, theme, font, colors,
                    aspect_ratio, custom_width, custom_height, created_at, updated_at
             FROM presentations WHERE id = ?1",
            params![id],
            |row| {
                let colors_json: String = row.get(6)?;
                let colors: BTreeMap<String, String> =
                    serde_json::from_str(&colors_json).unwrap_or_default();
                Ok(Presentation {
                    id: row.get(0)?,
                    topic: row.get(1)?,
                    num_slides: row.get::<_, i64>(2)? as usize,
                    slides: Vec::new(),
                    custom_content: row.get(3)?,
                    theme: Theme::parse_or_default(&row.get::<_, String>(4)?),
                    font: row.get(5)?,
                    colors,
                    aspect_ratio: AspectRatio::parse_or_default(&row.get::<_, String>(7)?),
                    custom_width: row.get(8)?,
                    custom_height: row.get(9)?,
                    created_at: row.get(10)?,
                    updated_at: row.get(11)?,
                })
            },
        )
        .optional()?;

    let Some(mut presentation) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT slide_type, title, content, image_suggestion, citations
         FROM slides WHERE presentation_id = ?1 ORDER BY slide_order",
    )?;
    let slides = stmt
        .query_map(params![id], |row| {
            let content_json: String = row.get(2)?;
            let citations_json: String = row.get(4)?;
            Ok(Slide {
                slide_type: SlideType::parse_or_default(&row.get::<_, String>(0)?),
                title: row.get(1)?,
                content: serde_json::from_str(&content_json).unwrap_or_default(),
                image_suggestion: row.get(3)?,
                citations: serde_json::from_str(&citations_json).unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    presentation.slides = slides;
    Ok(Some(presentation))
}
