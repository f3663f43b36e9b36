use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::prelude::FromRow;

#[derive(Serialize, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: i32,
    pub url: String,
    pub caption: Option<String>,
    pub created_at: NaiveDateTime,
}
