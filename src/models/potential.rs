use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::prelude::FromRow;

/// Produk/potensi unggulan. Emoji dan gambar boleh terisi dua-duanya
/// (gambar jadi latar, emoji jadi overlay) atau salah satu saja.
#[derive(Serialize, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Potential {
    pub id: i32,
    pub name: String,
    pub desc: Option<String>,
    pub emoji: Option<String>,
    pub image_url: Option<String>,
    pub created_at: NaiveDateTime,
}
