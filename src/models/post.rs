use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::prelude::FromRow;

pub const POST_TYPES: [&str; 2] = ["BERITA", "PENGUMUMAN"];
pub const POST_STATUSES: [&str; 2] = ["DRAFT", "PUBLISHED"];

pub fn is_valid_type(s: &str) -> bool {
    POST_TYPES.contains(&s)
}

pub fn is_valid_status(s: &str) -> bool {
    POST_STATUSES.contains(&s)
}

#[derive(Serialize, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i32,
    #[serde(rename = "type")]
    pub r#type: String,
    pub title: String,
    pub body: String,
    pub featured_image: Option<String>,
    pub date: NaiveDateTime,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Bentuk ringkas untuk daftar "berita terkait" di halaman detail.
#[derive(Serialize, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPost {
    pub id: i32,
    #[serde(rename = "type")]
    pub r#type: String,
    pub title: String,
    pub featured_image: Option<String>,
    pub date: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_and_status_validation() {
        assert!(is_valid_type("BERITA"));
        assert!(is_valid_type("PENGUMUMAN"));
        assert!(!is_valid_type("berita"));
        assert!(!is_valid_type("OPINI"));

        assert!(is_valid_status("DRAFT"));
        assert!(is_valid_status("PUBLISHED"));
        assert!(!is_valid_status("ARCHIVED"));
    }
}
