use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::prelude::FromRow;

#[derive(FromRow, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Bentuk yang boleh keluar lewat API — tanpa hash password.
#[derive(Serialize, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
