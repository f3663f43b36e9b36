use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, Error, HttpRequest, HttpResponse, Responder, Result};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::BTreeMap;

use crate::auth;
use crate::models::setting::{rows_to_map, KeyValue};
use crate::storage::{Storage, UploadOptions};
use crate::utils::read_multipart;

/// Kunci banner yang boleh diganti lewat endpoint banner.
pub const BANNER_KEYS: [&str; 7] = [
    "heroImage",
    "beritaBanner",
    "galeriBanner",
    "potensiBanner",
    "profilBanner",
    "strukturBanner",
    "petaBanner",
];

pub fn is_banner_key(key: &str) -> bool {
    BANNER_KEYS.contains(&key)
}

async fn upsert_kv(pool: &MySqlPool, table: &str, key: &str, value: &str) -> Result<(), Error> {
    let sql = format!(
        "INSERT INTO {} (`key`, value) VALUES (?, ?) ON DUPLICATE KEY UPDATE value = VALUES(value)",
        table
    );
    sqlx::query(&sql)
        .bind(key)
        .bind(value)
        .execute(pool)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(())
}

#[get("/api/admin/settings")]
pub async fn get_settings(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let rows = sqlx::query_as::<_, KeyValue>("SELECT `key`, value FROM settings")
        .fetch_all(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(rows_to_map(rows)))
}

/// Upsert massal: body adalah map datar key -> value. Kunci tidak punya
/// skema tetap, jadi tidak ada whitelist di sini.
#[post("/api/admin/settings")]
pub async fn save_settings(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<BTreeMap<String, String>>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    for (key, value) in payload.iter() {
        if key.trim().is_empty() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": "Key setting tidak boleh kosong"
            })));
        }
        upsert_kv(pool.get_ref(), "settings", key.trim(), value).await?;
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[get("/api/admin/profile")]
pub async fn get_profile(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let rows = sqlx::query_as::<_, KeyValue>("SELECT `key`, value FROM profile_info")
        .fetch_all(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(rows_to_map(rows)))
}

#[post("/api/admin/profile")]
pub async fn save_profile(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<BTreeMap<String, String>>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    for (key, value) in payload.iter() {
        if key.trim().is_empty() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": "Key profil tidak boleh kosong"
            })));
        }
        upsert_kv(pool.get_ref(), "profile_info", key.trim(), value).await?;
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// Unggah banner halaman: file + key (whitelist). Banner lama diganti dan
/// filenya dibuang best-effort.
#[post("/api/admin/settings/banners")]
pub async fn upload_banner(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    storage: web::Data<Storage>,
    mut payload: Multipart,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let (file, fields) = read_multipart(&mut payload).await?;
    let file = file.ok_or_else(|| actix_web::error::ErrorBadRequest("File dan key wajib diisi"))?;
    let key = fields
        .get("key")
        .filter(|k| !k.is_empty())
        .ok_or_else(|| actix_web::error::ErrorBadRequest("File dan key wajib diisi"))?
        .clone();

    if !is_banner_key(&key) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false, "message": "Key banner tidak dikenal"
        })));
    }

    let result = storage
        .upload(
            &file,
            UploadOptions {
                folder: "banners".to_string(),
                custom_filename: Some(format!("{}-{}", key, uuid::Uuid::new_v4().simple())),
                ..Default::default()
            },
        )
        .await;

    let url = match result.url {
        Some(url) if result.success => url,
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false,
                "message": result.error.unwrap_or_else(|| "Upload gagal".to_string())
            })))
        }
    };

    let old = sqlx::query_as::<_, KeyValue>("SELECT `key`, value FROM settings WHERE `key` = ?")
        .bind(&key)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    upsert_kv(pool.get_ref(), "settings", &key, &url).await?;

    if let Some(old) = old {
        if !old.value.is_empty() {
            storage.delete(&old.value).await;
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "url": url })))
}

#[derive(Deserialize)]
pub struct BannerQuery {
    key: Option<String>,
}

#[delete("/api/admin/settings/banners")]
pub async fn delete_banner(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    storage: web::Data<Storage>,
    query: web::Query<BannerQuery>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let key = query
        .key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| actix_web::error::ErrorBadRequest("Key wajib diisi"))?;

    let setting = sqlx::query_as::<_, KeyValue>("SELECT `key`, value FROM settings WHERE `key` = ?")
        .bind(key)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if let Some(setting) = &setting {
        if !setting.value.is_empty() {
            storage.delete(&setting.value).await;
        }
    }

    sqlx::query("DELETE FROM settings WHERE `key` = ?")
        .bind(key)
        .execute(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_key_whitelist() {
        for key in BANNER_KEYS {
            assert!(is_banner_key(key));
        }
        assert!(!is_banner_key("heroimage"));
        assert!(!is_banner_key("randomKey"));
        assert!(!is_banner_key(""));
    }
}
