use actix_web::{delete, get, patch, post, web, Error, HttpRequest, HttpResponse, Responder, Result};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;

use crate::auth;
use crate::models::potential::Potential;
use crate::storage::Storage;

const POTENTIAL_COLUMNS: &str = "id, name, `desc`, emoji, image_url, created_at";

async fn fetch_potential(pool: &MySqlPool, id: i32) -> Result<Option<Potential>, Error> {
    sqlx::query_as::<_, Potential>(&format!(
        "SELECT {} FROM potentials WHERE id = ?",
        POTENTIAL_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(actix_web::error::ErrorInternalServerError)
}

fn normalize_name(raw: &str) -> Result<String, &'static str> {
    let name = raw.trim();
    if name.chars().count() < 3 {
        return Err("Nama wajib diisi (minimal 3 karakter)");
    }
    Ok(name.to_string())
}

#[get("/api/admin/potentials")]
pub async fn list_potentials(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let items = sqlx::query_as::<_, Potential>(&format!(
        "SELECT {} FROM potentials ORDER BY created_at DESC",
        POTENTIAL_COLUMNS
    ))
    .fetch_all(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(items))
}

#[get("/api/admin/potentials/{id}")]
pub async fn get_potential(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    match fetch_potential(pool.get_ref(), path.into_inner()).await? {
        Some(item) => Ok(HttpResponse::Ok().json(item)),
        None => Err(actix_web::error::ErrorNotFound("Potensi tidak ditemukan")),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotentialPayload {
    pub name: String,
    pub desc: Option<String>,
    pub emoji: Option<String>,
    pub image_url: Option<String>,
}

fn clean_optional(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[post("/api/admin/potentials")]
pub async fn create_potential(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<PotentialPayload>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let name = match normalize_name(&payload.name) {
        Ok(name) => name,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": msg
            })))
        }
    };

    let result = sqlx::query(
        "INSERT INTO potentials (name, `desc`, emoji, image_url) VALUES (?, ?, ?, ?)",
    )
    .bind(&name)
    .bind(clean_optional(&payload.desc))
    .bind(clean_optional(&payload.emoji))
    .bind(clean_optional(&payload.image_url))
    .execute(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    let item = fetch_potential(pool.get_ref(), result.last_insert_id() as i32)
        .await?
        .ok_or_else(|| {
            actix_web::error::ErrorInternalServerError("Potensi hilang setelah insert")
        })?;

    Ok(HttpResponse::Ok().json(item))
}

#[patch("/api/admin/potentials/{id}")]
pub async fn update_potential(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    storage: web::Data<Storage>,
    path: web::Path<i32>,
    payload: web::Json<PotentialPayload>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;
    let id = path.into_inner();

    let existing = fetch_potential(pool.get_ref(), id)
        .await?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Potensi tidak ditemukan"))?;

    let name = match normalize_name(&payload.name) {
        Ok(name) => name,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": msg
            })))
        }
    };
    let image_url = clean_optional(&payload.image_url);

    sqlx::query("UPDATE potentials SET name = ?, `desc` = ?, emoji = ?, image_url = ? WHERE id = ?")
        .bind(&name)
        .bind(clean_optional(&payload.desc))
        .bind(clean_optional(&payload.emoji))
        .bind(&image_url)
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    // gambar lama dibuang kalau URL-nya berganti
    if let Some(old) = &existing.image_url {
        if image_url.as_deref() != Some(old.as_str()) {
            storage.delete(old).await;
        }
    }

    let item = fetch_potential(pool.get_ref(), id).await?.ok_or_else(|| {
        actix_web::error::ErrorInternalServerError("Potensi hilang setelah update")
    })?;

    Ok(HttpResponse::Ok().json(item))
}

#[delete("/api/admin/potentials/{id}")]
pub async fn delete_potential(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    storage: web::Data<Storage>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;
    let id = path.into_inner();

    let existing = fetch_potential(pool.get_ref(), id)
        .await?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Potensi tidak ditemukan"))?;

    sqlx::query("DELETE FROM potentials WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if let Some(url) = &existing.image_url {
        storage.delete(url).await;
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_minimum_length() {
        assert!(normalize_name("ab").is_err());
        assert!(normalize_name("  a  ").is_err());
        assert_eq!(
            normalize_name("  Kacang Kawangkoan  "),
            Ok("Kacang Kawangkoan".to_string())
        );
    }

    #[test]
    fn empty_optionals_become_null() {
        assert_eq!(clean_optional(&None), None);
        assert_eq!(clean_optional(&Some("   ".to_string())), None);
        assert_eq!(
            clean_optional(&Some(" 🥜 ".to_string())),
            Some("🥜".to_string())
        );
    }
}
