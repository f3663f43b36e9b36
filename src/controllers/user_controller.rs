use actix_web::{delete, get, patch, post, web, Error, HttpRequest, HttpResponse, Responder, Result};
use bcrypt::DEFAULT_COST;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::auth;
use crate::models::user::PublicUser;

const PUBLIC_COLUMNS: &str = "id, email, created_at, updated_at";

async fn fetch_user(pool: &MySqlPool, id: &str) -> Result<Option<PublicUser>, Error> {
    sqlx::query_as::<_, PublicUser>(&format!(
        "SELECT {} FROM users WHERE id = ?",
        PUBLIC_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(actix_web::error::ErrorInternalServerError)
}

fn normalize_email(raw: &str) -> Result<String, &'static str> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err("Email tidak valid");
    }
    Ok(email)
}

#[get("/api/admin/users")]
pub async fn list_users(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let users = sqlx::query_as::<_, PublicUser>(&format!(
        "SELECT {} FROM users ORDER BY created_at ASC",
        PUBLIC_COLUMNS
    ))
    .fetch_all(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(users))
}

#[get("/api/admin/users/{id}")]
pub async fn get_user(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    match fetch_user(pool.get_ref(), &path.into_inner()).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(actix_web::error::ErrorNotFound("User tidak ditemukan")),
    }
}

#[derive(Deserialize)]
pub struct CreateUserPayload {
    pub email: String,
    pub password: String,
}

#[post("/api/admin/users")]
pub async fn create_user(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateUserPayload>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let email = match normalize_email(&payload.email) {
        Ok(email) => email,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": msg
            })))
        }
    };
    if payload.password.len() < 6 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false, "message": "Password minimal 6 karakter"
        })));
    }

    let existing: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    if existing.is_some() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false, "message": "Email sudah terdaftar"
        })));
    }

    let hashed = bcrypt::hash(&payload.password, DEFAULT_COST).map_err(|e| {
        log::error!("Gagal hash password: {}", e);
        actix_web::error::ErrorInternalServerError("Gagal memproses password")
    })?;

    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO users (id, email, password) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(&email)
        .bind(&hashed)
        .execute(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let user = fetch_user(pool.get_ref(), &id)
        .await?
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("User hilang setelah insert"))?;
    Ok(HttpResponse::Ok().json(user))
}

#[derive(Deserialize)]
pub struct UpdateUserPayload {
    pub email: String,
    pub password: Option<String>,
}

#[patch("/api/admin/users/{id}")]
pub async fn update_user(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<UpdateUserPayload>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;
    let id = path.into_inner();

    if fetch_user(pool.get_ref(), &id).await?.is_none() {
        return Err(actix_web::error::ErrorNotFound("User tidak ditemukan"));
    }

    let email = match normalize_email(&payload.email) {
        Ok(email) => email,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": msg
            })))
        }
    };
    if let Some(password) = &payload.password {
        if password.len() < 6 {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": "Password minimal 6 karakter"
            })));
        }
    }

    // email harus tetap unik terhadap user lain
    let taken: Option<String> =
        sqlx::query_scalar("SELECT id FROM users WHERE email = ? AND id <> ?")
            .bind(&email)
            .bind(&id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(actix_web::error::ErrorInternalServerError)?;
    if taken.is_some() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false, "message": "Email sudah terdaftar"
        })));
    }

    match &payload.password {
        Some(password) => {
            let hashed = bcrypt::hash(password, DEFAULT_COST).map_err(|e| {
                log::error!("Gagal hash password: {}", e);
                actix_web::error::ErrorInternalServerError("Gagal memproses password")
            })?;
            sqlx::query("UPDATE users SET email = ?, password = ? WHERE id = ?")
                .bind(&email)
                .bind(&hashed)
                .bind(&id)
                .execute(pool.get_ref())
                .await
                .map_err(actix_web::error::ErrorInternalServerError)?;
        }
        None => {
            sqlx::query("UPDATE users SET email = ? WHERE id = ?")
                .bind(&email)
                .bind(&id)
                .execute(pool.get_ref())
                .await
                .map_err(actix_web::error::ErrorInternalServerError)?;
        }
    }

    let user = fetch_user(pool.get_ref(), &id)
        .await?
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("User hilang setelah update"))?;
    Ok(HttpResponse::Ok().json(user))
}

#[delete("/api/admin/users/{id}")]
pub async fn delete_user(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    let claims = auth::verify_jwt(&req)?;
    let id = path.into_inner();

    if claims.user_id == id {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false, "message": "Tidak bisa menghapus akun sendiri"
        })));
    }

    if fetch_user(pool.get_ref(), &id).await?.is_none() {
        return Err(actix_web::error::ErrorNotFound("User tidak ditemukan"));
    }

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&id)
        .execute(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization() {
        assert_eq!(
            normalize_email("  Admin@Kelurahan.GO.ID "),
            Ok("admin@kelurahan.go.id".to_string())
        );
        assert!(normalize_email("").is_err());
        assert!(normalize_email("bukan-email").is_err());
    }
}
