use actix_web::{delete, get, patch, post, web, Error, HttpRequest, HttpResponse, Responder, Result};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;

use crate::auth;
use crate::models::gallery::GalleryItem;
use crate::storage::Storage;

#[get("/api/admin/gallery")]
pub async fn list_gallery(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let items = sqlx::query_as::<_, GalleryItem>(
        "SELECT id, url, caption, created_at FROM gallery_items ORDER BY created_at DESC",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(items))
}

#[derive(Deserialize)]
pub struct CreateGalleryPayload {
    pub url: String,
    pub caption: Option<String>,
}

#[post("/api/admin/gallery")]
pub async fn create_gallery_item(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateGalleryPayload>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let url = payload.url.trim();
    if url.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false, "message": "URL foto wajib diisi"
        })));
    }
    let caption = payload
        .caption
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let result = sqlx::query("INSERT INTO gallery_items (url, caption) VALUES (?, ?)")
        .bind(url)
        .bind(caption)
        .execute(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let item = sqlx::query_as::<_, GalleryItem>(
        "SELECT id, url, caption, created_at FROM gallery_items WHERE id = ?",
    )
    .bind(result.last_insert_id() as i32)
    .fetch_one(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(item))
}

#[derive(Deserialize)]
pub struct UpdateGalleryPayload {
    pub caption: Option<String>,
}

#[patch("/api/admin/gallery/{id}")]
pub async fn update_gallery_item(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<i32>,
    payload: web::Json<UpdateGalleryPayload>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;
    let id = path.into_inner();

    let caption = payload
        .caption
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let result = sqlx::query("UPDATE gallery_items SET caption = ? WHERE id = ?")
        .bind(caption)
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if result.rows_affected() == 0 {
        return Err(actix_web::error::ErrorNotFound("Item galeri tidak ditemukan"));
    }

    let item = sqlx::query_as::<_, GalleryItem>(
        "SELECT id, url, caption, created_at FROM gallery_items WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(item))
}

#[delete("/api/admin/gallery/{id}")]
pub async fn delete_gallery_item(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    storage: web::Data<Storage>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;
    let id = path.into_inner();

    let item = sqlx::query_as::<_, GalleryItem>(
        "SELECT id, url, caption, created_at FROM gallery_items WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?
    .ok_or_else(|| actix_web::error::ErrorNotFound("Item galeri tidak ditemukan"))?;

    sqlx::query("DELETE FROM gallery_items WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    storage.delete(&item.url).await;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
