use actix_web::{delete, get, patch, post, web, Error, HttpRequest, HttpResponse, Responder, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;

use crate::auth;
use crate::models::post::{is_valid_status, is_valid_type, Post};
use crate::storage::Storage;
use crate::utils::{page_params, paginate, search_keyword, Paginated};

const POST_COLUMNS: &str =
    "id, type, title, body, featured_image, date, status, created_at, updated_at";

/// Terima "YYYY-MM-DD" maupun ISO "YYYY-MM-DDTHH:MM:SS".
fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

async fn fetch_post(pool: &MySqlPool, id: i32) -> Result<Option<Post>, Error> {
    sqlx::query_as::<_, Post>(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)
}

#[derive(Debug, Deserialize)]
pub struct AdminPostsQuery {
    #[serde(rename = "type")]
    r#type: Option<String>,
    status: Option<String>,
    search: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

fn admin_posts_filter(
    r#type: Option<&str>,
    status: Option<&str>,
    search: Option<&str>,
) -> (String, Vec<String>) {
    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    if let Some(t) = r#type {
        if is_valid_type(t) {
            clauses.push("type = ?");
            binds.push(t.to_string());
        }
    }
    if let Some(s) = status {
        if is_valid_status(s) {
            clauses.push("status = ?");
            binds.push(s.to_string());
        }
    }
    if let Some(keyword) = search_keyword(search) {
        clauses.push("(LOWER(title) LIKE ? OR LOWER(body) LIKE ?)");
        let pattern = format!("%{}%", keyword.to_lowercase());
        binds.push(pattern.clone());
        binds.push(pattern);
    }

    let sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (sql, binds)
}

#[get("/api/admin/posts")]
pub async fn list_posts(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    query: web::Query<AdminPostsQuery>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let page_query = crate::utils::PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit, offset) = page_params(&page_query, 10);
    let (where_sql, binds) = admin_posts_filter(
        query.r#type.as_deref(),
        query.status.as_deref(),
        query.search.as_deref(),
    );

    let list_sql = format!(
        "SELECT {} FROM posts {} ORDER BY date DESC, created_at DESC LIMIT ? OFFSET ?",
        POST_COLUMNS, where_sql
    );
    let mut list_query = sqlx::query_as::<_, Post>(&list_sql);
    for bind in &binds {
        list_query = list_query.bind(bind);
    }
    let posts = list_query
        .bind(limit)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let count_sql = format!("SELECT COUNT(*) FROM posts {}", where_sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total = count_query
        .fetch_one(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(Paginated {
        data: posts,
        pagination: paginate(total, page, limit),
    }))
}

#[get("/api/admin/posts/{id}")]
pub async fn get_post(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    match fetch_post(pool.get_ref(), path.into_inner()).await? {
        Some(post) => Ok(HttpResponse::Ok().json(post)),
        None => Err(actix_web::error::ErrorNotFound("Post tidak ditemukan")),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostPayload {
    #[serde(rename = "type")]
    pub r#type: String,
    pub title: String,
    pub body: String,
    pub featured_image: Option<String>,
    pub date: Option<String>,
    pub status: Option<String>,
}

#[post("/api/admin/posts")]
pub async fn create_post(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePostPayload>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let title = payload.title.trim();
    let body = payload.body.trim();
    if title.is_empty() || body.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false, "message": "Judul dan isi wajib diisi"
        })));
    }
    if !is_valid_type(&payload.r#type) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false, "message": "Tipe post harus BERITA atau PENGUMUMAN"
        })));
    }
    let status = payload.status.clone().unwrap_or_else(|| "DRAFT".to_string());
    if !is_valid_status(&status) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false, "message": "Status harus DRAFT atau PUBLISHED"
        })));
    }
    let date = match payload.date.as_deref() {
        Some(raw) => parse_date(raw).ok_or_else(|| {
            actix_web::error::ErrorBadRequest("Format tanggal tidak valid (YYYY-MM-DD)")
        })?,
        None => Utc::now().naive_utc(),
    };

    let result = sqlx::query(
        "INSERT INTO posts (type, title, body, featured_image, date, status) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.r#type)
    .bind(title)
    .bind(body)
    .bind(&payload.featured_image)
    .bind(date)
    .bind(&status)
    .execute(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    let post = fetch_post(pool.get_ref(), result.last_insert_id() as i32)
        .await?
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Post hilang setelah insert"))?;

    Ok(HttpResponse::Ok().json(post))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostPayload {
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    // absen = biarkan, null = kosongkan
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub featured_image: Option<Option<String>>,
    pub date: Option<String>,
    pub status: Option<String>,
}

#[patch("/api/admin/posts/{id}")]
pub async fn update_post(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    storage: web::Data<Storage>,
    path: web::Path<i32>,
    payload: web::Json<UpdatePostPayload>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;
    let id = path.into_inner();

    let existing = fetch_post(pool.get_ref(), id)
        .await?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Post tidak ditemukan"))?;

    let title = match payload.title.as_deref() {
        Some(t) if t.trim().is_empty() => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": "Judul tidak boleh kosong"
            })))
        }
        Some(t) => t.trim().to_string(),
        None => existing.title.clone(),
    };
    let body = match payload.body.as_deref() {
        Some(b) if b.trim().is_empty() => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": "Isi tidak boleh kosong"
            })))
        }
        Some(b) => b.trim().to_string(),
        None => existing.body.clone(),
    };
    let r#type = match payload.r#type.as_deref() {
        Some(t) if !is_valid_type(t) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": "Tipe post harus BERITA atau PENGUMUMAN"
            })))
        }
        Some(t) => t.to_string(),
        None => existing.r#type.clone(),
    };
    let status = match payload.status.as_deref() {
        Some(s) if !is_valid_status(s) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": "Status harus DRAFT atau PUBLISHED"
            })))
        }
        Some(s) => s.to_string(),
        None => existing.status.clone(),
    };
    let date = match payload.date.as_deref() {
        Some(raw) => parse_date(raw).ok_or_else(|| {
            actix_web::error::ErrorBadRequest("Format tanggal tidak valid (YYYY-MM-DD)")
        })?,
        None => existing.date,
    };
    let featured_image = match &payload.featured_image {
        Some(value) => value.clone(),
        None => existing.featured_image.clone(),
    };

    sqlx::query(
        "UPDATE posts SET type = ?, title = ?, body = ?, featured_image = ?, date = ?, status = ? \
         WHERE id = ?",
    )
    .bind(&r#type)
    .bind(&title)
    .bind(&body)
    .bind(&featured_image)
    .bind(date)
    .bind(&status)
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    // gambar lama ikut dibuang kalau URL-nya berganti; gagal hapus tidak
    // membatalkan update
    if let Some(old) = &existing.featured_image {
        if featured_image.as_deref() != Some(old.as_str()) {
            storage.delete(old).await;
        }
    }

    let post = fetch_post(pool.get_ref(), id)
        .await?
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Post hilang setelah update"))?;
    Ok(HttpResponse::Ok().json(post))
}

#[delete("/api/admin/posts/{id}")]
pub async fn delete_post(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    storage: web::Data<Storage>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;
    let id = path.into_inner();

    let existing = fetch_post(pool.get_ref(), id)
        .await?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Post tidak ditemukan"))?;

    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if let Some(url) = &existing.featured_image {
        storage.delete(url).await;
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_parsing() {
        assert_eq!(
            parse_date("2026-08-07"),
            NaiveDate::from_ymd_opt(2026, 8, 7).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert_eq!(
            parse_date("2026-08-07T13:45:00"),
            NaiveDate::from_ymd_opt(2026, 8, 7).and_then(|d| d.and_hms_opt(13, 45, 0))
        );
        assert_eq!(parse_date("07/08/2026"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn admin_filter_combinations() {
        let (sql, binds) = admin_posts_filter(None, None, None);
        assert!(sql.is_empty());
        assert!(binds.is_empty());

        let (sql, binds) = admin_posts_filter(Some("BERITA"), Some("DRAFT"), Some("rapat"));
        assert_eq!(
            sql,
            "WHERE type = ? AND status = ? AND (LOWER(title) LIKE ? OR LOWER(body) LIKE ?)"
        );
        assert_eq!(binds.len(), 4);

        // nilai di luar enum tidak menghasilkan klausa
        let (sql, _) = admin_posts_filter(Some("SPAM"), Some("HIDDEN"), None);
        assert!(sql.is_empty());
    }
}
