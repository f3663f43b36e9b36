use actix_web::{get, web, Error, HttpResponse, Responder, Result};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

use crate::models::post::{is_valid_type, Post, RelatedPost};
use crate::models::potential::Potential;
use crate::models::setting::{rows_to_map, KeyValue};
use crate::models::structure::PublishedMember;
use crate::models::gallery::GalleryItem;
use crate::utils::{page_params, paginate, search_keyword, Paginated, Pagination};

#[derive(Debug, Deserialize)]
pub struct PublicPostsQuery {
    category: Option<String>,
    search: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

/// Susun klausa WHERE untuk daftar post publik. Hanya post PUBLISHED yang
/// pernah keluar lewat endpoint ini; kategori tak dikenal diabaikan,
/// kata kunci < 3 karakter diperlakukan seperti tanpa filter.
fn public_posts_filter(category: Option<&str>, search: Option<&str>) -> (String, Vec<String>) {
    let mut sql = String::from("WHERE status = 'PUBLISHED'");
    let mut binds = Vec::new();

    if let Some(cat) = category {
        if is_valid_type(cat) {
            sql.push_str(" AND type = ?");
            binds.push(cat.to_string());
        }
    }

    if let Some(keyword) = search_keyword(search) {
        sql.push_str(" AND (LOWER(title) LIKE ? OR LOWER(body) LIKE ?)");
        let pattern = format!("%{}%", keyword.to_lowercase());
        binds.push(pattern.clone());
        binds.push(pattern);
    }

    (sql, binds)
}

#[derive(Serialize)]
struct PublicPostsResponse {
    posts: Vec<Post>,
    pagination: Pagination,
}

#[get("/api/public/posts")]
pub async fn get_posts(
    pool: web::Data<MySqlPool>,
    query: web::Query<PublicPostsQuery>,
) -> Result<impl Responder, Error> {
    let page_query = crate::utils::PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit, offset) = page_params(&page_query, 10);
    let (where_sql, binds) = public_posts_filter(query.category.as_deref(), query.search.as_deref());

    let list_sql = format!(
        "SELECT id, type, title, body, featured_image, date, status, created_at, updated_at \
         FROM posts {} ORDER BY date DESC, created_at DESC LIMIT ? OFFSET ?",
        where_sql
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

    Ok(HttpResponse::Ok().json(PublicPostsResponse {
        posts,
        pagination: paginate(total, page, limit),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostDetailResponse {
    post: Post,
    related_posts: Vec<RelatedPost>,
}

#[get("/api/public/posts/{id}")]
pub async fn get_post_detail(
    pool: web::Data<MySqlPool>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let id = path.into_inner();

    let post = sqlx::query_as::<_, Post>(
        "SELECT id, type, title, body, featured_image, date, status, created_at, updated_at \
         FROM posts WHERE id = ? AND status = 'PUBLISHED'",
    )
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    let post = match post {
        Some(post) => post,
        None => return Err(actix_web::error::ErrorNotFound("Post tidak ditemukan")),
    };

    let related_posts = sqlx::query_as::<_, RelatedPost>(
        "SELECT id, type, title, featured_image, date, created_at \
         FROM posts WHERE status = 'PUBLISHED' AND type = ? AND id <> ? \
         ORDER BY created_at DESC LIMIT 3",
    )
    .bind(&post.r#type)
    .bind(id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post,
        related_posts,
    }))
}

#[get("/api/public/gallery")]
pub async fn get_gallery(
    pool: web::Data<MySqlPool>,
    query: web::Query<crate::utils::PageQuery>,
) -> Result<impl Responder, Error> {
    let (page, limit, offset) = page_params(&query, 20);

    let items = sqlx::query_as::<_, GalleryItem>(
        "SELECT id, url, caption, created_at FROM gallery_items \
         ORDER BY created_at DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gallery_items")
        .fetch_one(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(Paginated {
        data: items,
        pagination: paginate(total, page, limit),
    }))
}

#[get("/api/public/potentials")]
pub async fn get_potentials(
    pool: web::Data<MySqlPool>,
    query: web::Query<crate::utils::PageQuery>,
) -> Result<impl Responder, Error> {
    let (page, limit, offset) = page_params(&query, 20);

    let items = sqlx::query_as::<_, Potential>(
        "SELECT id, name, `desc`, emoji, image_url, created_at FROM potentials \
         ORDER BY created_at DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM potentials")
        .fetch_one(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(Paginated {
        data: items,
        pagination: paginate(total, page, limit),
    }))
}

#[get("/api/public/settings")]
pub async fn get_settings(pool: web::Data<MySqlPool>) -> Result<impl Responder, Error> {
    let rows = sqlx::query_as::<_, KeyValue>("SELECT `key`, value FROM settings")
        .fetch_all(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(rows_to_map(rows)))
}

#[get("/api/public/profile")]
pub async fn get_profile(pool: web::Data<MySqlPool>) -> Result<impl Responder, Error> {
    let rows = sqlx::query_as::<_, KeyValue>("SELECT `key`, value FROM profile_info")
        .fetch_all(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(rows_to_map(rows)))
}

/// Bagan organisasi publik: selalu snapshot terakhir yang dipublish,
/// berapa pun banyaknya edit draft sesudahnya.
#[get("/api/public/structure")]
pub async fn get_structure(pool: web::Data<MySqlPool>) -> Result<impl Responder, Error> {
    let members = sqlx::query_as::<_, PublishedMember>(
        "SELECT id, jabatan, nama, nip, foto_url, position_x, position_y, parent_id, urutan \
         FROM published_structure ORDER BY urutan ASC, published_at ASC",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(members))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_never_matches_public_filter() {
        let (sql, binds) = public_posts_filter(None, None);
        assert_eq!(sql, "WHERE status = 'PUBLISHED'");
        assert!(binds.is_empty());
    }

    #[test]
    fn category_filter_only_for_known_types() {
        let (sql, binds) = public_posts_filter(Some("BERITA"), None);
        assert!(sql.contains("AND type = ?"));
        assert_eq!(binds, vec!["BERITA".to_string()]);

        let (sql, binds) = public_posts_filter(Some("GOSIP"), None);
        assert!(!sql.contains("type"));
        assert!(binds.is_empty());
    }

    #[test]
    fn short_search_is_no_filter() {
        let (sql, binds) = public_posts_filter(None, Some("ab"));
        assert!(!sql.contains("LIKE"));
        assert!(binds.is_empty());
    }

    #[test]
    fn search_matches_title_or_body_case_insensitive() {
        let (sql, binds) = public_posts_filter(None, Some("Kacang"));
        assert!(sql.contains("LOWER(title) LIKE ? OR LOWER(body) LIKE ?"));
        assert_eq!(binds, vec!["%kacang%".to_string(), "%kacang%".to_string()]);
    }
}
