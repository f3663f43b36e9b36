use actix_multipart::Multipart;
use actix_web::{post, web, Error, HttpRequest, HttpResponse, Responder, Result};
use serde_json::json;

use crate::auth;
use crate::storage::{Storage, UploadOptions, UPLOAD_FOLDERS};
use crate::utils::read_multipart;

/// Endpoint unggah umum: field `file` (wajib) + field `folder` opsional.
/// Folder di luar daftar yang dikenal jatuh ke "posts".
#[post("/api/admin/upload")]
pub async fn upload_file(
    req: HttpRequest,
    storage: web::Data<Storage>,
    mut payload: Multipart,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let (file, fields) = read_multipart(&mut payload).await?;
    let file = file.ok_or_else(|| actix_web::error::ErrorBadRequest("File tidak ditemukan"))?;

    let folder = fields
        .get("folder")
        .map(String::as_str)
        .filter(|f| UPLOAD_FOLDERS.contains(f))
        .unwrap_or("posts")
        .to_string();

    let result = storage
        .upload(
            &file,
            UploadOptions {
                folder,
                ..Default::default()
            },
        )
        .await;

    match result.url {
        Some(url) if result.success => Ok(HttpResponse::Ok().json(json!({ "url": url }))),
        _ => Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": result.error.unwrap_or_else(|| "Upload gagal".to_string())
        }))),
    }
}

/// Alias untuk form potensi; selalu menulis ke folder potentials.
#[post("/api/admin/potentials/upload")]
pub async fn upload_potential_image(
    req: HttpRequest,
    storage: web::Data<Storage>,
    mut payload: Multipart,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let (file, _) = read_multipart(&mut payload).await?;
    let file = file.ok_or_else(|| actix_web::error::ErrorBadRequest("File tidak ditemukan"))?;

    let result = storage
        .upload(
            &file,
            UploadOptions {
                folder: "potentials".to_string(),
                ..Default::default()
            },
        )
        .await;

    match result.url {
        Some(url) if result.success => Ok(HttpResponse::Ok().json(json!({ "url": url }))),
        _ => Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": result.error.unwrap_or_else(|| "Upload gagal".to_string())
        }))),
    }
}
