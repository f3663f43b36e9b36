use actix_multipart::Multipart;
use actix_web::{delete, get, patch, post, web, Error, HttpRequest, HttpResponse, Responder, Result};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::auth;
use crate::models::structure::{copy_name, StructureMember, StructureMetadata};
use crate::storage::{Storage, UploadOptions};
use crate::utils::read_multipart;

const MEMBER_COLUMNS: &str = "id, jabatan, nama, nip, foto_url, position_x, position_y, \
     parent_id, urutan, created_at, updated_at";

/// Offset posisi node hasil duplikasi supaya tidak menumpuk sumbernya.
const DUPLICATE_OFFSET: f64 = 40.0;

async fn fetch_member(pool: &MySqlPool, id: &str) -> Result<Option<StructureMember>, Error> {
    sqlx::query_as::<_, StructureMember>(&format!(
        "SELECT {} FROM structure_members WHERE id = ?",
        MEMBER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(actix_web::error::ErrorInternalServerError)
}

/// Urutan berikutnya di antara saudara se-parent (NULL-safe).
async fn next_urutan(pool: &MySqlPool, parent_id: Option<&str>) -> Result<i32, Error> {
    let max: Option<i32> = sqlx::query_scalar(
        "SELECT MAX(urutan) FROM structure_members WHERE parent_id <=> ?",
    )
    .bind(parent_id)
    .fetch_one(pool)
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(max.unwrap_or(0) + 1)
}

/// Setiap mutasi draft menandai ada perubahan yang belum dipublish.
async fn mark_unpublished(pool: &MySqlPool) -> Result<(), Error> {
    sqlx::query(
        "INSERT INTO structure_metadata (id, has_unpublished) VALUES (1, TRUE) \
         ON DUPLICATE KEY UPDATE has_unpublished = TRUE",
    )
    .execute(pool)
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(())
}

/// Seluruh turunan (bukan hanya anak langsung) dari satu anggota.
async fn fetch_descendants(
    pool: &MySqlPool,
    id: &str,
) -> Result<Vec<(String, Option<String>)>, Error> {
    sqlx::query_as::<_, (String, Option<String>)>(
        "WITH RECURSIVE descendants AS ( \
             SELECT id, foto_url FROM structure_members WHERE parent_id = ? \
             UNION ALL \
             SELECT sm.id, sm.foto_url FROM structure_members sm \
             INNER JOIN descendants d ON sm.parent_id = d.id \
         ) SELECT id, foto_url FROM descendants",
    )
    .bind(id)
    .fetch_all(pool)
    .await
    .map_err(actix_web::error::ErrorInternalServerError)
}

#[get("/api/admin/structure")]
pub async fn list_members(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let members = sqlx::query_as::<_, StructureMember>(&format!(
        "SELECT {} FROM structure_members ORDER BY urutan ASC, created_at ASC",
        MEMBER_COLUMNS
    ))
    .fetch_all(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(members))
}

#[get("/api/admin/structure/metadata")]
pub async fn get_metadata(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let metadata = sqlx::query_as::<_, StructureMetadata>(
        "SELECT has_unpublished, last_published_at FROM structure_metadata WHERE id = 1",
    )
    .fetch_optional(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?
    .unwrap_or(StructureMetadata {
        has_unpublished: false,
        last_published_at: None,
    });

    Ok(HttpResponse::Ok().json(metadata))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberPayload {
    pub jabatan: String,
    pub nama: String,
    pub nip: Option<String>,
    pub foto_url: Option<String>,
    pub parent_id: Option<String>,
    pub urutan: Option<i32>,
}

#[post("/api/admin/structure")]
pub async fn create_member(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateMemberPayload>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let jabatan = payload.jabatan.trim();
    let nama = payload.nama.trim();
    if jabatan.is_empty() || nama.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false, "message": "Jabatan dan nama wajib diisi"
        })));
    }

    let parent_id = payload
        .parent_id
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    if let Some(parent) = &parent_id {
        if fetch_member(pool.get_ref(), parent).await?.is_none() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": "Parent tidak ditemukan"
            })));
        }
    }

    let urutan = match payload.urutan {
        Some(u) => u,
        None => next_urutan(pool.get_ref(), parent_id.as_deref()).await?,
    };
    let nip = payload
        .nip
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO structure_members \
         (id, jabatan, nama, nip, foto_url, position_x, position_y, parent_id, urutan) \
         VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?)",
    )
    .bind(&id)
    .bind(jabatan)
    .bind(nama)
    .bind(nip)
    .bind(&payload.foto_url)
    .bind(&parent_id)
    .bind(urutan)
    .execute(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    mark_unpublished(pool.get_ref()).await?;

    let member = fetch_member(pool.get_ref(), &id).await?.ok_or_else(|| {
        actix_web::error::ErrorInternalServerError("Anggota hilang setelah insert")
    })?;
    Ok(HttpResponse::Ok().json(member))
}

#[get("/api/admin/structure/{id}")]
pub async fn get_member(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    match fetch_member(pool.get_ref(), &path.into_inner()).await? {
        Some(member) => Ok(HttpResponse::Ok().json(member)),
        None => Err(actix_web::error::ErrorNotFound("Anggota tidak ditemukan")),
    }
}

/// Patch parsial: geser posisi (drag / nudge), sambung parent (connect),
/// atau edit isi form. Field yang absen dibiarkan; null mengosongkan.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberPayload {
    pub jabatan: Option<String>,
    pub nama: Option<String>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub nip: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub foto_url: Option<Option<String>>,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub parent_id: Option<Option<String>>,
    pub urutan: Option<i32>,
}

#[patch("/api/admin/structure/{id}")]
pub async fn update_member(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    storage: web::Data<Storage>,
    path: web::Path<String>,
    payload: web::Json<UpdateMemberPayload>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;
    let id = path.into_inner();

    let existing = fetch_member(pool.get_ref(), &id)
        .await?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Anggota tidak ditemukan"))?;

    let jabatan = match payload.jabatan.as_deref() {
        Some(j) if j.trim().is_empty() => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": "Jabatan tidak boleh kosong"
            })))
        }
        Some(j) => j.trim().to_string(),
        None => existing.jabatan.clone(),
    };
    let nama = match payload.nama.as_deref() {
        Some(n) if n.trim().is_empty() => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": "Nama tidak boleh kosong"
            })))
        }
        Some(n) => n.trim().to_string(),
        None => existing.nama.clone(),
    };

    let parent_id = match &payload.parent_id {
        Some(value) => value
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        None => existing.parent_id.clone(),
    };
    // node tidak boleh menjadi parent dirinya sendiri; tolak tanpa mutasi
    if parent_id.as_deref() == Some(id.as_str()) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false, "message": "Tidak bisa menjadikan diri sendiri sebagai parent"
        })));
    }
    if let Some(parent) = &parent_id {
        if payload.parent_id.is_some() && fetch_member(pool.get_ref(), parent).await?.is_none() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false, "message": "Parent tidak ditemukan"
            })));
        }
    }

    let nip = match &payload.nip {
        Some(value) => value
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        None => existing.nip.clone(),
    };
    let foto_url = match &payload.foto_url {
        Some(value) => value.clone(),
        None => existing.foto_url.clone(),
    };
    let position_x = payload.position_x.unwrap_or(existing.position_x);
    let position_y = payload.position_y.unwrap_or(existing.position_y);
    let urutan = payload.urutan.unwrap_or(existing.urutan);

    sqlx::query(
        "UPDATE structure_members SET jabatan = ?, nama = ?, nip = ?, foto_url = ?, \
         position_x = ?, position_y = ?, parent_id = ?, urutan = ? WHERE id = ?",
    )
    .bind(&jabatan)
    .bind(&nama)
    .bind(&nip)
    .bind(&foto_url)
    .bind(position_x)
    .bind(position_y)
    .bind(&parent_id)
    .bind(urutan)
    .bind(&id)
    .execute(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    mark_unpublished(pool.get_ref()).await?;

    if let Some(old) = &existing.foto_url {
        if foto_url.as_deref() != Some(old.as_str()) {
            storage.delete(old).await;
        }
    }

    let member = fetch_member(pool.get_ref(), &id).await?.ok_or_else(|| {
        actix_web::error::ErrorInternalServerError("Anggota hilang setelah update")
    })?;
    Ok(HttpResponse::Ok().json(member))
}

#[delete("/api/admin/structure/{id}")]
pub async fn delete_member(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    storage: web::Data<Storage>,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;
    let id = path.into_inner();

    let existing = fetch_member(pool.get_ref(), &id)
        .await?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Anggota tidak ditemukan"))?;

    // hitung turunan sebelum cascade menghapusnya
    let descendants = fetch_descendants(pool.get_ref(), &id).await?;
    let deleted_children = descendants.len() as i64;

    sqlx::query("DELETE FROM structure_members WHERE id = ?")
        .bind(&id)
        .execute(pool.get_ref())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    mark_unpublished(pool.get_ref()).await?;

    if let Some(url) = &existing.foto_url {
        storage.delete(url).await;
    }
    for (_, foto) in &descendants {
        if let Some(url) = foto {
            storage.delete(url).await;
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "deletedChildren": deleted_children
    })))
}

/// Salin satu node: nama diberi akhiran " (Copy)", parent sama, posisi
/// digeser sedikit dari sumbernya.
#[post("/api/admin/structure/{id}/duplicate")]
pub async fn duplicate_member(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;
    let id = path.into_inner();

    let source = fetch_member(pool.get_ref(), &id)
        .await?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Anggota tidak ditemukan"))?;

    let new_id = Uuid::new_v4().to_string();
    let urutan = next_urutan(pool.get_ref(), source.parent_id.as_deref()).await?;

    sqlx::query(
        "INSERT INTO structure_members \
         (id, jabatan, nama, nip, foto_url, position_x, position_y, parent_id, urutan) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&new_id)
    .bind(&source.jabatan)
    .bind(copy_name(&source.nama))
    .bind(&source.nip)
    .bind(&source.foto_url)
    .bind(source.position_x + DUPLICATE_OFFSET)
    .bind(source.position_y + DUPLICATE_OFFSET)
    .bind(&source.parent_id)
    .bind(urutan)
    .execute(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    mark_unpublished(pool.get_ref()).await?;

    let member = fetch_member(pool.get_ref(), &new_id).await?.ok_or_else(|| {
        actix_web::error::ErrorInternalServerError("Anggota hilang setelah duplikasi")
    })?;
    Ok(HttpResponse::Ok().json(member))
}

/// Publish: salin seluruh draft ke tabel snapshot dalam SATU transaksi
/// (hapus semua lalu isi ulang), lalu reset penanda perubahan. Halaman
/// publik hanya membaca snapshot ini.
#[post("/api/admin/structure/publish")]
pub async fn publish_structure(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, Error> {
    auth::verify_jwt(&req)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let members = sqlx::query_as::<_, StructureMember>(&format!(
        "SELECT {} FROM structure_members ORDER BY urutan ASC, created_at ASC",
        MEMBER_COLUMNS
    ))
    .fetch_all(&mut *tx)
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    sqlx::query("DELETE FROM published_structure")
        .execute(&mut *tx)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let now = Utc::now().naive_utc();
    for member in &members {
        sqlx::query(
            "INSERT INTO published_structure \
             (id, jabatan, nama, nip, foto_url, position_x, position_y, parent_id, urutan, published_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&member.id)
        .bind(&member.jabatan)
        .bind(&member.nama)
        .bind(&member.nip)
        .bind(&member.foto_url)
        .bind(member.position_x)
        .bind(member.position_y)
        .bind(&member.parent_id)
        .bind(member.urutan)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    }

    sqlx::query(
        "INSERT INTO structure_metadata (id, has_unpublished, last_published_at) \
         VALUES (1, FALSE, ?) \
         ON DUPLICATE KEY UPDATE has_unpublished = FALSE, last_published_at = VALUES(last_published_at)",
    )
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    tx.commit()
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let count = members.len();
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": count,
        "message": format!("Berhasil mempublikasikan {} anggota struktur", count)
    })))
}

/// Upload foto anggota struktur (form admin memvalidasi 5MB di sisi
/// klien; server memakai batas default).
#[post("/api/admin/structure/upload")]
pub async fn upload_member_photo(
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
                folder: "structure".to_string(),
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
