use actix_multipart::Multipart;
use actix_web::{error::ErrorBadRequest, Error};
use futures_util::TryStreamExt as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::storage::MAX_FILE_SIZE;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: u32,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Normalisasi parameter halaman: page minimal 1, limit dibatasi 1..=100.
/// Return (page, limit, offset).
pub fn page_params(query: &PageQuery, default_limit: u32) -> (u32, u32, u32) {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(default_limit).clamp(1, 100);
    let offset = (page - 1) * limit;
    (page, limit, offset)
}

pub fn paginate(total: i64, page: u32, limit: u32) -> Pagination {
    let total_pages = if total <= 0 {
        0
    } else {
        ((total as f64) / (limit as f64)).ceil() as u32
    };
    Pagination {
        page,
        limit,
        total,
        total_pages,
        has_more: page < total_pages,
    }
}

/// Kata kunci pencarian hanya dipakai bila panjangnya >= 3 karakter;
/// lebih pendek dari itu diperlakukan seperti tanpa filter.
pub fn search_keyword(raw: Option<&str>) -> Option<String> {
    let s = raw?.trim();
    if s.chars().count() >= 3 {
        Some(s.to_string())
    } else {
        None
    }
}

/// Deserializer untuk patch parsial pada kolom nullable: field yang absen
/// menjadi None (biarkan nilai lama), field bernilai null menjadi
/// Some(None) (kosongkan). serde bawaan meratakan null ke None luar.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Satu file dari form multipart, sudah berada di memori.
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Baca seluruh form multipart: field `file` menjadi `UploadedFile`,
/// field teks lain masuk ke map. Ukuran file dibatasi sebelum ada
/// penulisan ke penyimpanan mana pun.
pub async fn read_multipart(
    payload: &mut Multipart,
) -> Result<(Option<UploadedFile>, HashMap<String, String>), Error> {
    let mut file: Option<UploadedFile> = None;
    let mut fields = HashMap::new();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ErrorBadRequest(format!("Gagal membaca multipart: {}", e)))?
    {
        let cd = field.content_disposition().cloned();
        let field_name = cd
            .as_ref()
            .and_then(|d| d.get_name())
            .unwrap_or_default()
            .to_string();
        let filename = cd.as_ref().and_then(|d| d.get_filename().map(|s| s.to_string()));

        if field_name == "file" {
            let content_type = field
                .content_type()
                .map(|ct| ct.to_string())
                .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
            let mut data = Vec::new();
            while let Some(chunk) = field
                .try_next()
                .await
                .map_err(|e| ErrorBadRequest(format!("Gagal membaca file: {}", e)))?
            {
                if data.len() + chunk.len() > MAX_FILE_SIZE {
                    return Err(ErrorBadRequest("File terlalu besar. Maksimal 10MB"));
                }
                data.extend_from_slice(&chunk);
            }
            file = Some(UploadedFile {
                filename: filename.unwrap_or_else(|| "file".to_string()),
                content_type,
                data,
            });
        } else {
            let mut bytes = Vec::new();
            while let Some(chunk) = field
                .try_next()
                .await
                .map_err(|e| ErrorBadRequest(format!("Gagal membaca field: {}", e)))?
            {
                bytes.extend_from_slice(&chunk);
            }
            let text = String::from_utf8(bytes)
                .map_err(|e| ErrorBadRequest(format!("Field bukan UTF-8: {}", e)))?;
            fields.insert(field_name, text.trim().to_string());
        }
    }

    Ok((file, fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_math() {
        let p = paginate(25, 1, 10);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_more);

        let p = paginate(25, 3, 10);
        assert_eq!(p.total_pages, 3);
        assert!(!p.has_more);

        // pas di batas halaman
        let p = paginate(30, 2, 10);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_more);
    }

    #[test]
    fn pagination_empty_result() {
        let p = paginate(0, 1, 10);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_more);
    }

    #[test]
    fn has_more_equals_page_lt_total_pages() {
        for total in [0i64, 1, 9, 10, 11, 55] {
            for page in 1u32..=7 {
                let p = paginate(total, page, 10);
                assert_eq!(p.has_more, page < p.total_pages);
            }
        }
    }

    #[test]
    fn page_params_defaults_and_clamps() {
        let q = PageQuery {
            page: None,
            limit: None,
        };
        assert_eq!(page_params(&q, 20), (1, 20, 0));

        let q = PageQuery {
            page: Some(0),
            limit: Some(500),
        };
        assert_eq!(page_params(&q, 20), (1, 100, 0));

        let q = PageQuery {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(page_params(&q, 20), (3, 10, 20));
    }

    #[test]
    fn double_option_distinguishes_null_from_absent() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "double_option")]
            foto_url: Option<Option<String>>,
        }

        let absent: Patch = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(absent.foto_url, None);

        let cleared: Patch = serde_json::from_str(r#"{"foto_url": null}"#).unwrap();
        assert_eq!(cleared.foto_url, Some(None));

        let set: Patch = serde_json::from_str(r#"{"foto_url": "/uploads/structure/a.jpg"}"#).unwrap();
        assert_eq!(
            set.foto_url,
            Some(Some("/uploads/structure/a.jpg".to_string()))
        );
    }

    #[test]
    fn short_search_is_ignored() {
        assert_eq!(search_keyword(None), None);
        assert_eq!(search_keyword(Some("")), None);
        assert_eq!(search_keyword(Some("ab")), None);
        assert_eq!(search_keyword(Some("  ab  ")), None);
        assert_eq!(search_keyword(Some("abc")), Some("abc".to_string()));
        assert_eq!(search_keyword(Some(" kacang ")), Some("kacang".to_string()));
    }
}
