use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::prelude::FromRow;

/// Anggota bagan organisasi pada tabel draft. Posisi (0,0) berarti belum
/// pernah ditata; kanvas admin menjalankan auto-layout saat SEMUA anggota
/// masih di (0,0) lalu menyimpan hasilnya lewat endpoint patch.
#[derive(Serialize, FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StructureMember {
    pub id: String,
    pub jabatan: String,
    pub nama: String,
    pub nip: Option<String>,
    pub foto_url: Option<String>,
    pub position_x: f64,
    pub position_y: f64,
    pub parent_id: Option<String>,
    pub urutan: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Snapshot yang dibaca halaman publik. Hanya ditulis oleh aksi publish.
#[derive(Serialize, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublishedMember {
    pub id: String,
    pub jabatan: String,
    pub nama: String,
    pub nip: Option<String>,
    pub foto_url: Option<String>,
    pub position_x: f64,
    pub position_y: f64,
    pub parent_id: Option<String>,
    pub urutan: i32,
}

#[derive(Serialize, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StructureMetadata {
    pub has_unpublished: bool,
    pub last_published_at: Option<NaiveDateTime>,
}

/// Nama hasil salin/duplikasi node.
pub fn copy_name(nama: &str) -> String {
    format!("{} (Copy)", nama)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_suffix() {
        assert_eq!(copy_name("Lurah"), "Lurah (Copy)");
        assert_eq!(copy_name("Lurah (Copy)"), "Lurah (Copy) (Copy)");
    }
}
