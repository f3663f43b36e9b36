use serde::Serialize;
use sqlx::prelude::FromRow;
use std::collections::BTreeMap;

/// Baris key/value. Dipakai tabel `settings` (angka penduduk, kontak,
/// banner per halaman) maupun `profile_info` (visi, misi, sejarah).
#[derive(Serialize, FromRow, Debug)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Reduksi baris menjadi map datar key -> value untuk response JSON.
pub fn rows_to_map(rows: Vec<KeyValue>) -> BTreeMap<String, String> {
    rows.into_iter().map(|r| (r.key, r.value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_reduce_to_flat_map() {
        let rows = vec![
            KeyValue {
                key: "jumlahPenduduk".into(),
                value: "12345".into(),
            },
            KeyValue {
                key: "heroImage".into(),
                value: "/uploads/banners/hero.jpg".into(),
            },
        ];
        let map = rows_to_map(rows);
        assert_eq!(map.len(), 2);
        assert_eq!(map["jumlahPenduduk"], "12345");
        assert_eq!(map["heroImage"], "/uploads/banners/hero.jpg");
    }
}
