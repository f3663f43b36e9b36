// Seed akun admin pertama. Jalankan: cargo run --bin create_admin
use bcrypt::DEFAULT_COST;
use dotenv::dotenv;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@kelurahan.go.id".to_string());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            log::error!("DATABASE_URL tidak ditemukan di .env");
            std::process::exit(1);
        }
    };

    let pool = match sqlx::mysql::MySqlPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Gagal konek database: {:?}", e);
            std::process::exit(1);
        }
    };

    let existing: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&pool)
        .await
        .unwrap_or_else(|e| {
            log::error!("Gagal cek user: {:?}", e);
            std::process::exit(1);
        });

    if existing.is_some() {
        log::warn!("User admin {} sudah ada, tidak ada yang dibuat", email);
        return;
    }

    let hashed = match bcrypt::hash(&password, DEFAULT_COST) {
        Ok(h) => h,
        Err(e) => {
            log::error!("Gagal hash password: {:?}", e);
            std::process::exit(1);
        }
    };

    let id = Uuid::new_v4().to_string();
    if let Err(e) = sqlx::query("INSERT INTO users (id, email, password) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(&email)
        .bind(&hashed)
        .execute(&pool)
        .await
    {
        log::error!("Gagal membuat user admin: {:?}", e);
        std::process::exit(1);
    }

    log::info!("User admin berhasil dibuat: {}", email);
    log::warn!("Segera ganti password setelah login pertama!");
}
