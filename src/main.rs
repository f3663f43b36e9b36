// main.rs
use actix_cors::Cors;
use actix_files::Files;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::web::JsonConfig;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;

mod auth;
mod controllers;
mod db;
mod models;
mod storage;
mod utils;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("starting up...");

    let pool = match db::establish_connection().await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Gagal inisialisasi pool database: {:?}", e);
            std::process::exit(1);
        }
    };

    // actix-files menolak direktori yang belum ada
    std::fs::create_dir_all("./uploads")?;
    let file_storage = web::Data::new(storage::Storage::from_env().await);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let frontend_origin =
        std::env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .supports_credentials()
            .max_age(3600);

        let json_config = JsonConfig::default()
            .limit(10 * 1024 * 1024) // body berisi HTML editor bisa besar
            .error_handler(|err, _req| {
                log::error!("JSON payload error: {}", err);
                actix_web::error::ErrorBadRequest(format!("Payload error: {}", err))
            });

        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(file_storage.clone())
            .app_data(json_config)
            .wrap(cors)
            .wrap(Logger::default())
            .service(Files::new("/uploads", "./uploads"))
            //auth
            .service(controllers::auth_controller::login)
            .service(controllers::auth_controller::logout)
            .service(controllers::auth_controller::me)
            //public
            .service(controllers::home_controller::get_posts)
            .service(controllers::home_controller::get_post_detail)
            .service(controllers::home_controller::get_gallery)
            .service(controllers::home_controller::get_potentials)
            .service(controllers::home_controller::get_settings)
            .service(controllers::home_controller::get_profile)
            .service(controllers::home_controller::get_structure)
            //posts
            .service(controllers::post_controller::list_posts)
            .service(controllers::post_controller::create_post)
            .service(controllers::post_controller::get_post)
            .service(controllers::post_controller::update_post)
            .service(controllers::post_controller::delete_post)
            //gallery
            .service(controllers::gallery_controller::list_gallery)
            .service(controllers::gallery_controller::create_gallery_item)
            .service(controllers::gallery_controller::update_gallery_item)
            .service(controllers::gallery_controller::delete_gallery_item)
            //potentials
            .service(controllers::upload_controller::upload_potential_image)
            .service(controllers::potential_controller::list_potentials)
            .service(controllers::potential_controller::create_potential)
            .service(controllers::potential_controller::get_potential)
            .service(controllers::potential_controller::update_potential)
            .service(controllers::potential_controller::delete_potential)
            //settings & profil
            .service(controllers::setting_controller::upload_banner)
            .service(controllers::setting_controller::delete_banner)
            .service(controllers::setting_controller::get_settings)
            .service(controllers::setting_controller::save_settings)
            .service(controllers::setting_controller::get_profile)
            .service(controllers::setting_controller::save_profile)
            //struktur organisasi: path literal harus terdaftar sebelum {id}
            .service(controllers::structure_controller::get_metadata)
            .service(controllers::structure_controller::publish_structure)
            .service(controllers::structure_controller::upload_member_photo)
            .service(controllers::structure_controller::list_members)
            .service(controllers::structure_controller::create_member)
            .service(controllers::structure_controller::duplicate_member)
            .service(controllers::structure_controller::get_member)
            .service(controllers::structure_controller::update_member)
            .service(controllers::structure_controller::delete_member)
            //users
            .service(controllers::user_controller::list_users)
            .service(controllers::user_controller::create_user)
            .service(controllers::user_controller::get_user)
            .service(controllers::user_controller::update_user)
            .service(controllers::user_controller::delete_user)
            //upload umum
            .service(controllers::upload_controller::upload_file)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
