use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    get, post, web, Error, HttpRequest, HttpResponse, Responder, Result,
};
use bcrypt::verify;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;

use crate::auth;
use crate::models::user::User;

#[derive(Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[post("/api/login")]
pub async fn login(
    pool: web::Data<MySqlPool>,
    payload: web::Json<LoginPayload>,
) -> Result<impl Responder, Error> {
    let email = payload.email.trim().to_lowercase();
    let password = payload.password.trim();

    if email.is_empty() || password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false, "message": "Email atau password kosong"
        })));
    }

    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password, created_at, updated_at FROM users WHERE email = ? LIMIT 1",
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        log::error!("DB error get user: {:?}", e);
        actix_web::error::ErrorInternalServerError("DB error")
    })?
    .ok_or_else(|| actix_web::error::ErrorUnauthorized("Kredensial tidak valid"))?;

    let ok = verify(password, &user.password).map_err(|e| {
        log::error!("bcrypt verify: {:?}", e);
        actix_web::error::ErrorInternalServerError("Verify error")
    })?;

    if !ok {
        return Err(actix_web::error::ErrorUnauthorized("Kredensial tidak valid"));
    }

    let token = auth::generate_jwt(&user).map_err(|e| {
        log::error!("Gagal menghasilkan JWT: {:?}", e);
        actix_web::error::ErrorInternalServerError("Gagal menghasilkan token")
    })?;

    let access_cookie = Cookie::build("access_token", token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(2))
        .finish();

    Ok(HttpResponse::Ok().cookie(access_cookie).json(json!({
        "message": "Berhasil login",
        "user": { "id": user.id, "email": user.email },
    })))
}

#[post("/api/logout")]
pub async fn logout() -> Result<impl Responder, Error> {
    // Cookie harus dibangun persis seperti saat login agar browser menimpanya
    let access_cookie = Cookie::build("access_token", "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(0))
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(access_cookie)
        .json(json!({ "message": "Berhasil logout" })))
}

#[get("/api/me")]
pub async fn me(req: HttpRequest, pool: web::Data<MySqlPool>) -> Result<impl Responder, Error> {
    let claims = auth::verify_jwt(&req)?;

    let user = sqlx::query_as::<_, crate::models::user::PublicUser>(
        "SELECT id, email, created_at, updated_at FROM users WHERE id = ? LIMIT 1",
    )
    .bind(&claims.user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?
    .ok_or_else(|| actix_web::error::ErrorUnauthorized("Akun sudah tidak ada"))?;

    Ok(HttpResponse::Ok().json(user))
}
