use actix_web::HttpRequest;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::user::User;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub user_id: String,
    pub exp: usize,
}

pub fn generate_jwt(user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let now = Utc::now();
    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id.clone(),
        exp: (now + chrono::Duration::days(2)).timestamp() as usize,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn verify_jwt(req: &HttpRequest) -> Result<Claims, actix_web::Error> {
    let token = req
        .cookie("access_token")
        .ok_or_else(|| {
            log::debug!("No access_token cookie found in request to {}", req.path());
            actix_web::error::ErrorUnauthorized("Token tidak ditemukan")
        })?
        .value()
        .to_string();

    let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        log::debug!("JWT verification failed: {:?}", e);
        actix_web::error::ErrorUnauthorized("Sesi tidak valid atau kedaluwarsa")
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn sample_user() -> User {
        User {
            id: "u-1".to_string(),
            email: "admin@kelurahan.go.id".to_string(),
            password: "$2b$10$hash".to_string(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn jwt_roundtrip() {
        std::env::set_var("JWT_SECRET", "secret-untuk-test");
        let token = generate_jwt(&sample_user()).unwrap();

        let req = TestRequest::default()
            .cookie(actix_web::cookie::Cookie::new("access_token", token))
            .to_http_request();
        let claims = verify_jwt(&req).unwrap();
        assert_eq!(claims.sub, "admin@kelurahan.go.id");
        assert_eq!(claims.user_id, "u-1");
    }

    #[test]
    fn missing_cookie_is_rejected() {
        std::env::set_var("JWT_SECRET", "secret-untuk-test");
        let req = TestRequest::default().to_http_request();
        assert!(verify_jwt(&req).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        std::env::set_var("JWT_SECRET", "secret-untuk-test");
        let req = TestRequest::default()
            .cookie(actix_web::cookie::Cookie::new("access_token", "bukan.jwt.valid"))
            .to_http_request();
        assert!(verify_jwt(&req).is_err());
    }
}
