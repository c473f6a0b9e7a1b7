//! Request handler definitions
//!
//! The server is headless. The only route is a liveness check. The background workers do the actual work.
use actix_web::{get, HttpResponse, Responder};
use log::*;

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

#[cfg(test)]
mod test {
    use actix_web::{body::to_bytes, http::StatusCode, test, App};

    use super::*;

    #[actix_web::test]
    async fn health_check() {
        let app = test::init_service(App::new().service(health)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body, "👍️\n");
    }
}
