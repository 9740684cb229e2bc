use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use gambit_backend::routes;

use crate::common::json_body;
use crate::support::app::test_app;

#[actix_web::test]
async fn health_reports_store_and_queue() {
    let app_state = test_app().await.state;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["db"], "n/a");
    assert_eq!(body["dead_letters"], 0);
    assert!(body["app_version"].as_str().is_some());
}
