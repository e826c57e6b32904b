//! HTTP surface. Handlers are thin: they unpack the request, call into `registry` or
//! `aggregation` with the caller's identity, and shape the JSON reply.

pub mod auth;
pub mod device;
pub mod extract;
pub mod middleware;
pub mod paddock;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Extension, Router,
};
use sea_orm::DatabaseConnection;

use crate::config::SessionConfig;

async fn health_check() -> &'static str {
    "Server is Up"
}

/// Every route the service answers. Observability layers are added by the binary.
pub fn router(db: DatabaseConnection, session_config: Arc<SessionConfig>) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/token", post(auth::token));

    let protected_routes = Router::new()
        .route("/device/view/:node_id/:data_t", get(device::view_readings))
        .route("/device/register", post(device::register_device))
        .route("/device/unlink/:node_id", patch(device::unlink_device))
        .route("/device/:node_id", patch(device::rename_device))
        .route("/paddock/create", post(paddock::create_paddock))
        .route("/paddock/list", get(paddock::list_paddocks))
        .route(
            "/paddock/:paddock_id",
            get(paddock::get_paddock)
                .patch(paddock::update_paddock)
                .delete(paddock::delete_paddock),
        )
        .route("/paddock/:paddock_id/devices", get(paddock::list_paddock_devices))
        .route("/paddock/:paddock_id/sensor-averages", get(paddock::sensor_averages))
        .route_layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/", get(health_check))
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(Extension(db))
        .layer(Extension(session_config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session;
    use crate::test_utils::{
        insert_capture, insert_node, insert_reading, insert_user_with_password, setup_db,
        test_session_config, TEST_PASSWORD,
    };
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use sea_orm::EntityTrait;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        db: DatabaseConnection,
        session: Arc<SessionConfig>,
    }

    impl TestApp {
        async fn new() -> Self {
            Self {
                db: setup_db().await,
                session: Arc::new(test_session_config()),
            }
        }

        async fn send(&self, request: Request<Body>) -> Response {
            router(self.db.clone(), self.session.clone())
                .oneshot(request)
                .await
                .unwrap()
        }

        fn token_for(&self, user_id: &str) -> String {
            session::issue(user_id, &self.session).unwrap()
        }
    }

    fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    fn form_request(uri: &str, username: &str, password: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!(
                "username={}&password={password}",
                username.replace('@', "%40")
            )))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_check_is_public() {
        let app = TestApp::new().await;
        let response = app
            .send(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Server is Up");
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token() {
        let app = TestApp::new().await;

        let missing = app
            .send(Request::builder().uri("/paddock/list").body(Body::empty()).unwrap())
            .await;
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(missing.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
        let body = body_json(missing).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Could not validate credentials");

        let garbage = app.send(get_request("/paddock/list", "not-a-token")).await;
        assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

        // Signed correctly, but nobody by that id exists.
        let ghost = app.token_for("ghost@farm.io");
        let unknown = app.send(get_request("/paddock/list", &ghost)).await;
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_validates_and_rejects_duplicates() {
        let app = TestApp::new().await;
        let payload = json!({
            "user_id": "grower@farm.io",
            "first_name": "Ada",
            "last_name": "Grower",
            "password": "hunter22",
        });

        let created = app
            .send(json_request(Method::POST, "/auth/register", None, payload.clone()))
            .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(body_json(created).await["success"], true);

        // The user row exists as soon as the response does.
        let stored = crate::entities::user::Entity::find_by_id("grower@farm.io")
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert!(crate::auth::password::verify("hunter22", &stored.password_hash));

        let duplicate = app
            .send(json_request(Method::POST, "/auth/register", None, payload))
            .await;
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let blank_name = app
            .send(json_request(
                Method::POST,
                "/auth/register",
                None,
                json!({"user_id": "x@farm.io", "first_name": " ", "last_name": "Y", "password": "pw"}),
            ))
            .await;
        assert_eq!(blank_name.status(), StatusCode::BAD_REQUEST);

        let bad_email = app
            .send(json_request(
                Method::POST,
                "/auth/register",
                None,
                json!({"user_id": "not-an-email", "first_name": "X", "last_name": "Y", "password": "pw"}),
            ))
            .await;
        assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_and_token_endpoints_issue_usable_tokens() {
        let app = TestApp::new().await;
        insert_user_with_password(&app.db, "grower@farm.io").await;

        let login = app
            .send(form_request("/auth/login", "grower@farm.io", TEST_PASSWORD))
            .await;
        assert_eq!(login.status(), StatusCode::OK);
        let body = body_json(login).await;
        assert_eq!(body["success"], true);
        let token = body["data"]["access_token"].as_str().unwrap().to_string();

        let listed = app.send(get_request("/paddock/list", &token)).await;
        assert_eq!(listed.status(), StatusCode::OK);

        let oauth = app
            .send(form_request("/auth/token", "grower@farm.io", TEST_PASSWORD))
            .await;
        assert_eq!(oauth.status(), StatusCode::OK);
        let body = body_json(oauth).await;
        assert_eq!(body["token_type"], "bearer");
        assert!(body["access_token"].is_string());

        let wrong = app
            .send(form_request("/auth/login", "grower@farm.io", "wrong-password"))
            .await;
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(wrong).await["message"], "Invalid email or password");

        let unknown = app
            .send(form_request("/auth/token", "nobody@farm.io", TEST_PASSWORD))
            .await;
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn paddock_device_and_aggregate_flow() {
        let app = TestApp::new().await;
        crate::test_utils::insert_user(&app.db, "a@farm.io").await;
        crate::test_utils::insert_user(&app.db, "b@farm.io").await;
        let token_a = app.token_for("a@farm.io");
        let token_b = app.token_for("b@farm.io");

        let created = app
            .send(json_request(
                Method::POST,
                "/paddock/create",
                Some(&token_a),
                json!({"paddock_name": "North", "crop_type": "Grains", "area": 12.5}),
            ))
            .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let paddock_id = body_json(created).await["paddock"]["paddock_id"].as_i64().unwrap();

        let empty = body_json(
            app.send(get_request(&format!("/paddock/{paddock_id}/sensor-averages"), &token_a))
                .await,
        )
        .await;
        assert_eq!(empty["nodes_count"], 0);
        assert_eq!(empty["message"], "No nodes found in this paddock");

        insert_node(&app.db, "AAA001").await;
        insert_node(&app.db, "AAA002").await;
        for node_id in ["AAA001", "AAA002"] {
            let claimed = app
                .send(json_request(
                    Method::POST,
                    "/device/register",
                    Some(&token_a),
                    json!({"node_id": node_id, "paddock_id": paddock_id}),
                ))
                .await;
            assert_eq!(claimed.status(), StatusCode::OK);
        }

        let stolen = app
            .send(json_request(
                Method::POST,
                "/device/register",
                Some(&token_b),
                json!({"node_id": "AAA001", "paddock_id": paddock_id}),
            ))
            .await;
        assert_eq!(stolen.status(), StatusCode::CONFLICT);

        let c1 = insert_capture(&app.db).await;
        let c2 = insert_capture(&app.db).await;
        insert_reading(&app.db, c1, "AAA001", "temperature", 30.0).await;
        insert_reading(&app.db, c2, "AAA001", "temperature", 20.0).await;
        insert_reading(&app.db, c1, "AAA002", "temperature", 25.0).await;

        let averages = app
            .send(get_request(&format!("/paddock/{paddock_id}/sensor-averages"), &token_a))
            .await;
        assert_eq!(averages.status(), StatusCode::OK);
        let body = body_json(averages).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["nodes_count"], 2);
        assert_eq!(body["nodes_with_readings"], 2);
        assert_eq!(body["sensor_averages"]["temperature"], 22.5);
        assert_eq!(body["sensor_details"]["temperature"]["min"], 20.0);
        assert_eq!(body["sensor_details"]["temperature"]["count"], 2);

        let readings = app
            .send(get_request("/device/view/AAA001/temperature", &token_a))
            .await;
        assert_eq!(readings.status(), StatusCode::OK);
        assert_eq!(body_json(readings).await["readings"].as_array().unwrap().len(), 2);

        let forbidden = app
            .send(get_request("/device/view/AAA001/temperature", &token_b))
            .await;
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        assert!(body_json(forbidden).await.get("readings").is_none());

        let foreign = app
            .send(get_request(&format!("/paddock/{paddock_id}"), &token_b))
            .await;
        assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

        let devices = body_json(
            app.send(get_request(&format!("/paddock/{paddock_id}/devices"), &token_a))
                .await,
        )
        .await;
        assert_eq!(devices["count"], 2);

        let deleted = app
            .send(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(format!("/paddock/{paddock_id}"))
                    .header(header::AUTHORIZATION, format!("Bearer {token_a}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(deleted.status(), StatusCode::OK);
        assert_eq!(body_json(deleted).await["devices_unlinked"], 2);

        let listed = body_json(app.send(get_request("/paddock/list", &token_a)).await).await;
        assert_eq!(listed["count"], 0);
    }

    #[tokio::test]
    async fn device_rename_and_unlink_routes() {
        let app = TestApp::new().await;
        crate::test_utils::insert_user(&app.db, "a@farm.io").await;
        let token = app.token_for("a@farm.io");
        let paddock = crate::registry::paddocks::create(&app.db, "a@farm.io", Default::default())
            .await
            .unwrap();
        crate::test_utils::claimed_node(&app.db, "AAA001", "a@farm.io", paddock.id).await;

        let renamed = app
            .send(json_request(
                Method::PATCH,
                "/device/AAA001",
                Some(&token),
                json!({"node_name": "Dam"}),
            ))
            .await;
        assert_eq!(renamed.status(), StatusCode::OK);
        assert_eq!(body_json(renamed).await["node"]["node_name"], "Dam");

        let unlinked = app
            .send(json_request(Method::PATCH, "/device/unlink/AAA001", Some(&token), json!({})))
            .await;
        assert_eq!(unlinked.status(), StatusCode::OK);

        // No longer the owner.
        let again = app
            .send(json_request(Method::PATCH, "/device/unlink/AAA001", Some(&token), json!({})))
            .await;
        assert_eq!(again.status(), StatusCode::FORBIDDEN);

        let missing = app
            .send(json_request(Method::PATCH, "/device/unlink/NOPE00", Some(&token), json!({})))
            .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_requests_get_json_error_bodies() {
        let app = TestApp::new().await;
        crate::test_utils::insert_user(&app.db, "a@farm.io").await;
        let token = app.token_for("a@farm.io");

        let no_first_name = app
            .send(json_request(
                Method::POST,
                "/auth/register",
                None,
                json!({"user_id": "x@farm.io", "last_name": "Y", "password": "pw"}),
            ))
            .await;
        assert_eq!(no_first_name.status(), StatusCode::BAD_REQUEST);
        let body = body_json(no_first_name).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("first_name"));

        let bad_id = app.send(get_request("/paddock/abc", &token)).await;
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
        let body = body_json(bad_id).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());

        let no_password = app
            .send(
                Request::builder()
                    .method(Method::POST)
                    .uri("/auth/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("username=a%40farm.io"))
                    .unwrap(),
            )
            .await;
        assert_eq!(no_password.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(no_password).await["success"], false);

        let not_json = app
            .send(
                Request::builder()
                    .method(Method::POST)
                    .uri("/paddock/create")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await;
        assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(not_json).await["success"], false);
    }
}
