pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::admin::handlers as admin;
use crate::chat::handlers as chat;
use crate::discussions::handlers as discussions;
use crate::errors::capture_server_errors;
use crate::profiles::handlers as profiles;
use crate::referrals::handlers as referrals;
use crate::referrals::rate_limit::enforce_referral_limit;
use crate::resume::extract::RESUME_MAX_BYTES;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profiles
        .route("/api/students", post(profiles::handle_create_student))
        .route(
            "/api/students/:id",
            get(profiles::handle_get_student).put(profiles::handle_update_student),
        )
        .route("/api/alumni", post(profiles::handle_create_alumni))
        .route("/api/alumni/search", get(profiles::handle_search_alumni))
        .route(
            "/api/alumni/:id",
            get(profiles::handle_get_alumni).put(profiles::handle_update_alumni),
        )
        // Referrals
        .route(
            "/api/referrals",
            post(referrals::handle_send_referral).route_layer(middleware::from_fn_with_state(
                state.clone(),
                enforce_referral_limit,
            )),
        )
        .route("/api/referrals/sent", get(referrals::handle_list_sent))
        .route("/api/referrals/received", get(referrals::handle_list_received))
        .route("/api/referrals/:id/respond", post(referrals::handle_respond))
        // Discussions
        .route(
            "/api/discussions",
            get(discussions::handle_list_discussions).post(discussions::handle_create_discussion),
        )
        .route("/api/discussions/:id", get(discussions::handle_get_discussion))
        // Admin
        .route(
            "/api/admin/profile/:id/verify",
            post(admin::handle_verify_profile),
        )
        .route("/api/admin/pending", get(admin::handle_list_pending))
        .route(
            "/api/admin/error-logs",
            get(admin::handle_error_logs).post(admin::handle_report_error),
        )
        .route("/api/admin/stats", get(admin::handle_stats))
        // Chat
        .route("/api/chat/room", get(chat::handle_room_id))
        .route("/ws/chat", get(chat::handle_chat_socket))
        // Resume
        .route(
            "/api/resume/analyze",
            post(resume::handle_analyze_resume).layer(DefaultBodyLimit::max(RESUME_MAX_BYTES)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            capture_server_errors,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::errors::AppError;

    struct Caller {
        id: Uuid,
        role: &'static str,
        email: Option<&'static str>,
    }

    impl Caller {
        fn new(role: &'static str, email: Option<&'static str>) -> Self {
            Self {
                id: Uuid::new_v4(),
                role,
                email,
            }
        }
    }

    fn test_state() -> AppState {
        let config = Config::from_lookup(|key| match key {
            "STORAGE_BACKEND" => Some("memory".to_string()),
            _ => None,
        })
        .unwrap();
        AppState::in_memory(config, None)
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        caller: Option<&Caller>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder
                .header("x-user-id", caller.id.to_string())
                .header("x-user-role", caller.role);
            if let Some(email) = caller.email {
                builder = builder.header("x-user-email", email);
            }
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create_alumni(app: &Router, caller: &Caller, company: &str, year: i32) -> Value {
        create_alumni_with_package(app, caller, company, year, 32.5).await
    }

    async fn create_alumni_with_package(
        app: &Router,
        caller: &Caller,
        company: &str,
        year: i32,
        package_lpa: f64,
    ) -> Value {
        let (status, body) = call(
            app,
            "POST",
            "/api/alumni",
            Some(caller),
            Some(json!({
                "name": format!("{company} alum"),
                "email": caller.email.unwrap_or("alum@example.com"),
                "company": company,
                "designation": "SDE II",
                "graduationYear": year,
                "packageLPA": package_lpa
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    async fn verify(app: &Router, admin: &Caller, id: &str) -> (StatusCode, Value) {
        call(
            app,
            "POST",
            &format!("/api/admin/profile/{id}/verify"),
            Some(admin),
            Some(json!({"approve": true})),
        )
        .await
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state());
        let (status, body) = call(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "alumnet-api");
        assert_eq!(body["storage"], "memory");
        assert_eq!(body["resumeScorer"], "mock");
        assert_eq!(body["referralDailyLimit"], 3);
    }

    #[tokio::test]
    async fn test_search_returns_only_verified_matches() {
        let app = build_router(test_state());
        let admin = Caller::new("admin", None);
        let amazon = Caller::new("alumni", Some("a@amazon.com"));
        let google = Caller::new("alumni", Some("g@google.com"));
        create_alumni(&app, &amazon, "Amazon", 2019).await;
        create_alumni(&app, &google, "Google", 2019).await;

        let uri = "/api/alumni/search?company=amazon&graduationYear=2019";
        let (_, before) = call(&app, "GET", uri, None, None).await;
        assert_eq!(before.as_array().unwrap().len(), 0);

        verify(&app, &admin, &amazon.id.to_string()).await;
        verify(&app, &admin, &google.id.to_string()).await;

        let (status, found) = call(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        let found = found.as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["company"], "Amazon");
        assert_eq!(found[0]["isVerified"], true);
    }

    #[tokio::test]
    async fn test_min_package_is_inclusive_lower_bound() {
        let app = build_router(test_state());
        let admin = Caller::new("admin", None);
        for (email, package) in [("a@x.com", 8.0), ("b@x.com", 10.0), ("c@x.com", 24.0)] {
            let alum = Caller::new("alumni", Some(email));
            create_alumni_with_package(&app, &alum, "X Labs", 2021, package).await;
            verify(&app, &admin, &alum.id.to_string()).await;
        }

        let (status, found) = call(&app, "GET", "/api/alumni/search?minPackage=10", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let packages: Vec<f64> = found
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["packageLPA"].as_f64().unwrap())
            .collect();
        assert_eq!(packages.len(), 2);
        assert!(packages.iter().all(|p| *p >= 10.0));
    }

    #[tokio::test]
    async fn test_search_rejects_non_numeric_year() {
        let app = build_router(test_state());
        let (status, body) = call(
            &app,
            "GET",
            "/api/alumni/search?graduationYear=soon",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_verify_is_idempotent_and_404s_on_unknown() {
        let app = build_router(test_state());
        let admin = Caller::new("admin", None);
        let alum = Caller::new("alumni", Some("x@corp.com"));
        create_alumni(&app, &alum, "Corp", 2020).await;

        for _ in 0..2 {
            let (status, body) = verify(&app, &admin, &alum.id.to_string()).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"success": true}));
        }

        let (status, _) = verify(&app, &admin, &Uuid::new_v4().to_string()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin_role() {
        let app = build_router(test_state());
        let student = Caller::new("student", None);
        for uri in ["/api/admin/pending", "/api/admin/error-logs", "/api/admin/stats"] {
            let (status, _) = call(&app, "GET", uri, Some(&student), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        }
        let (status, _) = verify(&app, &student, &Uuid::new_v4().to_string()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_referral_lifecycle() {
        let app = build_router(test_state());
        let student = Caller::new("student", Some("s@college.edu"));
        let alum = Caller::new("alumni", Some("alum@amazon.com"));
        let stranger = Caller::new("alumni", Some("other@amazon.com"));

        let (status, created) = call(
            &app,
            "POST",
            "/api/referrals",
            Some(&student),
            Some(json!({"toEmail": "Alum@Amazon.com", "message": "Could you refer me for SDE-1?"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        assert_eq!(created["toEmail"], "alum@amazon.com");
        let respond_uri = format!("/api/referrals/{}/respond", created["id"].as_str().unwrap());

        let (_, received) = call(&app, "GET", "/api/referrals/received", Some(&alum), None).await;
        assert_eq!(received.as_array().unwrap().len(), 1);

        let (status, _) = call(
            &app,
            "POST",
            &respond_uri,
            Some(&alum),
            Some(json!({"action": "maybe"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            "POST",
            &respond_uri,
            Some(&stranger),
            Some(json!({"action": "accepted"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, updated) = call(
            &app,
            "POST",
            &respond_uri,
            Some(&alum),
            Some(json!({"action": "accepted"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "accepted");

        let (status, _) = call(
            &app,
            "POST",
            &respond_uri,
            Some(&alum),
            Some(json!({"action": "rejected"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, sent) = call(&app, "GET", "/api/referrals/sent", Some(&student), None).await;
        assert_eq!(sent[0]["status"], "accepted");
    }

    #[tokio::test]
    async fn test_referral_requires_identity() {
        let app = build_router(test_state());
        let (status, body) = call(
            &app,
            "POST",
            "/api/referrals",
            None,
            Some(json!({"toEmail": "a@b.com", "message": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_fourth_referral_in_a_day_is_rate_limited() {
        let app = build_router(test_state());
        let student = Caller::new("student", None);
        let other = Caller::new("student", None);
        let body = json!({"toEmail": "alum@amazon.com", "message": "Referral please"});

        for _ in 0..3 {
            let (status, _) =
                call(&app, "POST", "/api/referrals", Some(&student), Some(body.clone())).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let (status, error) =
            call(&app, "POST", "/api/referrals", Some(&student), Some(body.clone())).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(error["error"]["code"], "RATE_LIMITED");

        let (status, _) = call(&app, "POST", "/api/referrals", Some(&other), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_discussions_create_and_filter() {
        let app = build_router(test_state());
        let author = Caller::new("student", None);
        for (title, category) in [("OA tips", "Interviews"), ("GATE or job?", "Higher Studies")] {
            let (status, _) = call(
                &app,
                "POST",
                "/api/discussions",
                Some(&author),
                Some(json!({"title": title, "body": "Thoughts?", "category": category, "tags": ["Prep"]})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, found) = call(
            &app,
            "GET",
            "/api/discussions?category=interviews",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let found = found.as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["title"], "OA tips");
        assert_eq!(found[0]["tags"], json!(["prep"]));

        let (status, tagged) = call(&app, "GET", "/api/discussions?tag=Prep", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tagged.as_array().unwrap().len(), 2);

        let (status, _) = call(
            &app,
            "GET",
            &format!("/api/discussions/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stats_and_client_error_reports() {
        let app = build_router(test_state());
        let admin = Caller::new("admin", None);
        let student = Caller::new("student", None);

        let (status, _) = call(
            &app,
            "POST",
            "/api/admin/error-logs",
            Some(&student),
            Some(json!({"type": "client", "detail": "chat socket dropped"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, logs) = call(&app, "GET", "/api/admin/error-logs", Some(&admin), None).await;
        assert_eq!(logs[0]["type"], "client");

        let alum = Caller::new("alumni", Some("p@corp.com"));
        create_alumni(&app, &alum, "Corp", 2018).await;
        let (status, stats) = call(&app, "GET", "/api/admin/stats", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["alumni"], 1);
        assert_eq!(stats["pendingAlumni"], 1);
        assert_eq!(stats["errorLogs"], 1);
    }

    #[tokio::test]
    async fn test_chat_room_id_is_order_independent() {
        let app = build_router(test_state());
        let (status, body) = call(&app, "GET", "/api/chat/room?userA=bob&userB=alice", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roomId"], "alice_bob");

        let (status, _) = call(&app, "GET", "/api/chat/room?userA=bob", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let boundary = "alumnet-test-boundary";
        let mut body = String::new();
        for (name, filename, content) in parts {
            body.push_str(&format!("--{boundary}\r\n"));
            match filename {
                Some(filename) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{boundary}--\r\n"));

        Request::builder()
            .method("POST")
            .uri("/api/resume/analyze")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_resume_analyze_returns_mock_report() {
        let app = build_router(test_state());
        let request = multipart_request(&[
            ("resume", Some("resume.txt"), "EXPERIENCE\n- Shipped 4 services"),
            ("jobDescription", None, "Rust backend engineer"),
        ]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let report: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(report["overallScore"], 78);
        assert_eq!(report["scorerBackend"], "mock");
    }

    #[tokio::test]
    async fn test_resume_analyze_requires_file() {
        let app = build_router(test_state());
        let request = multipart_request(&[("jobDescription", None, "Rust backend engineer")]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_server_errors_are_appended_to_error_log() {
        let state = test_state();
        let app = Router::new()
            .route(
                "/boom",
                get(|| async { Err::<(), _>(AppError::Internal(anyhow::anyhow!("disk full"))) }),
            )
            .layer(middleware::from_fn_with_state(
                state.clone(),
                capture_server_errors,
            ))
            .with_state(state.clone());

        let (status, body) = call(&app, "GET", "/boom", None, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An internal server error occurred");

        let logs = state.error_logs.latest(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].kind, "internal_error");
        assert!(logs[0].detail.starts_with("GET /boom"));
        assert!(logs[0].detail.contains("disk full"));
    }
}
