mod common;

use common::{signed_in, TestContext, TestRequest};
use serde_json::json;
use vitrine::models::AdminRole;

#[tokio::test]
async fn legal_page_validation_reports_each_failure() {
    let ctx = TestContext::new().await;
    let (_, token) = signed_in(&ctx.pool, "admin@example.com", AdminRole::Admin).await;

    let response = TestRequest::post("/api/admin/legal-pages")
        .session(&token)
        .json(json!({"slug": "Privacy Policy", "title": "", "content": null}))
        .send(&ctx.app)
        .await;

    assert_eq!(response.status(), 400);
    let body = response.json();
    assert_eq!(body["error"], "Invalid data");
    let details: Vec<_> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| (issue["path"].clone(), issue["code"].as_str().unwrap().to_string()))
        .collect();
    assert_eq!(
        details,
        vec![
            (json!(["content"]), "required".to_string()),
            (json!(["slug"]), "slug_format".to_string()),
            (json!(["title"]), "length".to_string()),
        ]
    );
    for issue in body["details"].as_array().unwrap() {
        assert!(!issue["message"].as_str().unwrap().is_empty());
    }

    let list = TestRequest::get("/api/admin/legal-pages")
        .session(&token)
        .send(&ctx.app)
        .await
        .json();
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn legal_page_lifecycle() {
    let ctx = TestContext::new().await;
    let (_, token) = signed_in(&ctx.pool, "admin@example.com", AdminRole::Admin).await;

    let response = TestRequest::post("/api/admin/legal-pages")
        .session(&token)
        .json(json!({
            "slug": "privacy",
            "title": "Privacy",
            "content": [{"type": "paragraph", "children": [{"text": "We keep little."}]}]
        }))
        .send(&ctx.app)
        .await;
    assert_eq!(response.status(), 201);
    let id = response.json()["id"].as_i64().unwrap();

    let duplicate = TestRequest::post("/api/admin/legal-pages")
        .session(&token)
        .json(json!({"slug": "privacy", "title": "Again", "content": "<p>x</p>"}))
        .send(&ctx.app)
        .await;
    assert_eq!(duplicate.status(), 409);

    let response = TestRequest::put(&format!("/api/admin/legal-pages/{}", id))
        .session(&token)
        .json(json!({"slug": "privacy", "title": "Privacy policy", "content": "<p>Updated</p>"}))
        .send(&ctx.app)
        .await;
    assert_eq!(response.status(), 200);

    let public = TestRequest::get("/api/public/legal-pages/privacy").send(&ctx.app).await;
    assert_eq!(public.status(), 200);
    let body = public.json();
    assert_eq!(body["title"], "Privacy policy");
    assert_eq!(body["content"], "<p>Updated</p>");

    let response = TestRequest::delete(&format!("/api/admin/legal-pages/{}", id))
        .session(&token)
        .send(&ctx.app)
        .await;
    assert_eq!(response.status(), 204);

    let response = TestRequest::get(&format!("/api/admin/legal-pages/{}", id))
        .session(&token)
        .send(&ctx.app)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn article_slug_conflicts_and_trash() {
    let ctx = TestContext::new().await;
    let (_, token) = signed_in(&ctx.pool, "editor@example.com", AdminRole::Editor).await;

    let created = TestRequest::post("/api/admin/articles")
        .session(&token)
        .json(json!({
            "title": "Café Opening",
            "body": "<p>Welcome</p>",
            "isDraft": false,
            "images": [{"url": "/uploads/a.png", "alt": "Front"}, {"url": "/uploads/b.png"}]
        }))
        .send(&ctx.app)
        .await;
    assert_eq!(created.status(), 201);
    let article = created.json();
    assert_eq!(article["slug"], "cafe-opening");
    assert_eq!(article["images"].as_array().unwrap().len(), 2);
    assert_eq!(article["images"][1]["position"], 1);
    let id = article["id"].as_i64().unwrap();

    let duplicate = TestRequest::post("/api/admin/articles")
        .session(&token)
        .json(json!({"title": "Another", "slug": "cafe-opening"}))
        .send(&ctx.app)
        .await;
    assert_eq!(duplicate.status(), 409);
    assert_eq!(duplicate.json()["error"], "An article with this slug already exists");

    // Replace keeps the slug when omitted and swaps the images
    let updated = TestRequest::put(&format!("/api/admin/articles/{}", id))
        .session(&token)
        .json(json!({"title": "Café Opening Night", "isDraft": false, "images": [{"url": "/uploads/c.png"}]}))
        .send(&ctx.app)
        .await;
    assert_eq!(updated.status(), 200);
    let article = updated.json();
    assert_eq!(article["slug"], "cafe-opening");
    assert_eq!(article["images"][0]["url"], "/uploads/c.png");
    assert_eq!(article["images"].as_array().unwrap().len(), 1);

    let response = TestRequest::delete(&format!("/api/admin/articles/{}", id))
        .session(&token)
        .send(&ctx.app)
        .await;
    assert_eq!(response.status(), 204);

    let trash = TestRequest::get("/api/admin/articles?deleted=true")
        .session(&token)
        .send(&ctx.app)
        .await
        .json();
    assert_eq!(trash["total"], 1);
    let live = TestRequest::get("/api/admin/articles")
        .session(&token)
        .send(&ctx.app)
        .await
        .json();
    assert_eq!(live["total"], 0);

    let restored = TestRequest::post(&format!("/api/admin/articles/{}/restore", id))
        .session(&token)
        .send(&ctx.app)
        .await;
    assert_eq!(restored.status(), 200);
    assert!(restored.json()["deletedAt"].is_null());

    let public = TestRequest::get("/api/public/articles/cafe-opening").send(&ctx.app).await;
    assert_eq!(public.status(), 200);
}

#[tokio::test]
async fn article_admin_list_pages() {
    let ctx = TestContext::new().await;
    let (_, token) = signed_in(&ctx.pool, "editor@example.com", AdminRole::Editor).await;

    for n in 0..3 {
        let response = TestRequest::post("/api/admin/articles")
            .session(&token)
            .json(json!({"title": format!("Post {}", n)}))
            .send(&ctx.app)
            .await;
        assert_eq!(response.status(), 201);
    }

    let page = TestRequest::get("/api/admin/articles?page=2&perPage=2")
        .session(&token)
        .send(&ctx.app)
        .await
        .json();
    assert_eq!(page["total"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["page"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn inbox_flags_and_filters() {
    let ctx = TestContext::new().await;
    let (_, token) = signed_in(&ctx.pool, "editor@example.com", AdminRole::Editor).await;

    let mut ids = Vec::new();
    for n in 0..2 {
        let response = TestRequest::post("/api/public/contact")
            .json(json!({
                "name": format!("Visitor {}", n),
                "email": "visitor@example.com",
                "message": "Hello there, I have a question."
            }))
            .send(&ctx.app)
            .await;
        ids.push(response.json()["id"].as_i64().unwrap());
    }

    let response = TestRequest::patch(&format!("/api/admin/messages/{}", ids[0]))
        .session(&token)
        .json(json!({"isRead": true}))
        .send(&ctx.app)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.json()["isRead"], true);

    let unread = TestRequest::get("/api/admin/messages?unread=true")
        .session(&token)
        .send(&ctx.app)
        .await
        .json();
    assert_eq!(unread["total"], 1);
    assert_eq!(unread["unreadCount"], 1);

    TestRequest::patch(&format!("/api/admin/messages/{}", ids[1]))
        .session(&token)
        .json(json!({"isArchived": true}))
        .send(&ctx.app)
        .await;
    let archived = TestRequest::get("/api/admin/messages?archived=true")
        .session(&token)
        .send(&ctx.app)
        .await
        .json();
    assert_eq!(archived["total"], 1);
    assert_eq!(archived["items"][0]["id"], ids[1]);

    let response = TestRequest::delete(&format!("/api/admin/messages/{}", ids[0]))
        .session(&token)
        .send(&ctx.app)
        .await;
    assert_eq!(response.status(), 204);
    let response = TestRequest::delete(&format!("/api/admin/messages/{}", ids[0]))
        .session(&token)
        .send(&ctx.app)
        .await;
    assert_eq!(response.status(), 404);
    assert_eq!(response.json()["error"], "Message not found");
}

#[tokio::test]
async fn settings_update_is_visible_publicly() {
    let ctx = TestContext::new().await;
    let (_, token) = signed_in(&ctx.pool, "admin@example.com", AdminRole::Admin).await;

    // Warm the public cache with the defaults first
    TestRequest::get("/api/public/global-settings").send(&ctx.app).await;

    let response = TestRequest::put("/api/admin/global-settings")
        .session(&token)
        .json(json!({
            "siteName": "Acme Studio",
            "contactEmail": "hello@acme.test",
            "linkedinUrl": "https://www.linkedin.com/company/acme"
        }))
        .send(&ctx.app)
        .await;
    assert_eq!(response.status(), 200);

    let body = TestRequest::get("/api/public/global-settings").send(&ctx.app).await.json();
    assert_eq!(body["siteName"], "Acme Studio");
    assert_eq!(body["contactEmail"], "hello@acme.test");

    let invalid = TestRequest::put("/api/admin/global-settings")
        .session(&token)
        .json(json!({"siteName": "Acme", "contactEmail": "not-an-email"}))
        .send(&ctx.app)
        .await;
    assert_eq!(invalid.status(), 400);
    assert_eq!(invalid.json()["details"][0]["path"], json!(["contactEmail"]));
}

#[tokio::test]
async fn catalog_item_not_found() {
    let ctx = TestContext::new().await;
    let (_, token) = signed_in(&ctx.pool, "editor@example.com", AdminRole::Editor).await;

    let response = TestRequest::put("/api/admin/audiences/42")
        .session(&token)
        .json(json!({"title": "Startups"}))
        .send(&ctx.app)
        .await;
    assert_eq!(response.status(), 404);
    assert_eq!(response.json()["error"], "Audience not found");

    let response = TestRequest::delete("/api/admin/services/42")
        .session(&token)
        .send(&ctx.app)
        .await;
    assert_eq!(response.status(), 404);
    assert_eq!(response.json()["error"], "Service not found");
}

#[tokio::test]
async fn malformed_path_query_and_body_get_json_errors() {
    let ctx = TestContext::new().await;
    let (_, token) = signed_in(&ctx.pool, "admin@example.com", AdminRole::Admin).await;

    let contact = TestRequest::post("/api/public/contact")
        .json(json!({
            "name": "Visitor",
            "email": "visitor@example.com",
            "message": "Hello there, I have a question."
        }))
        .send(&ctx.app)
        .await;
    let id = contact.json()["id"].as_i64().unwrap();

    let requests = [
        TestRequest::patch(&format!("/api/admin/messages/{}", id)).json(json!({"isRead": "yes"})),
        TestRequest::patch("/api/admin/messages/abc").json(json!({"isRead": true})),
        TestRequest::get("/api/admin/articles/abc"),
        TestRequest::get("/api/admin/articles?page=x"),
        TestRequest::get("/api/admin/messages?unread=maybe"),
        TestRequest::delete("/api/admin/legal-pages/abc"),
        TestRequest::delete("/api/admin/services/abc"),
    ];
    for request in requests {
        let response = request.session(&token).send(&ctx.app).await;
        assert_eq!(response.status(), 400);
        assert_eq!(
            response.header(axum::http::header::CONTENT_TYPE),
            Some("application/json")
        );
        assert!(response.json()["error"].is_string());
    }

    let public = TestRequest::get("/api/public/articles?limit=lots").send(&ctx.app).await;
    assert_eq!(public.status(), 400);
    assert!(public.json()["error"].is_string());

    let unchanged = TestRequest::get("/api/admin/messages?unread=true")
        .session(&token)
        .send(&ctx.app)
        .await
        .json();
    assert_eq!(unchanged["total"], 1);
}
