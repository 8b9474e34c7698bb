/// Integration tests for the Knowledge Hub API
///
/// These tests drive the full router over the in-memory store:
/// - Registration, login, and token handling
/// - Tenant isolation through the token's tenant
/// - Knowledge, tag, and comment lifecycles
/// - Error bodies and status codes

mod common;

use axum::http::{Method, StatusCode};
use common::{Session, TestContext, PASSWORD};
use serde_json::{json, Value};

fn ids_of(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

async fn create_knowledge(ctx: &TestContext, session: &Session, body: Value) -> Value {
    let (status, knowledge) = ctx
        .send(Method::POST, "/api/knowledge", Some(&session.token), Some(body))
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {knowledge}");
    knowledge
}

async fn create_tag(ctx: &TestContext, session: &Session, name: &str) -> String {
    let (status, tag) = ctx
        .send(
            Method::POST,
            "/api/tags",
            Some(&session.token),
            Some(json!({ "name": name, "color": "#ff8800" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "tag create failed: {tag}");
    tag["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_reports_memory_store() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_register_login_and_me() {
    let ctx = TestContext::new().await;

    let registered = ctx.register("ada@acme.test", "editor").await;

    let (status, login) = ctx
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({
                "tenant_id": ctx.tenant.id,
                "email": "ada@acme.test",
                "password": PASSWORD,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user_id"], registered.user_id.to_string());
    assert_eq!(login["role"], "editor");
    assert!(login["expires_at"].as_i64().unwrap() > 0);

    let token = login["token"].as_str().unwrap();
    let (status, me) = ctx.send(Method::GET, "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ada@acme.test");
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new().await;
    ctx.register("ada@acme.test", "editor").await;

    let attempt = |email: &'static str, password: &'static str| {
        json!({ "tenant_id": ctx.tenant.id, "email": email, "password": password })
    };

    let (wrong_status, wrong_password) = ctx
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(attempt("ada@acme.test", "not the password")),
        )
        .await;
    let (unknown_status, unknown_email) = ctx
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(attempt("nobody@acme.test", PASSWORD)),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["error"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_register_rejections() {
    let ctx = TestContext::new().await;
    ctx.register("ada@acme.test", "editor").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "tenant_id": ctx.tenant.id,
                "name": "Ada",
                "email": "not-an-email",
                "password": "short",
                "role": "owner",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password", "role"]);

    let duplicate = json!({
        "tenant_id": ctx.tenant.id,
        "name": "Ada Again",
        "email": "ada@acme.test",
        "password": PASSWORD,
        "role": "viewer",
    });
    let (status, body) = ctx
        .send(Method::POST, "/api/auth/register", None, Some(duplicate))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "EMAIL_ALREADY_EXISTS");

    let unknown_tenant = json!({
        "tenant_id": uuid::Uuid::new_v4(),
        "name": "Ada",
        "email": "ada@elsewhere.test",
        "password": PASSWORD,
        "role": "viewer",
    });
    let (status, body) = ctx
        .send(Method::POST, "/api/auth/register", None, Some(unknown_tenant))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "TENANT_NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let ctx = TestContext::new().await;
    let session = ctx.register("ada@acme.test", "editor").await;

    let (status, body) = ctx.send(Method::GET, "/api/knowledge", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = ctx
        .send(Method::GET, "/api/knowledge", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx
        .send(Method::GET, "/api/knowledge/not-a-uuid", Some(&session.token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let (status, body) = ctx
        .send(
            Method::GET,
            "/api/knowledge?tag_ids=nope",
            Some(&session.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/knowledge",
            Some(&session.token),
            Some(json!({ "content": "no title" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_knowledge_lifecycle_with_tags_and_search() {
    let ctx = TestContext::new().await;
    let session = ctx.register("ada@acme.test", "editor").await;
    let vpn = create_tag(&ctx, &session, "vpn").await;
    let onboarding = create_tag(&ctx, &session, "onboarding").await;

    let first = create_knowledge(
        &ctx,
        &session,
        json!({
            "title": "Connecting to the VPN",
            "content": "Install the client first.",
            "tag_ids": [vpn, vpn],
        }),
    )
    .await;
    assert_eq!(first["status"], "draft");
    assert_eq!(first["author_id"], session.user_id.to_string());
    assert_eq!(ids_of(&first["tags"]), vec![vpn.clone()]);

    let second = create_knowledge(
        &ctx,
        &session,
        json!({
            "title": "First day",
            "content": "Welcome aboard.",
            "status": "published",
            "tag_ids": [onboarding],
        }),
    )
    .await;
    let first_id = first["id"].as_str().unwrap().to_string();
    let second_id = second["id"].as_str().unwrap().to_string();

    let (status, hits) = ctx
        .send(
            Method::GET,
            &format!("/api/knowledge?tag_ids={vpn},{onboarding}"),
            Some(&session.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let mut found = ids_of(&hits);
    found.sort();
    let mut expected = vec![first_id.clone(), second_id.clone()];
    expected.sort();
    assert_eq!(found, expected);

    let (_, hits) = ctx
        .send(
            Method::GET,
            "/api/knowledge?query=vpn&status=draft",
            Some(&session.token),
            None,
        )
        .await;
    assert_eq!(ids_of(&hits), vec![first_id.clone()]);

    let (status, updated) = ctx
        .send(
            Method::PUT,
            &format!("/api/knowledge/{first_id}"),
            Some(&session.token),
            Some(json!({ "status": "published", "tag_ids": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "published");
    assert_eq!(updated["title"], "Connecting to the VPN");
    assert!(updated["tags"].as_array().unwrap().is_empty());

    let (status, body) = ctx
        .send(
            Method::DELETE,
            &format!("/api/knowledge/{first_id}"),
            Some(&session.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/knowledge/{first_id}"),
            Some(&session.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "KNOWLEDGE_NOT_FOUND");
}

#[tokio::test]
async fn test_tenants_cannot_see_each_other() {
    let ctx = TestContext::new().await;
    let other = TestContext::seed_tenant(&ctx.state, "globex.test").await;

    let ada = ctx.register("ada@acme.test", "admin").await;
    let hank = ctx.register_in(other.id, "hank@globex.test", "admin").await;

    let article = create_knowledge(
        &ctx,
        &ada,
        json!({ "title": "Acme secrets", "content": "Roadrunner schedule" }),
    )
    .await;
    let article_id = article["id"].as_str().unwrap();

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/knowledge/{article_id}"),
            Some(&hank.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "KNOWLEDGE_NOT_FOUND");

    let (_, hits) = ctx
        .send(Method::GET, "/api/knowledge?query=secrets", Some(&hank.token), None)
        .await;
    assert!(hits.as_array().unwrap().is_empty());

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/tenants/{}", ctx.tenant.id),
            Some(&hank.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (status, _) = ctx
        .send(
            Method::DELETE,
            &format!("/api/users/{}", ada.user_id),
            Some(&hank.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tenant_endpoints() {
    let ctx = TestContext::new().await;
    let admin = ctx.register("root@acme.test", "admin").await;
    let editor = ctx.register("ed@acme.test", "editor").await;

    let (status, tenant) = ctx
        .send(Method::GET, "/api/tenants/domain/acme.test", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tenant["id"], ctx.tenant.id.to_string());
    assert_eq!(tenant["settings"]["features"]["comments"], true);

    let new_tenant = json!({
        "name": "Initech",
        "domain": "initech.test",
        "theme": { "primary_color": "#000", "secondary_color": "#ffffff" },
    });
    let (status, body) = ctx
        .send(Method::POST, "/api/tenants", Some(&editor.token), Some(new_tenant.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (status, created) = ctx
        .send(Method::POST, "/api/tenants", Some(&admin.token), Some(new_tenant.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["domain"], "initech.test");

    let (status, body) = ctx
        .send(Method::POST, "/api/tenants", Some(&admin.token), Some(new_tenant))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DOMAIN_ALREADY_EXISTS");

    let settings = json!({
        "settings": {
            "theme": { "primary_color": "#abcdef", "secondary_color": "#123456" },
            "features": { "comments": false, "tags": true, "ratings": false },
        }
    });
    let uri = format!("/api/tenants/{}/settings", ctx.tenant.id);

    let (status, _) = ctx
        .send(Method::PUT, &uri, Some(&editor.token), Some(settings.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = ctx
        .send(Method::PUT, &uri, Some(&admin.token), Some(settings))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["settings"]["theme"]["primary_color"], "#abcdef");
    assert_eq!(updated["settings"]["features"]["comments"], false);

    let bad_color = json!({
        "settings": {
            "theme": { "primary_color": "blue", "secondary_color": "#123456" },
            "features": { "comments": true, "tags": true, "ratings": true },
        }
    });
    let (status, body) = ctx
        .send(Method::PUT, &uri, Some(&admin.token), Some(bad_color))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "settings.theme.primary_color");

    let (status, _) = ctx
        .send(
            Method::DELETE,
            &format!("/api/tenants/{}", ctx.tenant.id),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = ctx
        .send(Method::GET, "/api/tenants/domain/acme.test", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "TENANT_NOT_FOUND");
}

#[tokio::test]
async fn test_comment_permissions() {
    let ctx = TestContext::new().await;
    let admin = ctx.register("root@acme.test", "admin").await;
    let ada = ctx.register("ada@acme.test", "editor").await;
    let bob = ctx.register("bob@acme.test", "editor").await;

    let article = create_knowledge(
        &ctx,
        &ada,
        json!({ "title": "Printers", "content": "Turn it off and on." }),
    )
    .await;
    let comments_uri = format!("/api/knowledge/{}/comments", article["id"].as_str().unwrap());

    let (status, comment) = ctx
        .send(
            Method::POST,
            &comments_uri,
            Some(&ada.token),
            Some(json!({ "content": "Worked for me" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["author_id"], ada.user_id.to_string());
    let comment_uri = format!("{comments_uri}/{}", comment["id"].as_str().unwrap());

    let (status, _) = ctx
        .send(
            Method::PUT,
            &comment_uri,
            Some(&bob.token),
            Some(json!({ "content": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, edited) = ctx
        .send(
            Method::PUT,
            &comment_uri,
            Some(&admin.token),
            Some(json!({ "content": "Moderated" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["content"], "Moderated");

    let (status, list) = ctx.send(Method::GET, &comments_uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = ctx.send(Method::DELETE, &comment_uri, Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = ctx.send(Method::DELETE, &comment_uri, Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "COMMENT_NOT_FOUND");
}

#[tokio::test]
async fn test_tag_update_and_delete_detach_from_knowledge() {
    let ctx = TestContext::new().await;
    let session = ctx.register("ada@acme.test", "editor").await;
    let tag_id = create_tag(&ctx, &session, "networking").await;

    let article = create_knowledge(
        &ctx,
        &session,
        json!({ "title": "DNS", "content": "It is always DNS.", "tag_ids": [tag_id] }),
    )
    .await;
    let article_uri = format!("/api/knowledge/{}", article["id"].as_str().unwrap());

    let (status, tag) = ctx
        .send(
            Method::PUT,
            &format!("/api/tags/{tag_id}"),
            Some(&session.token),
            Some(json!({ "color": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tag["name"], "networking");
    assert_eq!(tag["color"], Value::Null);

    let (status, _) = ctx
        .send(
            Method::DELETE,
            &format!("/api/tags/{tag_id}"),
            Some(&session.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, tags) = ctx.send(Method::GET, "/api/tags", Some(&session.token), None).await;
    assert!(tags.as_array().unwrap().is_empty());

    let (status, article) = ctx.send(Method::GET, &article_uri, Some(&session.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(article["tags"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_user_management() {
    let ctx = TestContext::new().await;
    let admin = ctx.register("root@acme.test", "admin").await;
    let ada = ctx.register("ada@acme.test", "editor").await;

    let (status, _) = ctx.send(Method::GET, "/api/users", Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = ctx.send(Method::GET, "/api/users", Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let ada_uri = format!("/api/users/{}", ada.user_id);
    let (status, updated) = ctx
        .send(
            Method::PUT,
            &ada_uri,
            Some(&ada.token),
            Some(json!({ "name": "Ada L.", "avatar_url": "https://cdn.test/ada.png" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Ada L.");
    assert_eq!(updated["avatar_url"], "https://cdn.test/ada.png");

    let (status, _) = ctx
        .send(Method::PUT, &ada_uri, Some(&ada.token), Some(json!({ "role": "admin" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let article = create_knowledge(
        &ctx,
        &ada,
        json!({ "title": "Kept", "content": "Outlives its author" }),
    )
    .await;

    let (status, _) = ctx.send(Method::DELETE, &ada_uri, Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send(Method::DELETE, &ada_uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, article) = ctx
        .send(
            Method::GET,
            &format!("/api/knowledge/{}", article["id"].as_str().unwrap()),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(article["author_id"], Value::Null);
}
