//! HTTP 接口集成测试
//!
//! 通过 Router 直接下发请求，覆盖从注册到活动完成结算的完整链路。
//! 需要真实 PostgreSQL（路由处理器直接操作数据库）。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... \
//!   cargo test --test api_flow_test -- --ignored
//! ```

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

use club_api::{routes, state::AppState};

fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests")
}

/// 构建被测应用
async fn test_app() -> (Router, PgPool) {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let state = AppState::new(pool.clone());
    let app = Router::new()
        .nest("/api", routes::api_routes())
        .with_state(state);
    (app, pool)
}

/// 发送 JSON 请求并解析响应体
async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    operator_id: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(id) = operator_id {
        builder = builder.header("x-operator-id", id.to_string());
    }

    let request = builder
        .body(Body::from(
            body.map(|b| b.to_string()).unwrap_or_default(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// 插入管理员账号，返回 ID
async fn seed_admin(pool: &PgPool, id: i64, username: &str) -> i64 {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, role, total_points)
        VALUES ($1, $2, $2 || '@test.local', 'x', 'admin', 0)
        ON CONFLICT (id) DO UPDATE SET role = 'admin'
        "#,
    )
    .bind(id)
    .bind(username)
    .execute(pool)
    .await
    .expect("插入管理员失败");
    id
}

async fn cleanup_user(pool: &PgPool, username: &str) {
    sqlx::query(
        r#"
        DELETE FROM point_transactions WHERE user_id IN (SELECT id FROM users WHERE username = $1)
        "#,
    )
    .bind(username)
    .execute(pool)
    .await
    .ok();
    sqlx::query(
        r#"
        DELETE FROM registrations WHERE user_id IN (SELECT id FROM users WHERE username = $1)
        "#,
    )
    .bind(username)
    .execute(pool)
    .await
    .ok();
    sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(username)
        .execute(pool)
        .await
        .ok();
}

/// 注册 + 登录：密码哈希不回显，错误密码拒绝
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_register_and_login() {
    let (app, pool) = test_app().await;
    let username = "api_register_001";

    cleanup_user(&pool, username).await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users/register",
        None,
        Some(json!({
            "username": username,
            "email": "api_register_001@test.local",
            "password": "secret123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "注册失败: {}", body);
    assert_eq!(body["success"], true);

    // 重复注册冲突
    let (dup_status, dup_body) = send_json(
        &app,
        "POST",
        "/api/users/register",
        None,
        Some(json!({
            "username": username,
            "email": "api_register_001@test.local",
            "password": "secret123"
        })),
    )
    .await;
    assert_eq!(dup_status, StatusCode::CONFLICT);
    assert_eq!(dup_body["code"], "USER_ALREADY_EXISTS");

    // 正确密码登录
    let (login_status, login_body) = send_json(
        &app,
        "POST",
        "/api/users/login",
        None,
        Some(json!({ "username": username, "password": "secret123" })),
    )
    .await;
    assert_eq!(login_status, StatusCode::OK);
    assert_eq!(login_body["data"]["username"], username);
    assert!(
        login_body["data"].get("passwordHash").is_none(),
        "密码哈希不得出现在响应中"
    );

    // 错误密码拒绝
    let (bad_status, bad_body) = send_json(
        &app,
        "POST",
        "/api/users/login",
        None,
        Some(json!({ "username": username, "password": "wrong" })),
    )
    .await;
    assert_eq!(bad_status, StatusCode::UNAUTHORIZED);
    assert_eq!(bad_body["code"], "INVALID_CREDENTIALS");

    cleanup_user(&pool, username).await;
}

/// 完整链路：建规则 -> 建活动 -> 发布 -> 报名 -> 审核 -> 签到/签退 -> 完成结算
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_full_activity_settlement_flow() {
    let (app, pool) = test_app().await;
    let admin_id = seed_admin(&pool, 95000, "api_flow_admin").await;
    let member = "api_flow_member_001";

    cleanup_user(&pool, member).await;

    // 普通成员注册
    let (_, reg_body) = send_json(
        &app,
        "POST",
        "/api/users/register",
        None,
        Some(json!({
            "username": member,
            "email": "api_flow_member_001@test.local",
            "password": "secret123"
        })),
    )
    .await;
    let member_id = reg_body["data"]["id"].as_i64().unwrap();

    // 管理员创建活动参与规则
    let (rule_status, _) = send_json(
        &app,
        "POST",
        "/api/point-rules",
        Some(admin_id),
        Some(json!({
            "ruleName": "活动参与奖励",
            "ruleType": "earn",
            "actionType": "activity_participation",
            "points": 15,
            "validityDays": 60
        })),
    )
    .await;
    assert_eq!(rule_status, StatusCode::OK);

    // 普通成员建活动被拒
    let (forbidden, _) = send_json(
        &app,
        "POST",
        "/api/activities",
        Some(member_id),
        Some(json!({
            "title": "越权活动",
            "startTime": "2026-09-01T10:00:00Z",
            "endTime": "2026-09-01T12:00:00Z"
        })),
    )
    .await;
    assert_eq!(forbidden, StatusCode::FORBIDDEN);

    // 管理员创建并发布活动
    let (_, act_body) = send_json(
        &app,
        "POST",
        "/api/activities",
        Some(admin_id),
        Some(json!({
            "title": "秋季徒步",
            "startTime": "2026-09-01T10:00:00Z",
            "endTime": "2026-09-01T12:00:00Z",
            "maxParticipants": 30
        })),
    )
    .await;
    let activity_id = act_body["data"]["id"].as_i64().unwrap();

    let (publish_status, _) = send_json(
        &app,
        "PATCH",
        &format!("/api/activities/{}/status", activity_id),
        Some(admin_id),
        Some(json!({ "status": "published" })),
    )
    .await;
    assert_eq!(publish_status, StatusCode::OK);

    // 成员报名
    let (_, reg2_body) = send_json(
        &app,
        "POST",
        &format!("/api/activities/{}/registrations", activity_id),
        Some(member_id),
        None,
    )
    .await;
    let registration_id = reg2_body["data"]["id"].as_i64().unwrap();

    // 重复报名冲突
    let (dup_status, _) = send_json(
        &app,
        "POST",
        &format!("/api/activities/{}/registrations", activity_id),
        Some(member_id),
        None,
    )
    .await;
    assert_eq!(dup_status, StatusCode::CONFLICT);

    // 审核通过 + 签到 + 签退
    for (method, path, body) in [
        (
            "PATCH",
            format!("/api/registrations/{}/review", registration_id),
            Some(json!({ "status": "approved" })),
        ),
        (
            "POST",
            format!("/api/registrations/{}/check-in", registration_id),
            None,
        ),
        (
            "POST",
            format!("/api/registrations/{}/check-out", registration_id),
            None,
        ),
    ] {
        let (status, resp) = send_json(&app, method, &path, Some(admin_id), body).await;
        assert_eq!(status, StatusCode::OK, "{} 失败: {}", path, resp);
    }

    // 完成活动，触发批量结算
    let (complete_status, complete_body) = send_json(
        &app,
        "POST",
        &format!("/api/activities/{}/complete", activity_id),
        Some(admin_id),
        None,
    )
    .await;
    assert_eq!(complete_status, StatusCode::OK);
    assert_eq!(complete_body["data"]["participantsCount"], 1);
    assert_eq!(complete_body["data"]["pointsAwarded"], 15);

    // 余额与账本同步
    let (_, user_body) = send_json(
        &app,
        "GET",
        &format!("/api/users/{}", member_id),
        None,
        None,
    )
    .await;
    assert_eq!(user_body["data"]["totalPoints"], 15);

    let (_, tx_body) = send_json(
        &app,
        "GET",
        &format!("/api/points/user/{}", member_id),
        None,
        None,
    )
    .await;
    let entries = tx_body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["transactionType"], "earn");
    assert_eq!(entries[0]["referenceId"], activity_id);

    // 统计同时返回获得与消耗两条序列
    let (stats_status, stats_body) = send_json(
        &app,
        "GET",
        &format!("/api/points/stats?userId={}&period=month", member_id),
        None,
        None,
    )
    .await;
    assert_eq!(stats_status, StatusCode::OK);
    assert_eq!(stats_body["data"]["period"], "month");
    let earn_stats = stats_body["data"]["earnStats"].as_array().unwrap();
    assert_eq!(earn_stats.len(), 1);
    assert_eq!(earn_stats[0]["totalPoints"], 15);
    assert_eq!(earn_stats[0]["transactionCount"], 1);
    assert_eq!(
        stats_body["data"]["consumeStats"].as_array().unwrap().len(),
        0,
        "未消耗过积分时消耗序列为空"
    );

    // 重复完成被拒绝
    let (again_status, again_body) = send_json(
        &app,
        "POST",
        &format!("/api/activities/{}/complete", activity_id),
        Some(admin_id),
        None,
    )
    .await;
    assert_eq!(again_status, StatusCode::CONFLICT);
    assert_eq!(again_body["code"], "INVALID_STATUS_TRANSITION");

    cleanup_user(&pool, member).await;
}

/// 排行榜：按积分降序排列，分页元数据与总数一致
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_leaderboard_ordering_and_pagination() {
    let (app, pool) = test_app().await;

    for (id, username, points) in [
        (96001, "api_board_low", 10_i64),
        (96002, "api_board_high", 300),
        (96003, "api_board_mid", 50),
    ] {
        cleanup_user(&pool, username).await;
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, total_points)
            VALUES ($1, $2, $2 || '@test.local', 'x', 'user', $3)
            ON CONFLICT (id) DO UPDATE SET total_points = EXCLUDED.total_points
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(points)
        .execute(&pool)
        .await
        .unwrap();
    }

    let (status, body) = send_json(
        &app,
        "GET",
        "/api/points/leaderboard?limit=100&offset=0",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let items = body["data"]["items"].as_array().unwrap();
    let positions: Vec<usize> = ["api_board_high", "api_board_mid", "api_board_low"]
        .iter()
        .map(|name| {
            items
                .iter()
                .position(|e| e["username"] == *name)
                .unwrap_or_else(|| panic!("{} 不在排行榜中", name))
        })
        .collect();
    assert!(
        positions[0] < positions[1] && positions[1] < positions[2],
        "排行榜必须按积分降序"
    );

    // 分页元数据与总用户数一致
    let total = body["data"]["total"].as_i64().unwrap();
    let db_total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, db_total.0);
    assert_eq!(body["data"]["limit"], 100);
    assert_eq!(body["data"]["offset"], 0);

    // limit 截断窗口，total 仍是完整结果集大小
    let (_, window) = send_json(&app, "GET", "/api/points/leaderboard?limit=1", None, None).await;
    assert_eq!(window["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(window["data"]["total"].as_i64().unwrap(), db_total.0);

    for username in ["api_board_low", "api_board_high", "api_board_mid"] {
        cleanup_user(&pool, username).await;
    }
}

/// 缺少操作人头的管理端请求被拒绝
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_missing_operator_header_rejected() {
    let (app, _pool) = test_app().await;

    let (status, body) = send_json(&app, "GET", "/api/point-rules", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}
