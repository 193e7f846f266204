//! 结算引擎集成测试
//!
//! 使用真实 PostgreSQL 测试活动完成批量结算和手动结算的完整流程。
//! 结算引擎依赖行锁和事务回滚语义，无法通过纯 mock 覆盖。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... \
//!   cargo test --test settlement_test -- --ignored
//! ```

use chrono::{Duration, Utc};
use sqlx::PgPool;

use points_service::repository::{LedgerFilter, LedgerRepository, RuleRepository};
use points_service::service::{ManualSettlement, RuleResolver, SettlementEngine};
use points_service::{PointsError, TransactionType};

// ==================== 辅助函数 ====================

/// 从环境变量读取数据库 URL，未设置则 panic
fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests")
}

/// 插入测试用户（幂等，已存在则重置余额）
async fn seed_user(pool: &PgPool, user_id: i64, username: &str, total_points: i64) {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, role, total_points)
        VALUES ($1, $2, $2 || '@test.local', 'x', 'user', $3)
        ON CONFLICT (id) DO UPDATE SET total_points = EXCLUDED.total_points
        "#,
    )
    .bind(user_id)
    .bind(username)
    .bind(total_points)
    .execute(pool)
    .await
    .expect("插入测试用户失败");
}

/// 插入积分规则，返回规则 ID
async fn seed_rule(
    pool: &PgPool,
    rule_type: &str,
    action_type: &str,
    points: i64,
    validity_days: Option<i32>,
    is_active: bool,
) -> i64 {
    seed_user(pool, 90000, "settle_admin", 0).await;

    sqlx::query_scalar(
        r#"
        INSERT INTO point_rules
            (rule_name, rule_type, action_type, points, validity_days, is_active, created_by)
        VALUES ('结算测试规则', $1, $2, $3, $4, $5, 90000)
        RETURNING id
        "#,
    )
    .bind(rule_type)
    .bind(action_type)
    .bind(points)
    .bind(validity_days)
    .bind(is_active)
    .fetch_one(pool)
    .await
    .expect("插入测试规则失败")
}

/// 插入 published 状态的活动，返回活动 ID
async fn seed_published_activity(pool: &PgPool, title: &str) -> i64 {
    let now = Utc::now();
    sqlx::query_scalar(
        r#"
        INSERT INTO activities (title, start_time, end_time, status)
        VALUES ($1, $2, $3, 'published')
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(now - Duration::hours(2))
    .bind(now - Duration::hours(1))
    .fetch_one(pool)
    .await
    .expect("插入测试活动失败")
}

/// 插入报名记录，可控制审核状态和签到/签退时间
async fn seed_registration(
    pool: &PgPool,
    activity_id: i64,
    user_id: i64,
    status: &str,
    checked_in: bool,
    checked_out: bool,
) {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO registrations (activity_id, user_id, status, check_in_time, check_out_time)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (activity_id, user_id) DO UPDATE SET
            status = EXCLUDED.status,
            check_in_time = EXCLUDED.check_in_time,
            check_out_time = EXCLUDED.check_out_time
        "#,
    )
    .bind(activity_id)
    .bind(user_id)
    .bind(status)
    .bind(checked_in.then_some(now - Duration::minutes(90)))
    .bind(checked_out.then_some(now - Duration::minutes(30)))
    .execute(pool)
    .await
    .expect("插入测试报名失败");
}

/// 读取用户当前余额
async fn balance_of(pool: &PgPool, user_id: i64) -> i64 {
    let row: (i64,) = sqlx::query_as("SELECT total_points FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("查询余额失败");
    row.0
}

/// 清理测试数据，按外键依赖顺序删除
async fn cleanup(pool: &PgPool, user_ids: &[i64]) {
    for uid in user_ids {
        sqlx::query("DELETE FROM point_transactions WHERE user_id = $1")
            .bind(uid)
            .execute(pool)
            .await
            .ok();
        sqlx::query("DELETE FROM registrations WHERE user_id = $1")
            .bind(uid)
            .execute(pool)
            .await
            .ok();
    }
}

// ==================== 活动完成结算 ====================

/// 正常完成：合格参与者各得一笔账本记录，余额同步增加，活动进入 completed
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_activity_completion_awards_eligible_participants() {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let (u1, u2, u3, u4) = (91001, 91002, 91003, 91004);

    cleanup(&pool, &[u1, u2, u3, u4]).await;
    seed_user(&pool, u1, "settle_full_1", 0).await;
    seed_user(&pool, u2, "settle_full_2", 0).await;
    seed_user(&pool, u3, "settle_full_3", 0).await;
    seed_user(&pool, u4, "settle_full_4", 0).await;

    let rule_id = seed_rule(&pool, "earn", "activity_participation", 10, Some(30), true).await;
    let activity_id = seed_published_activity(&pool, "完整出勤活动").await;

    // u1、u2 完整出勤；u3 只签到未签退；u4 报名未审核通过
    seed_registration(&pool, activity_id, u1, "approved", true, true).await;
    seed_registration(&pool, activity_id, u2, "approved", true, true).await;
    seed_registration(&pool, activity_id, u3, "approved", true, false).await;
    seed_registration(&pool, activity_id, u4, "pending", true, true).await;

    let resolver = RuleResolver::new(pool.clone());
    let rule = resolver
        .resolve_by_action_type("activity_participation")
        .await
        .unwrap();
    assert_eq!(rule.id, rule_id, "应解析到最新激活规则");

    let engine = SettlementEngine::new(pool.clone());
    let before = Utc::now();
    let summary = engine
        .settle_activity_completion(activity_id, &rule, 90000)
        .await
        .unwrap();
    let after = Utc::now();

    assert_eq!(summary.participants_count, 2, "只有完整出勤者获得积分");
    assert_eq!(summary.points_awarded, 20, "发放总量 = 人数 × 规则额度");

    assert_eq!(balance_of(&pool, u1).await, 10);
    assert_eq!(balance_of(&pool, u2).await, 10);
    assert_eq!(balance_of(&pool, u3).await, 0, "未签退不得分");
    assert_eq!(balance_of(&pool, u4).await, 0, "未审核通过不得分");

    // 活动应进入 completed
    let status: (String,) = sqlx::query_as("SELECT status FROM activities WHERE id = $1")
        .bind(activity_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status.0, "completed");

    // 账本记录引用活动，且批次共享同一过期时间
    let expires: Vec<(Option<chrono::DateTime<Utc>>,)> = sqlx::query_as(
        "SELECT expire_at FROM point_transactions WHERE reference_id = $1 AND reference_type = 'activity'",
    )
    .bind(activity_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(expires.len(), 2);
    assert_eq!(expires[0].0, expires[1].0, "同一批次过期时间一致");

    // 过期时间 = 结算时刻 + validity_days
    let expire_at = expires[0].0.expect("30 天有效期规则必须产生过期时间");
    assert!(
        expire_at >= before + Duration::days(30) && expire_at <= after + Duration::days(30),
        "过期时间应为结算时刻 + 30 天，实际 {}",
        expire_at
    );

    cleanup(&pool, &[u1, u2, u3, u4]).await;
}

/// 重复完成：第二次结算被拒绝，余额不重复增加
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_activity_completion_rejected_twice() {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let user_id = 91010;

    cleanup(&pool, &[user_id]).await;
    seed_user(&pool, user_id, "settle_twice_1", 0).await;
    seed_rule(&pool, "earn", "activity_participation", 5, None, true).await;
    let activity_id = seed_published_activity(&pool, "重复结算活动").await;
    seed_registration(&pool, activity_id, user_id, "approved", true, true).await;

    let resolver = RuleResolver::new(pool.clone());
    let rule = resolver
        .resolve_by_action_type("activity_participation")
        .await
        .unwrap();
    let engine = SettlementEngine::new(pool.clone());

    engine
        .settle_activity_completion(activity_id, &rule, 90000)
        .await
        .unwrap();
    assert_eq!(balance_of(&pool, user_id).await, 5);

    let second = engine
        .settle_activity_completion(activity_id, &rule, 90000)
        .await;
    assert!(matches!(
        second,
        Err(PointsError::InvalidStatusTransition { .. })
    ));
    assert_eq!(balance_of(&pool, user_id).await, 5, "余额不得重复增加");

    cleanup(&pool, &[user_id]).await;
}

/// 无合格参与者：活动照常完成，不写任何账本记录
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_activity_completion_no_eligible_participants() {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let user_id = 91020;

    cleanup(&pool, &[user_id]).await;
    seed_user(&pool, user_id, "settle_empty_1", 0).await;
    seed_rule(&pool, "earn", "activity_participation", 8, None, true).await;
    let activity_id = seed_published_activity(&pool, "无人出勤活动").await;
    seed_registration(&pool, activity_id, user_id, "approved", false, false).await;

    let resolver = RuleResolver::new(pool.clone());
    let rule = resolver
        .resolve_by_action_type("activity_participation")
        .await
        .unwrap();
    let engine = SettlementEngine::new(pool.clone());

    let summary = engine
        .settle_activity_completion(activity_id, &rule, 90000)
        .await
        .unwrap();
    assert_eq!(summary.participants_count, 0);

    let status: (String,) = sqlx::query_as("SELECT status FROM activities WHERE id = $1")
        .bind(activity_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status.0, "completed", "无人出勤也照常完成");

    cleanup(&pool, &[user_id]).await;
}

/// 规则解析：禁用规则不返回，多规则取最新创建
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_rule_resolution_latest_active_wins() {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let action = "settle_resolution_action";

    let _old = seed_rule(&pool, "earn", action, 3, None, true).await;
    let _disabled = seed_rule(&pool, "earn", action, 99, None, false).await;
    let newest = seed_rule(&pool, "earn", action, 7, None, true).await;

    let resolver = RuleResolver::new(pool.clone());
    let rule = resolver.resolve_by_action_type(action).await.unwrap();
    assert_eq!(rule.id, newest, "最新激活规则生效，禁用规则跳过");
    assert_eq!(rule.points, 7);

    // 无激活规则的行为类型解析失败
    let missing = resolver.resolve_by_action_type("settle_no_such_action").await;
    assert!(matches!(missing, Err(PointsError::NoActiveRuleForAction(_))));

    // 禁用规则按 ID 解析也被拒绝
    let repo = RuleRepository::new(pool.clone());
    repo.set_active(newest, false).await.unwrap();
    let inactive = resolver.resolve_by_id(newest).await;
    assert!(matches!(inactive, Err(PointsError::RuleInactive(_))));
}

/// 完成结算的账本方向固定为 earn：即使解析到 consume 规则，
/// 账本记录与余额增量同号，对账恒等式不被破坏
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_completion_ledger_direction_always_earn() {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let user_id = 91070;

    cleanup(&pool, &[user_id]).await;
    seed_user(&pool, user_id, "settle_direction_1", 0).await;
    let rule_id = seed_rule(&pool, "consume", "settle_direction_action", 20, None, true).await;
    let activity_id = seed_published_activity(&pool, "方向固定活动").await;
    seed_registration(&pool, activity_id, user_id, "approved", true, true).await;

    let resolver = RuleResolver::new(pool.clone());
    let rule = resolver.resolve_by_id(rule_id).await.unwrap();
    let engine = SettlementEngine::new(pool.clone());

    engine
        .settle_activity_completion(activity_id, &rule, 90000)
        .await
        .unwrap();

    let types: Vec<(String,)> = sqlx::query_as(
        "SELECT transaction_type FROM point_transactions WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].0, "earn", "完成结算只发放，方向不随规则漂移");

    // 余额与账本带符号求和一致
    let ledger = LedgerRepository::new(pool.clone());
    assert_eq!(balance_of(&pool, user_id).await, 20);
    assert_eq!(ledger.signed_sum(user_id).await.unwrap(), 20);

    cleanup(&pool, &[user_id]).await;
}

/// 批次中途失败：整体回滚，不留账本记录，活动保持 published
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_completion_mid_batch_failure_rolls_back_everything() {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let (u_ok, u_blocked) = (91080, 91081);

    cleanup(&pool, &[u_ok, u_blocked]).await;
    seed_user(&pool, u_ok, "settle_rollback_1", 0).await;
    seed_user(&pool, u_blocked, "settle_rollback_2", 0).await;
    let rule_id = seed_rule(&pool, "earn", "settle_rollback_action", 10, None, true).await;
    let activity_id = seed_published_activity(&pool, "中途失败活动").await;
    seed_registration(&pool, activity_id, u_ok, "approved", true, true).await;
    seed_registration(&pool, activity_id, u_blocked, "approved", true, true).await;

    // 触发器让第二位参与者（user_id 较大，排序靠后）的账本写入失败，
    // 第一位参与者此时已在事务内完成写入
    sqlx::raw_sql(&format!(
        r#"
        CREATE OR REPLACE FUNCTION settle_rollback_block() RETURNS trigger
        LANGUAGE plpgsql AS $$
        BEGIN
            IF NEW.user_id = {u_blocked} THEN
                RAISE EXCEPTION 'settle_rollback_block';
            END IF;
            RETURN NEW;
        END
        $$;
        DROP TRIGGER IF EXISTS settle_rollback_trigger ON point_transactions;
        CREATE TRIGGER settle_rollback_trigger
            BEFORE INSERT ON point_transactions
            FOR EACH ROW EXECUTE FUNCTION settle_rollback_block();
        "#
    ))
    .execute(&pool)
    .await
    .expect("安装测试触发器失败");

    let resolver = RuleResolver::new(pool.clone());
    let rule = resolver.resolve_by_id(rule_id).await.unwrap();
    let engine = SettlementEngine::new(pool.clone());

    let result = engine
        .settle_activity_completion(activity_id, &rule, 90000)
        .await;
    assert!(matches!(result, Err(PointsError::Database(_))));

    sqlx::raw_sql(
        r#"
        DROP TRIGGER IF EXISTS settle_rollback_trigger ON point_transactions;
        DROP FUNCTION IF EXISTS settle_rollback_block();
        "#,
    )
    .execute(&pool)
    .await
    .expect("卸载测试触发器失败");

    // 全有或全无：第一位参与者已写入的记录也随事务回滚
    let rows: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM point_transactions WHERE user_id IN ($1, $2)",
    )
    .bind(u_ok)
    .bind(u_blocked)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(rows.0, 0, "中途失败不得留下任何账本记录");
    assert_eq!(balance_of(&pool, u_ok).await, 0, "已处理参与者的余额也回滚");
    assert_eq!(balance_of(&pool, u_blocked).await, 0);

    let status: (String,) = sqlx::query_as("SELECT status FROM activities WHERE id = $1")
        .bind(activity_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status.0, "published", "状态流转随批次一起回滚");

    cleanup(&pool, &[u_ok, u_blocked]).await;
}

// ==================== 手动结算 ====================

/// 手动发放：使用规则默认额度，账本与余额一致
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_manual_earn_default_points() {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let user_id = 91030;

    cleanup(&pool, &[user_id]).await;
    seed_user(&pool, user_id, "settle_manual_1", 0).await;
    let rule_id = seed_rule(&pool, "earn", "settle_manual_bonus", 20, None, true).await;

    let resolver = RuleResolver::new(pool.clone());
    let rule = resolver.resolve_by_id(rule_id).await.unwrap();
    let engine = SettlementEngine::new(pool.clone());

    let outcome = engine
        .settle_manual(
            &rule,
            &ManualSettlement {
                user_id,
                points_override: None,
                description: Some("表现优秀".to_string()),
                operator_id: 90000,
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.points, 20);
    assert_eq!(outcome.transaction_type, TransactionType::Earn);
    assert_eq!(outcome.new_balance, 20);
    assert_eq!(balance_of(&pool, user_id).await, 20);

    // 余额对账：账本带符号求和等于物化余额
    let ledger = LedgerRepository::new(pool.clone());
    assert_eq!(ledger.signed_sum(user_id).await.unwrap(), 20);

    cleanup(&pool, &[user_id]).await;
}

/// 手动扣除余额不足：拒绝且不留账本记录
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_manual_consume_insufficient_balance() {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let user_id = 91040;

    cleanup(&pool, &[user_id]).await;
    seed_user(&pool, user_id, "settle_manual_2", 5).await;
    let rule_id = seed_rule(&pool, "consume", "settle_manual_deduct", 10, None, true).await;

    let resolver = RuleResolver::new(pool.clone());
    let rule = resolver.resolve_by_id(rule_id).await.unwrap();
    let engine = SettlementEngine::new(pool.clone());

    let result = engine
        .settle_manual(
            &rule,
            &ManualSettlement {
                user_id,
                points_override: None,
                description: None,
                operator_id: 90000,
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(PointsError::InsufficientPoints {
            required: 10,
            available: 5
        })
    ));
    assert_eq!(balance_of(&pool, user_id).await, 5, "余额不变");

    let ledger = LedgerRepository::new(pool.clone());
    let entries = ledger
        .list_by_user(user_id, &LedgerFilter::default())
        .await
        .unwrap();
    assert!(entries.is_empty(), "失败的结算不留账本记录");

    cleanup(&pool, &[user_id]).await;
}

/// 手动结算覆盖额度：points_override 优先于规则默认值
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_manual_points_override() {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let user_id = 91050;

    cleanup(&pool, &[user_id]).await;
    seed_user(&pool, user_id, "settle_manual_3", 100).await;
    let rule_id = seed_rule(&pool, "consume", "settle_manual_override", 10, None, true).await;

    let resolver = RuleResolver::new(pool.clone());
    let rule = resolver.resolve_by_id(rule_id).await.unwrap();
    let engine = SettlementEngine::new(pool.clone());

    let outcome = engine
        .settle_manual(
            &rule,
            &ManualSettlement {
                user_id,
                points_override: Some(30),
                description: None,
                operator_id: 90000,
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.points, 30);
    assert_eq!(outcome.new_balance, 70);

    // 非正覆盖额度被拒绝
    let bad = engine
        .settle_manual(
            &rule,
            &ManualSettlement {
                user_id,
                points_override: Some(0),
                description: None,
                operator_id: 90000,
            },
        )
        .await;
    assert!(matches!(bad, Err(PointsError::Validation(_))));

    cleanup(&pool, &[user_id]).await;
}

/// 并发扣除：两个同时的 consume 只有一个成功，余额不为负
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_concurrent_consume_serialized_by_row_lock() {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    let user_id = 91060;

    cleanup(&pool, &[user_id]).await;
    seed_user(&pool, user_id, "settle_concurrent_1", 10).await;
    let rule_id = seed_rule(&pool, "consume", "settle_concurrent_deduct", 10, None, true).await;

    let resolver = RuleResolver::new(pool.clone());
    let rule = resolver.resolve_by_id(rule_id).await.unwrap();
    let engine = SettlementEngine::new(pool.clone());

    let settlement = ManualSettlement {
        user_id,
        points_override: None,
        description: None,
        operator_id: 90000,
    };

    let (r1, r2) = tokio::join!(
        engine.settle_manual(&rule, &settlement),
        engine.settle_manual(&rule, &settlement),
    );

    let successes = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "行锁串行化后只有一次扣除成功");
    assert_eq!(balance_of(&pool, user_id).await, 0, "余额恰好扣到 0，不为负");

    cleanup(&pool, &[user_id]).await;
}
