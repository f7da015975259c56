// ==========================================
// 派生数据生成编排集成测试
// ==========================================
// 覆盖: 在途锁拒绝、锁在所有出口释放、最终一致补偿、
//       空结果软成功、远端错误原样透出、重复生成
// ==========================================

mod helpers;

use helpers::test_data_builder::*;
use helpers::test_env::{today, TestEnv, TENANT};
use mo_lifecycle::domain::types::{GenerationKind, OrderStatus};
use mo_lifecycle::engine::{
    EventLevel, EventTopic, GenerationOutcome, LifecycleError, TransitionRequest,
};

// ==========================================
// 并发控制
// ==========================================

#[tokio::test]
async fn test_second_concurrent_call_rejected() {
    let env = TestEnv::new();
    let order = OrderBuilder::new("MO-1").insert(&env.repos);
    seed_sale_order_lines(&env.repos, TENANT, &order.sale_order_id, 1);
    env.remote.set_hold(true);

    let first = env.orchestrator.generate(&order, GenerationKind::Bom);
    let second = async {
        // 第一个调用已进入远端
        env.remote.entered.notified().await;
        assert!(env.locks.is_held("MO-1", GenerationKind::Bom));

        let result = env.orchestrator.generate(&order, GenerationKind::Bom).await;

        env.remote.set_hold(false);
        env.remote.release.notify_one();
        result
    };
    let (first, second) = tokio::join!(first, second);

    match second {
        Err(LifecycleError::ConcurrencyRejection { order_id, kind }) => {
            assert_eq!(order_id, "MO-1");
            assert_eq!(kind, GenerationKind::Bom);
        }
        other => panic!("Expected ConcurrencyRejection, got {:?}", other),
    }
    assert!(matches!(
        first.unwrap(),
        GenerationOutcome::Completed { rows: 3, .. }
    ));

    // 被拒绝的调用没有到达远端
    assert_eq!(env.remote.calls(), 1);
    assert!(!env.locks.is_held("MO-1", GenerationKind::Bom));

    let rejections = env.events(EventTopic::BomGeneration, EventLevel::Rejection);
    assert_eq!(rejections.len(), 1);
    assert!(rejections[0].message.contains("generation already in progress"));

    // 锁释放后第三次调用正常执行
    let third = env
        .orchestrator
        .generate(&order, GenerationKind::Bom)
        .await
        .unwrap();
    assert!(!third.is_warning());
    assert_eq!(env.remote.calls(), 2);
}

#[tokio::test]
async fn test_bom_and_cut_list_locks_are_independent() {
    let env = TestEnv::new();
    let order = OrderBuilder::new("MO-1")
        .status(OrderStatus::Planned)
        .insert(&env.repos);

    let bom_lock = env.locks.try_acquire("MO-1", GenerationKind::Bom).unwrap();

    let outcome = env
        .orchestrator
        .generate(&order, GenerationKind::CutList)
        .await
        .unwrap();
    assert!(matches!(outcome, GenerationOutcome::Completed { rows: 3, .. }));

    let err = env
        .orchestrator
        .generate(&order, GenerationKind::Bom)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::ConcurrencyRejection { .. }));

    drop(bom_lock);
    assert_eq!(env.locks.held_count(), 0);
}

// ==========================================
// 生成后推进
// ==========================================

#[tokio::test]
async fn test_generate_bom_then_plan() {
    let env = TestEnv::new();
    let order = OrderBuilder::new("MO-1").insert(&env.repos);
    seed_sale_order_lines(&env.repos, TENANT, &order.sale_order_id, 3);

    let err = env
        .state_machine
        .request_transition(&order, OrderStatus::Planned, today())
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Validation(_)));

    let outcome = env
        .orchestrator
        .generate(&order, GenerationKind::Bom)
        .await
        .unwrap();
    // 3 行销售订单行 × 每行 3 条明细
    assert_eq!(
        outcome,
        GenerationOutcome::Completed {
            kind: GenerationKind::Bom,
            rows: 9
        }
    );
    assert_eq!(env.compensation.settled(), 1);

    let request = env
        .state_machine
        .request_transition(&order, OrderStatus::Planned, today())
        .await
        .unwrap();
    assert!(matches!(request, TransitionRequest::AwaitingConfirmation(_)));

    let successes = env.events(EventTopic::BomGeneration, EventLevel::Success);
    assert_eq!(successes.len(), 1);
    assert_eq!(successes[0].message, "bom generated: 9 rows");
}

#[tokio::test]
async fn test_rows_committed_during_compensation_are_seen() {
    let env = TestEnv::new();
    let order = OrderBuilder::new("MO-1").insert(&env.repos);
    seed_sale_order_lines(&env.repos, TENANT, &order.sale_order_id, 2);

    // 远端只受理，派生行在补偿等待期间才可见
    env.remote.set_deferred(true);

    let outcome = env
        .orchestrator
        .generate(&order, GenerationKind::Bom)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        GenerationOutcome::Completed {
            kind: GenerationKind::Bom,
            rows: 6
        }
    );
    assert_eq!(env.remote.pending_count(), 0);
}

// ==========================================
// 软成功
// ==========================================

#[tokio::test]
async fn test_empty_cut_list_is_consistency_warning() {
    let env = TestEnv::new();
    let order = OrderBuilder::new("MO-1")
        .status(OrderStatus::Planned)
        .insert(&env.repos);
    env.remote.set_cut_lines(0);

    let outcome = env
        .orchestrator
        .generate(&order, GenerationKind::CutList)
        .await
        .unwrap();

    match &outcome {
        GenerationOutcome::ConsistencyWarning { kind, message } => {
            assert_eq!(*kind, GenerationKind::CutList);
            assert!(message.contains("no rows are visible yet"));
        }
        other => panic!("Expected ConsistencyWarning, got {:?}", other),
    }
    assert!(!env.locks.is_held("MO-1", GenerationKind::CutList));
    assert_eq!(
        env.events(EventTopic::CutListGeneration, EventLevel::Warning).len(),
        1
    );
    assert!(env
        .events(EventTopic::CutListGeneration, EventLevel::Error)
        .is_empty());
}

#[tokio::test]
async fn test_verification_read_failure_is_warning() {
    let env = TestEnv::new();
    let order = OrderBuilder::new("MO-1").insert(&env.repos);
    seed_sale_order_lines(&env.repos, TENANT, &order.sale_order_id, 1);
    env.store.set_fail_line_reads(true);

    let outcome = env
        .orchestrator
        .generate(&order, GenerationKind::Bom)
        .await
        .unwrap();
    match outcome {
        GenerationOutcome::ConsistencyWarning { message, .. } => {
            assert!(message.contains("verification read failed"));
        }
        other => panic!("Expected ConsistencyWarning, got {:?}", other),
    }
    assert_eq!(env.locks.held_count(), 0);
}

// ==========================================
// 失败出口
// ==========================================

#[tokio::test]
async fn test_remote_failure_surfaced_verbatim() {
    let env = TestEnv::new();
    let order = OrderBuilder::new("MO-1")
        .status(OrderStatus::Planned)
        .insert(&env.repos);
    env.remote.fail_with("backend timeout after 30s");

    let err = env
        .orchestrator
        .generate(&order, GenerationKind::CutList)
        .await
        .unwrap_err();
    match &err {
        LifecycleError::Remote(remote) => {
            assert_eq!(remote.procedure, "generate_cut_list");
            assert_eq!(remote.message, "backend timeout after 30s");
        }
        other => panic!("Expected Remote, got {:?}", other),
    }
    assert_eq!(err.to_string(), "backend timeout after 30s");

    // 失败后不做补偿等待、不做校验读取
    assert_eq!(env.compensation.settled(), 0);
    assert!(!env.locks.is_held("MO-1", GenerationKind::CutList));

    let errors = env.events(EventTopic::CutListGeneration, EventLevel::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "backend timeout after 30s");

    // 手动重试
    env.remote.clear_failure();
    let outcome = env
        .orchestrator
        .generate(&order, GenerationKind::CutList)
        .await
        .unwrap();
    assert!(!outcome.is_warning());
}

#[tokio::test]
async fn test_wrong_status_rejected_before_remote() {
    let env = TestEnv::new();
    let draft = OrderBuilder::new("MO-1").insert(&env.repos);
    let planned = OrderBuilder::new("MO-2")
        .status(OrderStatus::Planned)
        .insert(&env.repos);

    let err = env
        .orchestrator
        .generate(&draft, GenerationKind::CutList)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Precondition {
            kind: GenerationKind::CutList,
            status: OrderStatus::Draft
        }
    ));

    let err = env
        .orchestrator
        .generate(&planned, GenerationKind::Bom)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Precondition { .. }));
    assert!(err.is_rejection());

    assert_eq!(env.remote.calls(), 0);
    assert_eq!(env.locks.held_count(), 0);
    assert_eq!(
        env.events(EventTopic::CutListGeneration, EventLevel::Rejection).len(),
        1
    );
}

// ==========================================
// 重复生成
// ==========================================

#[tokio::test]
async fn test_rerun_replaces_previous_output() {
    let env = TestEnv::new();
    let order = OrderBuilder::new("MO-1").insert(&env.repos);
    seed_sale_order_lines(&env.repos, TENANT, &order.sale_order_id, 1);

    for _ in 0..3 {
        let outcome = env
            .orchestrator
            .generate(&order, GenerationKind::Bom)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            GenerationOutcome::Completed {
                kind: GenerationKind::Bom,
                rows: 3
            }
        );
        assert_eq!(env.locks.held_count(), 0);
    }
    assert_eq!(env.remote.calls(), 3);
    assert_eq!(env.compensation.settled(), 3);
}
