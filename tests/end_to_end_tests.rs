//! 基于 SQLite 存储的端到端测试：HTTP 请求经过完整的服务与后台循环

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tower::ServiceExt;

use scheduler_api::{create_app, AppState};
use scheduler_application::{
    run_deferred_trigger_loop, run_fire_loop, ActionRunner, DeferredJobTrigger, JobTrigger,
    RunJobActionRunner, SchedulerContext,
};
use scheduler_config::{ApiConfig, DatabaseBackend, DatabaseConfig};
use scheduler_infrastructure::{CronTriggerRegistry, RepositoryFactory};
use scheduler_testing_utils::TestEnv;

struct Stack {
    router: Router,
    shutdown_tx: broadcast::Sender<()>,
    _dir: TempDir,
}

impl Stack {
    async fn start(dir: TempDir) -> Self {
        let config = DatabaseConfig {
            backend: DatabaseBackend::Sqlite,
            url: format!("sqlite://{}", dir.path().join("scheduler.db").display()),
            ..DatabaseConfig::default()
        };
        let repositories = RepositoryFactory::create(&config).await.unwrap();

        let (registry, fire_rx) = CronTriggerRegistry::new(Duration::from_millis(50));
        let (deferred, deferred_rx) = DeferredJobTrigger::channel();
        let runners: Vec<Arc<dyn ActionRunner>> =
            vec![Arc::new(RunJobActionRunner::new(Arc::new(deferred)))];
        let context = SchedulerContext::build(
            repositories.job_repository,
            repositories.task_repository,
            Arc::new(registry.clone()),
            runners,
        )
        .unwrap();
        context.scheduler.reconcile().await.unwrap();

        let (shutdown_tx, _) = broadcast::channel(4);
        {
            let shutdown_rx = shutdown_tx.subscribe();
            tokio::spawn(async move { registry.run(shutdown_rx).await });
        }
        tokio::spawn(run_fire_loop(
            fire_rx,
            context.job_service.clone(),
            shutdown_tx.subscribe(),
        ));
        let trigger: Arc<dyn JobTrigger> = context.job_service.clone();
        tokio::spawn(run_deferred_trigger_loop(
            deferred_rx,
            trigger,
            shutdown_tx.subscribe(),
        ));

        let state = AppState {
            job_service: context.job_service.clone(),
            metrics: None,
        };
        Self {
            router: create_app(state, &ApiConfig::default()),
            shutdown_tx,
            _dir: dir,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn task_count(&self, job_key: &str) -> usize {
        let (_, body) = self
            .send(Method::GET, &format!("/api/jobs/{job_key}/tasks"), None)
            .await;
        body["data"].as_array().map(Vec::len).unwrap_or(0)
    }

    fn stop(self) -> TempDir {
        let _ = self.shutdown_tx.send(());
        self._dir
    }
}

#[tokio::test]
async fn test_execute_and_chain_over_sqlite() {
    let stack = Stack::start(TempDir::new().unwrap()).await;
    let stack_ref = &stack;

    let (status, _) = stack
        .send(
            Method::POST,
            "/api/jobs",
            Some(json!({ "key": "JOB_B", "information": { "name": "target" } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = stack
        .send(
            Method::POST,
            "/api/jobs",
            Some(json!({
                "key": "JOB_A",
                "information": { "name": "source" },
                "actions": [
                    { "condition": "ON_SUCCESS", "type": "RUN_JOB", "target_job_key": "JOB_B" }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = stack.send(Method::POST, "/api/jobs/JOB_A/execute", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    assert!(
        TestEnv::wait_for(
            move || async move { stack_ref.task_count("JOB_A").await == 1 },
            Duration::from_secs(2)
        )
        .await
    );

    let (_, latest) = stack.send(Method::GET, "/api/jobs/JOB_A/tasks/latest", None).await;
    assert_eq!(latest["data"]["status"], "CREATED");
    let task_id = latest["data"]["id"].as_i64().unwrap();

    let (status, body) = stack
        .send(
            Method::PUT,
            &format!("/api/jobs/JOB_A/tasks/{task_id}/status"),
            Some(json!({ "status": "SUCCESS" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "SUCCESS");

    assert!(
        TestEnv::wait_for(
            move || async move { stack_ref.task_count("JOB_B").await == 1 },
            Duration::from_secs(2)
        )
        .await
    );

    let (_, body) = stack
        .send(Method::GET, "/api/tasks?status=SUCCESS", None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    stack.stop();
}

#[tokio::test]
async fn test_schedules_survive_restart() {
    let stack = Stack::start(TempDir::new().unwrap()).await;

    let (status, _) = stack
        .send(
            Method::POST,
            "/api/jobs",
            Some(json!({
                "key": "NIGHTLY",
                "information": { "name": "nightly export", "tags": ["export"] },
                "cron_expression": "0 0 3 * * *"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = stack.send(Method::POST, "/api/jobs/NIGHTLY/disable", None).await;
    assert_eq!(status, StatusCode::OK);

    let dir = stack.stop();
    let stack = Stack::start(dir).await;

    let (status, body) = stack.send(Method::GET, "/api/jobs/NIGHTLY/schedule", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["enabled"], false);
    assert_eq!(body["data"]["scheduled"], false);

    let (status, _) = stack.send(Method::POST, "/api/jobs/NIGHTLY/enable", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = stack.send(Method::GET, "/api/jobs/NIGHTLY/schedule", None).await;
    assert_eq!(body["data"]["scheduled"], true);
    assert_eq!(body["data"]["enabled"], true);
    assert!(body["data"]["next_fire_time"].is_string());

    let (_, body) = stack.send(Method::GET, "/api/jobs?tags=export", None).await;
    assert_eq!(body["data"][0]["key"], "NIGHTLY");

    stack.stop();
}
