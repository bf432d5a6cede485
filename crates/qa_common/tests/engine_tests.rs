//! End-to-end tests for the QA engine: matching phases, concurrency, legacy import.

use qa_common::config::QaConfig;
use qa_common::{Answer, MemorySwitchGate, Provenance, QaEngine};
use std::sync::Arc;
use tempfile::tempdir;

fn engine_in(dir: &tempfile::TempDir) -> Arc<QaEngine> {
    let mut config = QaConfig::default();
    config.storage.data_dir = dir.path().to_path_buf();
    Arc::new(QaEngine::new(config, Arc::new(MemorySwitchGate::default())))
}

#[tokio::test]
async fn test_empty_namespace_returns_no_match() {
    let dir = tempdir().unwrap();
    let engine = engine_in(&dir);
    assert_eq!(engine.ask("100001", "anything").await.unwrap(), Answer::NoMatch);
}

#[tokio::test]
async fn test_exact_echo_of_question() {
    let dir = tempdir().unwrap();
    let engine = engine_in(&dir);
    engine.upsert("100001", "服务器IP是多少", "play.example.net").await.unwrap();

    let Answer::Matched(result) = engine.ask("100001", "服务器IP是多少").await.unwrap() else {
        panic!("expected an exact match");
    };
    assert_eq!(result.answer, "play.example.net");
    assert_eq!(result.provenance, Provenance::Exact);
    assert_eq!(result.score, 1.0);
}

#[tokio::test]
async fn test_reordered_question_matches_globally() {
    let dir = tempdir().unwrap();
    let engine = engine_in(&dir);
    engine.upsert("100001", "how to reset password", "Use /reset").await.unwrap();
    engine.upsert("100001", "where is the rules page", "See /rules").await.unwrap();

    let answer = engine.ask("100001", "reset password how to").await.unwrap();
    let Answer::Matched(result) = answer else {
        panic!("expected a global match");
    };
    assert_eq!(result.question, "how to reset password");
    assert_eq!(result.provenance, Provenance::Global);
}

#[tokio::test]
async fn test_idempotent_upsert_and_missing_delete() {
    let dir = tempdir().unwrap();
    let engine = engine_in(&dir);

    engine.upsert("100001", "q", "a").await.unwrap();
    let second = engine.upsert("100001", "q", "a").await.unwrap();
    assert!(!second.is_new());
    assert_eq!(engine.list("100001").await.unwrap().len(), 1);

    assert!(!engine.delete("100001", "never added").await.unwrap());
    assert_eq!(engine.list("100001").await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_are_not_lost() {
    let dir = tempdir().unwrap();
    let engine = engine_in(&dir);

    let mut handles = Vec::new();
    for i in 0..20 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .upsert("100001", &format!("question {}", i), &format!("answer {}", i))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let list = engine.list("100001").await.unwrap();
    assert_eq!(list.len(), 20);
    for i in 0..20 {
        let question = format!("question {}", i);
        assert!(list.iter().any(|(q, _)| *q == question), "{} missing", question);
    }
}

#[test]
fn test_concurrent_store_writers_same_namespace() {
    let dir = tempdir().unwrap();
    let engine = engine_in(&dir);
    let store = engine.knowledge().store("100002").unwrap();

    std::thread::scope(|scope| {
        let a = Arc::clone(&store);
        let b = Arc::clone(&store);
        scope.spawn(move || a.upsert("first question", "1").unwrap());
        scope.spawn(move || b.upsert("second question", "2").unwrap());
    });

    let questions: Vec<String> = store.list().unwrap().into_iter().map(|(q, _)| q).collect();
    assert_eq!(questions.len(), 2);
    assert!(questions.contains(&"first question".to_string()));
    assert!(questions.contains(&"second question".to_string()));
}

#[test]
fn test_first_access_from_many_threads_loses_no_writes() {
    for round in 0..40 {
        let dir = tempdir().unwrap();
        let engine = engine_in(&dir);
        let knowledge = engine.knowledge();

        let failures: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    scope.spawn(move || {
                        knowledge
                            .store("fresh")
                            .and_then(|store| store.upsert(&format!("q{}", i), "a"))
                    })
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().unwrap().err())
                .map(|e| e.to_string())
                .collect()
        });

        assert!(failures.is_empty(), "round {}: {:?}", round, failures);
        assert_eq!(knowledge.store("fresh").unwrap().count().unwrap(), 16);
    }
}

#[tokio::test]
async fn test_legacy_import_then_match() {
    let dir = tempdir().unwrap();
    let engine = engine_in(&dir);
    let path = dir.path().join("legacy.json");
    std::fs::write(
        &path,
        r#"[{"keyword": "服务器", "question": {"服务器IP是多少": "play.example.net"}}]"#,
    )
    .unwrap();

    let report = engine.import_legacy("100003", path).await.unwrap();
    assert_eq!(report.imported, 1);
    assert!(engine.ask("100003", "服务器IP是多少").await.unwrap().is_match());
}

#[tokio::test]
async fn test_per_namespace_threshold_override() {
    let dir = tempdir().unwrap();
    let mut config = QaConfig::default();
    config.storage.data_dir = dir.path().to_path_buf();
    config.suggest.enabled = false;
    let config = QaConfig {
        matching: QaConfig::from_toml(
            r#"
            [matching.namespaces.strict]
            global_threshold = 1.0
            containment_threshold = 1.0
            "#,
        )
        .unwrap()
        .matching,
        ..config
    };
    let engine = QaEngine::new(config, Arc::new(MemorySwitchGate::default()));

    for ns in ["strict", "loose"] {
        engine.upsert(ns, "how to reset password", "Use /reset").await.unwrap();
    }

    // One token short of the stored question
    let query = "how to reset";
    assert_eq!(engine.ask("strict", query).await.unwrap(), Answer::NoMatch);
    assert!(engine.ask("loose", query).await.unwrap().is_match());
}
