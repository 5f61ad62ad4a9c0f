use super::*;
use futures_util::future::join_all;

#[tokio::test]
async fn issued_access_token_validates_to_its_subject() {
    let fx = Fixture::new();
    let subject = Fixture::subject();

    let pair = fx.service.issue(subject).await.unwrap();
    let claim = fx
        .service
        .validate(&pair.access_token.0, TokenType::Access)
        .await
        .unwrap();

    assert_eq!(claim.subject, subject);
    assert_eq!(claim.token_type, TokenType::Access);
    assert_eq!(claim.expires_at, start_time() + Duration::from_secs(60 * 60));
    assert_eq!(fx.store.inner.records_for(subject).len(), 1);
}

#[tokio::test]
async fn rotation_replaces_the_lineage_record() {
    let fx = Fixture::new();
    let subject = Fixture::subject();
    let first = fx.service.issue(subject).await.unwrap();

    let second = fx.service.refresh(&first.refresh_token.0).await.unwrap();

    assert_ne!(second.refresh_token, first.refresh_token);
    assert_ne!(second.access_token, first.access_token);
    assert_eq!(
        fx.service
            .validate(&first.refresh_token.0, TokenType::Refresh)
            .await,
        Err(TokenError::Revoked)
    );
    assert_eq!(
        fx.service
            .validate(&first.access_token.0, TokenType::Access)
            .await,
        Err(TokenError::Revoked)
    );
    assert!(
        fx.service
            .validate(&second.access_token.0, TokenType::Access)
            .await
            .is_ok()
    );

    let records = fx.store.inner.records_for(subject);
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].refresh_token_id,
        fx.claim_of(&second.refresh_token.0).token_id
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rotations_of_one_token_agree() {
    let fx = Fixture::new();
    let subject = Fixture::subject();
    let first = fx.service.issue(subject).await.unwrap();

    let handles = (0..16).map(|_| {
        let service = fx.service.clone();
        let token = first.refresh_token.0.clone();
        tokio::spawn(async move { service.refresh(&token).await })
    });
    let results: Vec<TokenPair> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert!(results.iter().all(|pair| *pair == results[0]));
    // one put for the issue, one for the rotation
    assert_eq!(fx.puts(), 2);
    assert_eq!(fx.store.inner.records_for(subject).len(), 1);
}

#[tokio::test]
async fn replay_inside_grace_window_returns_the_same_pair() {
    let fx = Fixture::new();
    let first = fx.service.issue(Fixture::subject()).await.unwrap();
    let second = fx.service.refresh(&first.refresh_token.0).await.unwrap();

    fx.clock.advance(Duration::from_secs(2));
    let replayed = fx.service.refresh(&first.refresh_token.0).await.unwrap();

    assert_eq!(replayed, second);
    assert_eq!(fx.puts(), 2);
}

#[tokio::test]
async fn replay_after_grace_window_is_revoked() {
    let fx = Fixture::new();
    let first = fx.service.issue(Fixture::subject()).await.unwrap();
    fx.service.refresh(&first.refresh_token.0).await.unwrap();

    fx.clock.advance(Duration::from_secs(10));

    assert_eq!(
        fx.service.refresh(&first.refresh_token.0).await,
        Err(TokenError::Revoked)
    );
    assert_eq!(fx.puts(), 2);
}

#[tokio::test]
async fn successor_can_be_rotated_in_turn() {
    let fx = Fixture::new();
    let subject = Fixture::subject();
    let first = fx.service.issue(subject).await.unwrap();
    let second = fx.service.refresh(&first.refresh_token.0).await.unwrap();

    let third = fx.service.refresh(&second.refresh_token.0).await.unwrap();

    assert_ne!(third, second);
    assert_eq!(fx.store.inner.records_for(subject).len(), 1);
}

#[tokio::test]
async fn logout_revokes_every_lineage_and_blocks_replays() {
    let fx = Fixture::new();
    let subject = Fixture::subject();
    let laptop = fx.service.issue(subject).await.unwrap();
    let phone = fx.service.issue(subject).await.unwrap();
    let laptop_next = fx.service.refresh(&laptop.refresh_token.0).await.unwrap();

    assert_eq!(fx.service.logout(subject).await.unwrap(), 2);

    for access in [&phone.access_token, &laptop_next.access_token] {
        assert_eq!(
            fx.service.validate(&access.0, TokenType::Access).await,
            Err(TokenError::Revoked)
        );
    }
    // still inside the grace window of the laptop rotation
    assert_eq!(
        fx.service.refresh(&laptop.refresh_token.0).await,
        Err(TokenError::Revoked)
    );
    assert_eq!(
        fx.service.refresh(&phone.refresh_token.0).await,
        Err(TokenError::Revoked)
    );
    assert_eq!(
        fx.service.refresh(&laptop_next.refresh_token.0).await,
        Err(TokenError::Revoked)
    );
}

#[tokio::test]
async fn logout_leaves_other_subjects_alone() {
    let fx = Fixture::new();
    let alice = Fixture::subject();
    let bob = Fixture::subject();
    fx.service.issue(alice).await.unwrap();
    let bobs = fx.service.issue(bob).await.unwrap();

    fx.service.logout(alice).await.unwrap();

    assert!(fx.service.refresh(&bobs.refresh_token.0).await.is_ok());
}

#[tokio::test]
async fn access_token_cannot_be_rotated() {
    let fx = Fixture::new();
    let pair = fx.service.issue(Fixture::subject()).await.unwrap();

    assert_eq!(
        fx.service.refresh(&pair.access_token.0).await,
        Err(TokenError::WrongTokenType)
    );
    assert_eq!(fx.puts(), 1);
}

#[tokio::test]
async fn expired_refresh_token_is_rejected() {
    let fx = Fixture::new();
    let pair = fx.service.issue(Fixture::subject()).await.unwrap();

    fx.clock.advance(Duration::from_secs(31 * 24 * 60 * 60));

    assert_eq!(
        fx.service.refresh(&pair.refresh_token.0).await,
        Err(TokenError::Expired)
    );
}

#[tokio::test]
async fn garbage_is_malformed() {
    let fx = Fixture::new();
    assert_eq!(
        fx.service.refresh("definitely.not.a-jwt").await,
        Err(TokenError::Malformed)
    );
}

#[tokio::test]
async fn failed_install_keeps_the_old_pair() {
    let fx = Fixture::new();
    let subject = Fixture::subject();
    let first = fx.service.issue(subject).await.unwrap();

    fx.store.fail_puts.store(true, Ordering::SeqCst);
    let err = fx.service.refresh(&first.refresh_token.0).await.unwrap_err();

    assert!(matches!(err, TokenError::StoreFailure(_)));
    assert!(
        fx.service
            .validate(&first.refresh_token.0, TokenType::Refresh)
            .await
            .is_ok()
    );
    assert_eq!(fx.cache.get(fx.claim_of(&first.refresh_token.0).token_id).await.unwrap(), None);

    // lock was released on the failure path, so a retry goes straight through
    fx.store.fail_puts.store(false, Ordering::SeqCst);
    assert!(fx.service.refresh(&first.refresh_token.0).await.is_ok());
}

#[tokio::test]
async fn failed_delete_removes_the_new_record_again() {
    let fx = Fixture::new();
    let subject = Fixture::subject();
    let first = fx.service.issue(subject).await.unwrap();

    fx.store.fail_next_delete.store(true, Ordering::SeqCst);
    let err = fx.service.refresh(&first.refresh_token.0).await.unwrap_err();

    assert!(matches!(err, TokenError::StoreFailure(_)));
    let records = fx.store.inner.records_for(subject);
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].refresh_token_id,
        fx.claim_of(&first.refresh_token.0).token_id
    );
}

#[tokio::test(start_paused = true)]
async fn contended_lock_reports_timeout_and_retry_succeeds() {
    let fx = Fixture::new();
    let subject = Fixture::subject();
    let first = fx.service.issue(subject).await.unwrap();
    let held = fx
        .lock
        .acquire(&format!("rotate:{}", subject), Duration::from_secs(30), Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(
        fx.service.refresh(&first.refresh_token.0).await,
        Err(TokenError::LockTimeout)
    );
    assert_eq!(fx.puts(), 1);

    fx.lock.release(&held).await.unwrap();
    assert!(fx.service.refresh(&first.refresh_token.0).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn stuck_holder_is_outlived_by_its_lease() {
    let fx = Fixture::with_config(SessionConfig {
        lock_wait: Duration::from_secs(5),
        ..config()
    });
    let subject = Fixture::subject();
    let first = fx.service.issue(subject).await.unwrap();
    // acquired and never released, as if the holder crashed
    fx.lock
        .acquire(&format!("rotate:{}", subject), config().lock_lease, Duration::ZERO)
        .await
        .unwrap();

    let started = tokio::time::Instant::now();
    let rotated = fx.service.refresh(&first.refresh_token.0).await;

    assert!(rotated.is_ok());
    assert!(started.elapsed() >= config().lock_lease);
    assert!(started.elapsed() <= config().lock_lease * 2);
}

#[tokio::test]
async fn rotation_emits_start_and_outcome_events() {
    let fx = Fixture::new();
    let first = fx.service.issue(Fixture::subject()).await.unwrap();
    fx.telemetry.events.lock().unwrap().clear();

    fx.service.refresh(&first.refresh_token.0).await.unwrap();
    fx.service.refresh(&first.access_token.0).await.unwrap_err();

    let events = fx.telemetry.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            TelemetryEvent { operation: Operation::Rotate, phase: Phase::Start },
            TelemetryEvent { operation: Operation::Rotate, phase: Phase::Success },
            TelemetryEvent { operation: Operation::Rotate, phase: Phase::Start },
            TelemetryEvent {
                operation: Operation::Rotate,
                phase: Phase::Failure("wrong_token_type"),
            },
        ]
    );
}

#[tokio::test]
async fn logout_landing_before_commit_wins_over_rotation() {
    let fx = Fixture::new();
    let subject = Fixture::subject();
    let first = fx.service.issue(subject).await.unwrap();
    let old_id = fx.claim_of(&first.refresh_token.0).token_id;

    fx.store.logout_before_next_put.store(true, Ordering::SeqCst);

    assert_eq!(
        fx.service.refresh(&first.refresh_token.0).await,
        Err(TokenError::Revoked)
    );
    // the freshly installed record was removed again and nothing was cached
    assert!(fx.store.inner.records_for(subject).is_empty());
    assert_eq!(fx.cache.get(old_id).await.unwrap(), None);
    assert_eq!(
        fx.service.refresh(&first.refresh_token.0).await,
        Err(TokenError::Revoked)
    );
}

#[tokio::test]
async fn unreachable_cache_does_not_fail_rotation() {
    let cache = Arc::new(BrokenCache::default());
    let fx = Fixture::with_cache(cache.clone());
    let subject = Fixture::subject();
    let first = fx.service.issue(subject).await.unwrap();

    let second = fx.service.refresh(&first.refresh_token.0).await.unwrap();

    // probed before and under the lock, populated once
    assert_eq!(cache.gets.load(Ordering::SeqCst), 2);
    assert_eq!(cache.puts.load(Ordering::SeqCst), 1);
    assert!(
        fx.service
            .validate(&second.access_token.0, TokenType::Access)
            .await
            .is_ok()
    );
    assert_eq!(fx.puts(), 2);

    // without the cache there is no grace window to replay from
    assert_eq!(
        fx.service.refresh(&first.refresh_token.0).await,
        Err(TokenError::Revoked)
    );
    assert_eq!(fx.puts(), 2);
}
