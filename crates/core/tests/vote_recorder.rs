//! Vote recorder behaviour against a real (in-memory) database.

#![allow(clippy::unwrap_used)]

mod common;

use std::net::{IpAddr, Ipv4Addr};

use chrono::{Duration, Utc};
use common::*;
use evote_common::AppError;
use evote_core::{VoteKind, VoteRecorder};
use evote_db::entities::event;
use evote_db::entities::event::VoteType;
use evote_db::repositories::{EventRepository, VoteRepository};
use sea_orm::{Set, TransactionTrait};

fn ip(last: u8) -> Option<IpAddr> {
    Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)))
}

#[tokio::test]
async fn test_free_vote_updates_tally() {
    let db = database().await;
    let event = seed_event(&db, VoteType::Free, None).await;
    let contestant = seed_contestant(&db, event.id, None).await;
    let recorder = VoteRecorder::new(db.clone());

    let vote = recorder.record_vote(contestant.id, 2, ip(1)).await.unwrap();

    assert_eq!(vote.contestant_id, contestant.id);
    assert_eq!(vote.quantity, 2);
    assert_eq!(vote.voter_ip.as_deref(), Some("10.0.0.1"));
    assert!(!vote.is_paid);
    assert_eq!(vote_count(&db, contestant.id).await, 2);
    assert_tally_consistent(&db, contestant.id).await;
}

#[tokio::test]
async fn test_duplicate_address_rejected() {
    let db = database().await;
    let event = seed_event(&db, VoteType::Free, None).await;
    let contestant = seed_contestant(&db, event.id, None).await;
    let recorder = VoteRecorder::new(db.clone());

    recorder.record_vote(contestant.id, 1, ip(1)).await.unwrap();
    let err = recorder.record_vote(contestant.id, 1, ip(1)).await.unwrap_err();

    assert!(matches!(err, AppError::DuplicateVote { contestant_id } if contestant_id == contestant.id));
    assert_eq!(total_votes(&db).await, 1);
    assert_eq!(vote_count(&db, contestant.id).await, 1);
}

#[tokio::test]
async fn test_same_address_may_vote_for_other_contestants() {
    let db = database().await;
    let event = seed_event(&db, VoteType::Free, None).await;
    let first = seed_contestant(&db, event.id, None).await;
    let second = seed_contestant(&db, event.id, None).await;
    let recorder = VoteRecorder::new(db.clone());

    recorder.record_vote(first.id, 1, ip(1)).await.unwrap();
    recorder.record_vote(second.id, 1, ip(1)).await.unwrap();

    assert_eq!(vote_count(&db, first.id).await, 1);
    assert_eq!(vote_count(&db, second.id).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_votes_from_distinct_addresses() {
    let db = database().await;
    let event = seed_event(&db, VoteType::Free, None).await;
    let contestant = seed_contestant(&db, event.id, Some(7)).await;
    let recorder = VoteRecorder::new(db.clone());

    let tasks = (0..100u8).map(|i| {
        let recorder = recorder.clone();
        tokio::spawn(async move {
            let addr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, i));
            recorder.record_vote(7, 1, Some(addr)).await
        })
    });
    for result in futures::future::join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert_eq!(vote_count(&db, contestant.id).await, 100);
    assert_eq!(
        VoteRepository::new(db.clone())
            .count_by_contestant(contestant.id)
            .await
            .unwrap(),
        100
    );
    assert_tally_consistent(&db, contestant.id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicates_count_once() {
    let db = database().await;
    let event = seed_event(&db, VoteType::Free, None).await;
    let contestant = seed_contestant(&db, event.id, None).await;
    let recorder = VoteRecorder::new(db.clone());

    let tasks = (0..20).map(|_| {
        let recorder = recorder.clone();
        let id = contestant.id;
        tokio::spawn(async move { recorder.record_vote(id, 1, ip(9)).await })
    });
    let results = futures::future::join_all(tasks).await;

    let accepted = results
        .into_iter()
        .filter(|r| r.as_ref().unwrap().is_ok())
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(vote_count(&db, contestant.id).await, 1);
    assert_tally_consistent(&db, contestant.id).await;
}

#[tokio::test]
async fn test_paid_event_requires_payment_flow() {
    let db = database().await;
    let event = seed_event(&db, VoteType::Paid, Some(200)).await;
    let contestant = seed_contestant(&db, event.id, None).await;

    let err = VoteRecorder::new(db.clone())
        .record_vote(contestant.id, 1, ip(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(total_votes(&db).await, 0);
}

#[tokio::test]
async fn test_closed_window_rejected() {
    let db = database().await;
    let event = seed_event(&db, VoteType::Free, None).await;
    let contestant = seed_contestant(&db, event.id, None).await;

    let now = Utc::now();
    let mut closed: event::ActiveModel = event.into();
    closed.start_date = Set((now - Duration::days(2)).into());
    closed.end_date = Set((now - Duration::days(1)).into());
    EventRepository::new(db.clone()).update(closed).await.unwrap();

    let err = VoteRecorder::new(db.clone())
        .record_vote(contestant.id, 1, ip(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_quantity_limits() {
    let db = database().await;
    let event = seed_event(&db, VoteType::Free, None).await;
    let contestant = seed_contestant(&db, event.id, None).await;
    let recorder = VoteRecorder::new(db.clone());

    assert!(matches!(
        recorder.record_vote(contestant.id, 0, ip(1)).await,
        Err(AppError::Validation(_))
    ));
    // Seeded events allow five votes per voter.
    assert!(matches!(
        recorder.record_vote(contestant.id, 6, ip(1)).await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(total_votes(&db).await, 0);
}

#[tokio::test]
async fn test_unknown_contestant() {
    let db = database().await;
    let err = VoteRecorder::new(db.clone())
        .record_vote(404, 1, ip(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ContestantNotFound(_)));
}

#[tokio::test]
async fn test_index_rejects_duplicate_free_vote_and_rolls_back() {
    let db = database().await;
    let event = seed_event(&db, VoteType::Free, None).await;
    let contestant = seed_contestant(&db, event.id, None).await;

    let txn = db.begin().await.unwrap();
    VoteRecorder::record_in(&txn, contestant.id, 1, Some("10.0.0.1".into()), VoteKind::Free)
        .await
        .unwrap();
    let err = VoteRecorder::record_in(&txn, contestant.id, 1, Some("10.0.0.1".into()), VoteKind::Free)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateVote { .. }));
    txn.rollback().await.unwrap();

    assert_eq!(total_votes(&db).await, 0);
    assert_eq!(vote_count(&db, contestant.id).await, 0);
}

#[tokio::test]
async fn test_paid_votes_exempt_from_address_rule() {
    let db = database().await;
    let event = seed_event(&db, VoteType::Paid, Some(200)).await;
    let contestant = seed_contestant(&db, event.id, None).await;

    let txn = db.begin().await.unwrap();
    for _ in 0..2 {
        VoteRecorder::record_in(&txn, contestant.id, 3, Some("10.0.0.1".into()), VoteKind::Paid)
            .await
            .unwrap();
    }
    txn.commit().await.unwrap();

    assert_eq!(vote_count(&db, contestant.id).await, 6);
    assert_tally_consistent(&db, contestant.id).await;
}
