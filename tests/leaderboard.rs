mod common;

use lockin_ledger::MAX_FRIEND_LOOKUP;

use common::{ledger, seed_profile};

#[tokio::test]
async fn global_leaderboard_orders_by_score_and_limits() {
    let (ledger, _, _) = ledger();
    seed_profile(&ledger, "u1", "alpha", 10).await;
    seed_profile(&ledger, "u2", "beta", 30).await;
    seed_profile(&ledger, "u3", "gamma", 20).await;
    seed_profile(&ledger, "u4", "delta", 5).await;

    let top = ledger.leaderboard(3).await.unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].uid, "u2");
    assert_eq!(top[1].uid, "u3");
    assert_eq!(top[2].uid, "u1");
    assert_eq!(top[0].social_credit_score, 30);
    assert_eq!(top[0].username, "beta");
}

#[tokio::test]
async fn friend_leaderboard_never_duplicates_self() {
    let (ledger, _, _) = ledger();
    seed_profile(&ledger, "me", "me", 7).await;
    seed_profile(&ledger, "f1", "friend1", 12).await;

    // Self id appears in the friend list too.
    let friends = vec!["f1".to_string(), "me".to_string()];
    let entries = ledger.friend_leaderboard(&friends, "me").await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].uid, "f1");
    assert_eq!(entries[1].uid, "me");
}

#[tokio::test]
async fn friend_leaderboard_truncates_at_the_lookup_cap() {
    let (ledger, _, _) = ledger();
    let mut friends = Vec::new();
    for n in 0..(MAX_FRIEND_LOOKUP + 5) {
        let uid = format!("f{n}");
        seed_profile(&ledger, &uid, &uid, n as i64).await;
        friends.push(uid);
    }
    seed_profile(&ledger, "me", "me", 0).await;

    let entries = ledger.friend_leaderboard(&friends, "me").await.unwrap();
    assert_eq!(entries.len(), MAX_FRIEND_LOOKUP);
}

#[tokio::test]
async fn friend_leaderboard_skips_missing_profiles() {
    let (ledger, _, _) = ledger();
    seed_profile(&ledger, "me", "me", 1).await;

    let friends = vec!["ghost".to_string()];
    let entries = ledger.friend_leaderboard(&friends, "me").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].uid, "me");
}

#[tokio::test]
async fn rank_counts_strictly_greater_scores() {
    let (ledger, _, _) = ledger();
    seed_profile(&ledger, "u1", "alpha", 10).await;
    seed_profile(&ledger, "u2", "beta", 5).await;
    seed_profile(&ledger, "u3", "gamma", 5).await;
    seed_profile(&ledger, "u4", "delta", 1).await;

    assert_eq!(ledger.user_rank("u1").await.unwrap(), 1);
    // Equal scores share a rank.
    assert_eq!(ledger.user_rank("u2").await.unwrap(), 2);
    assert_eq!(ledger.user_rank("u3").await.unwrap(), 2);
    assert_eq!(ledger.user_rank("u4").await.unwrap(), 4);
}

#[tokio::test]
async fn unknown_users_score_zero() {
    let (ledger, _, _) = ledger();
    seed_profile(&ledger, "u1", "alpha", 10).await;

    assert_eq!(ledger.user_social_credit("ghost").await.unwrap(), 0);
    // A zero score ranks below every positive one.
    assert_eq!(ledger.user_rank("ghost").await.unwrap(), 2);
}
