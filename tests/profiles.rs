mod common;

use lockin_ledger::{create_profile, paths, username_available, LedgerError, Profile};

use common::ledger;

#[tokio::test]
async fn create_profile_reserves_the_username() {
    let (ledger, auth, _) = ledger();
    let db = ledger.database();
    let uid = auth.sign_in_anonymously();

    assert!(username_available(db, "Steven").await.unwrap());

    let profile = create_profile(db, &uid, "Steven", "Steven T", None)
        .await
        .unwrap();
    assert_eq!(profile.username_lower, "steven");
    assert_eq!(profile.social_credit_score, 0);
    assert_eq!(profile.label, "New Member");

    // Reservation is case-insensitive.
    assert!(!username_available(db, "steven").await.unwrap());
    assert!(!username_available(db, "STEVEN").await.unwrap());

    let reservation = db.get(paths::USERNAMES, "steven").await.unwrap().unwrap();
    assert_eq!(reservation.str_field("uid"), Some(uid.as_str()));

    let stored: Profile = db
        .get_as(paths::PROFILES, &uid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.username, "Steven");
}

#[tokio::test]
async fn taken_usernames_are_rejected() {
    let (ledger, _, _) = ledger();
    let db = ledger.database();

    create_profile(db, "u1", "alpha", "First", None).await.unwrap();

    let result = create_profile(db, "u2", "ALPHA", "Second", None).await;
    assert!(matches!(result, Err(LedgerError::TransactionConflict(_))));

    // The losing caller wrote nothing.
    assert!(db.get(paths::PROFILES, "u2").await.unwrap().is_none());
}
