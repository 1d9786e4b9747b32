use chrono::Utc;
use newswatch::policy::evaluate;
use newswatch::{Error, User, UserProfile};
use uuid::Uuid;

fn user(is_staff: bool, is_superuser: bool) -> User {
    User {
        id: Uuid::new_v4(),
        username: "alice".to_string(),
        is_staff,
        is_superuser,
        created_at: Utc::now(),
    }
}

fn profile(user_id: Uuid, keyword_quota: i32, is_blocked: bool) -> UserProfile {
    let now = Utc::now();
    UserProfile {
        user_id,
        keyword_quota,
        is_blocked,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn superuser_bypasses_quota_and_block() {
    let user = user(false, true);
    // No profile and an absurd tracked count: still allowed, quota undefined.
    let allowance = evaluate(&user, None, 10_000).expect("superuser must be allowed");
    assert_eq!(allowance.remaining_quota, None);
}

#[test]
fn staff_bypasses_quota_and_block() {
    let user = user(true, false);
    let blocked = profile(user.id, 0, true);
    let allowance = evaluate(&user, Some(&blocked), 50).expect("staff must be allowed");
    assert_eq!(allowance.remaining_quota, None);
}

#[test]
fn missing_profile_is_its_own_error() {
    let user = user(false, false);
    let err = evaluate(&user, None, 0).unwrap_err();
    assert!(
        matches!(err, Error::ProfileNotFound { user_id } if user_id == user.id),
        "expected ProfileNotFound, got {err:?}"
    );
}

#[test]
fn blocked_user_is_denied_before_quota() {
    let user = user(false, false);
    // Quota would allow the search; the block flag must win.
    let p = profile(user.id, 10, true);
    let err = evaluate(&user, Some(&p), 0).unwrap_err();
    assert!(matches!(err, Error::Blocked), "expected Blocked, got {err:?}");
}

#[test]
fn quota_reached_denies_at_exact_count() {
    let user = user(false, false);
    let p = profile(user.id, 2, false);

    let err = evaluate(&user, Some(&p), 2).unwrap_err();
    assert!(
        matches!(err, Error::QuotaExceeded { quota: 2 }),
        "expected QuotaExceeded, got {err:?}"
    );

    let err = evaluate(&user, Some(&p), 7).unwrap_err();
    assert!(matches!(err, Error::QuotaExceeded { quota: 2 }));
}

#[test]
fn zero_quota_denies_first_search() {
    let user = user(false, false);
    let p = profile(user.id, 0, false);
    let err = evaluate(&user, Some(&p), 0).unwrap_err();
    assert!(matches!(err, Error::QuotaExceeded { quota: 0 }));
}

#[test]
fn remaining_quota_is_reported() {
    let user = user(false, false);
    let p = profile(user.id, 10, false);

    let allowance = evaluate(&user, Some(&p), 3).expect("search must be allowed");
    assert_eq!(allowance.remaining_quota, Some(7));

    let allowance = evaluate(&user, Some(&p), 9).expect("last slot must be allowed");
    assert_eq!(allowance.remaining_quota, Some(1));
}
