// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Session Integration Tests
//!
//! - `test_login_*`: credential checks and session creation
//! - `test_logout_*`: revocation on logout
//! - `test_refresh_*`: rotation, replay and races
//! - `test_revoke_*`: ownership rules
//! - `test_password_*`: password changes and hash upgrades
//! - `test_authenticate_*`: request authentication and activity tracking

use std::sync::Arc;
use std::time::Duration;

use gatekeep_auth::{LoginRequest, PasswordConfig};
use gatekeep_core::audit::{ActionResult, AuditAction};
use gatekeep_tests::prelude::*;

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_creates_session_and_tokens() {
    let h = AuthHarness::new();

    let outcome = h
        .manager
        .login(
            LoginRequest::new("alice", UserFixtures::ALICE_PASSWORD)
                .with_device("firefox")
                .with_ip("10.0.0.7"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.user.id, "alice-id");
    assert_eq!(outcome.user.email, "alice@example.com");
    assert_eq!(outcome.user.roles, vec!["billing_clerk".to_string()]);
    assert_eq!(
        outcome.user.permissions,
        vec!["billing.read".to_string(), "billing.write".to_string()]
    );

    let session = h.sessions.session(&outcome.session_id).expect("session stored");
    assert!(session.is_active());
    assert_eq!(session.user_id, "alice-id");
    assert_eq!(session.device_info.as_deref(), Some("firefox"));
    assert_eq!(session.ip_address.as_deref(), Some("10.0.0.7"));
    assert_eq!(
        session.refresh_token_hash,
        gatekeep_auth::hash_token(&outcome.tokens.refresh_token)
    );
    assert_ne!(session.refresh_token_hash, outcome.tokens.refresh_token);

    let claims = h
        .manager
        .tokens()
        .validate_access_token(&outcome.tokens.access_token)
        .unwrap();
    assert_eq!(claims.session_id, outcome.session_id);
    assert_eq!(h.users.last_login_count(), 1);
    assert!(h.users.user("alice-id").unwrap().last_login_at.is_some());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let h = AuthHarness::new();

    assert_auth_error(h.login("alice", "wrong").await, "INVALID_CREDENTIALS");
    assert!(h.sessions.is_empty());

    let failures = h.audit.failures();
    assert_eq!(failures.len(), 1);
    let entry = &failures[0];
    assert_eq!(entry.action, AuditAction::Login);
    assert_eq!(entry.actor_user_id(), Some("alice-id"));
    assert_eq!(entry.entity.table, "users");
    assert_eq!(
        entry.result,
        ActionResult::Failure {
            reason: "invalid password".to_string()
        }
    );
    assert!(!entry.summary.contains("wrong"));
}

#[tokio::test]
async fn test_login_unknown_user_is_not_audited() {
    let h = AuthHarness::new();

    assert_auth_error(h.login("mallory", "whatever").await, "INVALID_CREDENTIALS");
    assert!(h.audit.is_empty());
}

#[tokio::test]
async fn test_login_by_email() {
    let h = AuthHarness::new();

    let outcome = h
        .login("alice@example.com", UserFixtures::ALICE_PASSWORD)
        .await
        .unwrap();

    assert_eq!(outcome.user.id, "alice-id");
    assert!(h.sessions.session(&outcome.session_id).is_some());
    assert_auth_error(
        h.login("alice@example.com", "wrong").await,
        "INVALID_CREDENTIALS",
    );
    assert_auth_error(
        h.login("nobody@example.com", UserFixtures::ALICE_PASSWORD).await,
        "INVALID_CREDENTIALS",
    );
}

#[tokio::test]
async fn test_login_unknown_user_looks_like_wrong_password() {
    let h = AuthHarness::new();

    let unknown = h.login("mallory", "whatever").await.unwrap_err();
    let wrong = h.login("alice", "whatever").await.unwrap_err();

    assert_eq!(unknown.error_code(), wrong.error_code());
    assert_eq!(unknown.user_message(), wrong.user_message());
    assert!(h.sessions.is_empty());
}

#[tokio::test]
async fn test_login_inactive_user() {
    let h = AuthHarness::new();
    h.users.set_active("alice-id", false);

    assert_auth_error(
        h.login("alice", UserFixtures::ALICE_PASSWORD).await,
        "USER_INACTIVE",
    );
    assert_auth_error(h.login("alice", "wrong").await, "INVALID_CREDENTIALS");
    assert!(h.sessions.is_empty());

    let reasons: Vec<_> = h.audit.failures().into_iter().map(|e| e.result).collect();
    assert_eq!(
        reasons,
        vec![ActionResult::failure("user inactive"), ActionResult::failure("invalid password")]
    );
}

#[tokio::test]
async fn test_login_survives_best_effort_failures() {
    let h = AuthHarness::new();
    h.users.fail_last_login(true);
    h.users.fail_roles(true);

    let outcome = h.login_alice().await;

    assert!(outcome.user.roles.is_empty());
    assert!(h.sessions.session(&outcome.session_id).is_some());
    assert_eq!(h.users.last_login_count(), 0);
}

#[tokio::test]
async fn test_login_fails_when_session_cannot_be_stored() {
    let h = AuthHarness::new();
    h.sessions.fail_all(true);

    assert_auth_error(
        h.login("alice", UserFixtures::ALICE_PASSWORD).await,
        "REPOSITORY_ERROR",
    );
    assert!(h.audit.entries_for_action(AuditAction::Login).is_empty());
}

#[tokio::test]
async fn test_login_writes_audit_entry() {
    let h = AuthHarness::new();
    let outcome = h
        .manager
        .login(LoginRequest::new("alice", UserFixtures::ALICE_PASSWORD).with_ip("10.0.0.7"))
        .await
        .unwrap();

    let entries = h.audit.entries_for_action(AuditAction::Login);
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.actor_user_id(), Some("alice-id"));
    assert_eq!(entry.session_id.as_deref(), Some(outcome.session_id.as_str()));
    assert_eq!(entry.client_ip.as_deref(), Some("10.0.0.7"));
    assert_eq!(entry.business_key, "alice");
    assert!(entry.result.is_success());

    let data = entry.data.to_string();
    assert!(!data.contains(UserFixtures::ALICE_PASSWORD));
    assert!(!data.contains(&outcome.tokens.refresh_token));
}

#[tokio::test]
async fn test_login_creates_independent_sessions() {
    let h = AuthHarness::new();
    let first = h.login_alice().await;
    let second = h.login_alice().await;

    assert_ne!(first.session_id, second.session_id);
    assert_eq!(h.manager.get_user_sessions("alice-id").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_login_sessions_past_refresh_window_are_hidden() {
    let h = AuthHarness::new();
    let stale = h.login_alice().await;
    let fresh = h.login_alice().await;
    h.sessions.backdate(
        &stale.session_id,
        h.manager.tokens().refresh_ttl() + Duration::from_secs(60),
    );

    let listed = h.manager.get_user_sessions("alice-id").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, fresh.session_id);
}

#[tokio::test]
async fn test_login_session_history_includes_revoked() {
    let h = AuthHarness::new();
    let first = h.login_alice().await;
    let second = h.login_alice().await;
    h.login("bob", UserFixtures::BOB_PASSWORD).await.unwrap();
    h.manager.logout(&first.session_id).await.unwrap();

    let mut history: Vec<_> = h
        .manager
        .get_session_history("alice-id")
        .await
        .unwrap()
        .into_iter()
        .map(|s| { let active = s.is_active(); (s.id, active) })
        .collect();
    history.sort_by_key(|(id, _)| id != &first.session_id);

    assert_eq!(
        history,
        vec![(first.session_id, false), (second.session_id, true)]
    );
    assert_eq!(h.manager.get_user_sessions("alice-id").await.unwrap().len(), 1);
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_revokes_session() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;

    h.manager.logout(&outcome.session_id).await.unwrap();

    let session = h.manager.get_session_by_id(&outcome.session_id).await.unwrap().unwrap();
    assert!(!session.is_active());
    assert!(h.manager.get_user_sessions("alice-id").await.unwrap().is_empty());
    assert_eq!(h.audit.entries_for_action(AuditAction::Logout).len(), 1);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;

    h.manager.logout(&outcome.session_id).await.unwrap();
    let revoked_at = h.sessions.session(&outcome.session_id).unwrap().revoked_at;
    h.manager.logout(&outcome.session_id).await.unwrap();
    h.manager.logout("no-such-session").await.unwrap();

    assert_eq!(h.sessions.session(&outcome.session_id).unwrap().revoked_at, revoked_at);
    assert_eq!(h.audit.entries_for_action(AuditAction::Logout).len(), 1);
}

#[tokio::test]
async fn test_logout_revokes_when_lookup_fails() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;
    h.sessions.fail_lookup(true);

    h.manager.logout(&outcome.session_id).await.unwrap();

    assert!(!h.sessions.session(&outcome.session_id).unwrap().is_active());
    assert!(h.audit.entries_for_action(AuditAction::Logout).is_empty());
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_rotates_session() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;

    let pair = h.manager.refresh_token(&outcome.tokens.refresh_token).await.unwrap();
    let claims = h.manager.tokens().validate_access_token(&pair.access_token).unwrap();

    assert_ne!(claims.session_id, outcome.session_id);
    assert!(!h.sessions.session(&outcome.session_id).unwrap().is_active());
    let new_session = h.sessions.session(&claims.session_id).unwrap();
    assert!(new_session.is_active());
    assert_eq!(new_session.refresh_token_hash, gatekeep_auth::hash_token(&pair.refresh_token));

    let entries = h.audit.entries_for_action(AuditAction::TokenRefresh);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data["old_session_id"], outcome.session_id.as_str());
}

#[tokio::test]
async fn test_refresh_replay_is_rejected() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;

    let pair = h.manager.refresh_token(&outcome.tokens.refresh_token).await.unwrap();
    assert_auth_error(
        h.manager.refresh_token(&outcome.tokens.refresh_token).await,
        "SESSION_REVOKED",
    );

    // The rotated token keeps working.
    assert!(h.manager.refresh_token(&pair.refresh_token).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_refresh_concurrent_reuse_succeeds_once() {
    let h = Arc::new(AuthHarness::new());
    let outcome = h.login_alice().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let h = Arc::clone(&h);
        let token = outcome.tokens.refresh_token.clone();
        handles.push(tokio::spawn(async move { h.manager.refresh_token(&token).await }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_eq!(e.error_code(), "SESSION_REVOKED"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(h.manager.get_user_sessions("alice-id").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;

    assert_auth_error(
        h.manager.refresh_token(&outcome.tokens.access_token).await,
        "INVALID_REFRESH_TOKEN",
    );
    assert_auth_error(h.manager.refresh_token("garbage").await, "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn test_refresh_unknown_session() {
    let h = AuthHarness::new();
    let claims = ClaimsBuilder::refresh("alice-id", "ghost-session").build();
    let token = h.manager.tokens().sign(&claims).unwrap();

    assert_auth_error(h.manager.refresh_token(&token).await, "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn test_refresh_after_logout() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;
    h.manager.logout(&outcome.session_id).await.unwrap();

    assert_auth_error(
        h.manager.refresh_token(&outcome.tokens.refresh_token).await,
        "SESSION_REVOKED",
    );
    assert_eq!(h.sessions.rotate_count(), 0);
}

#[tokio::test]
async fn test_refresh_inactive_user() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;
    h.users.set_active("alice-id", false);

    assert_auth_error(
        h.manager.refresh_token(&outcome.tokens.refresh_token).await,
        "USER_INACTIVE",
    );
    assert!(h.sessions.session(&outcome.session_id).unwrap().is_active());
}

// =============================================================================
// Revoke
// =============================================================================

#[tokio::test]
async fn test_revoke_own_session() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;

    h.manager
        .revoke_session("alice-id", &outcome.session_id, false)
        .await
        .unwrap();

    assert!(!h.sessions.session(&outcome.session_id).unwrap().is_active());
    let entries = h.audit.entries_for_action(AuditAction::SessionRevoke);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].actor_user_id(), Some("alice-id"));
}

#[tokio::test]
async fn test_revoke_foreign_session_is_hidden() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;

    assert_auth_error(
        h.manager.revoke_session("bob-id", &outcome.session_id, false).await,
        "SESSION_NOT_FOUND",
    );
    assert!(h.sessions.session(&outcome.session_id).unwrap().is_active());

    assert_auth_error(
        h.manager.revoke_session("alice-id", "no-such-session", false).await,
        "SESSION_NOT_FOUND",
    );
}

#[tokio::test]
async fn test_revoke_as_admin() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;

    h.manager
        .revoke_session("root-id", &outcome.session_id, true)
        .await
        .unwrap();

    assert!(!h.sessions.session(&outcome.session_id).unwrap().is_active());
    let entries = h.audit.entries_for_action(AuditAction::SessionRevoke);
    assert_eq!(entries[0].actor.as_ref().unwrap().username, "root");
}

#[tokio::test]
async fn test_revoke_all_sessions() {
    let h = AuthHarness::new();
    h.login_alice().await;
    h.login_alice().await;
    h.login("bob", UserFixtures::BOB_PASSWORD).await.unwrap();

    h.manager.revoke_all_sessions("alice-id").await.unwrap();

    assert!(h.manager.get_user_sessions("alice-id").await.unwrap().is_empty());
    assert_eq!(h.manager.get_user_sessions("bob-id").await.unwrap().len(), 1);
}

// =============================================================================
// Password
// =============================================================================

#[tokio::test]
async fn test_password_change_revokes_sessions() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;

    h.manager
        .change_password("alice-id", UserFixtures::ALICE_PASSWORD, "new-password")
        .await
        .unwrap();

    assert!(!h.sessions.session(&outcome.session_id).unwrap().is_active());
    assert_auth_error(
        h.login("alice", UserFixtures::ALICE_PASSWORD).await,
        "INVALID_CREDENTIALS",
    );
    assert!(h.login("alice", "new-password").await.is_ok());
    assert_eq!(h.audit.entries_for_action(AuditAction::PasswordChange).len(), 1);
}

#[tokio::test]
async fn test_password_change_requires_current_password() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;

    assert_auth_error(
        h.manager.change_password("alice-id", "wrong", "new-password").await,
        "INVALID_CREDENTIALS",
    );
    assert_auth_error(
        h.manager.change_password("ghost-id", "x", "y").await,
        "USER_NOT_FOUND",
    );
    assert!(h.sessions.session(&outcome.session_id).unwrap().is_active());
    assert_eq!(h.users.password_update_count(), 0);
}

#[tokio::test]
async fn test_password_weak_hash_is_upgraded_on_login() {
    let stronger = PasswordConfig {
        memory_kib: 2048,
        ..ConfigFixtures::cheap_password()
    };
    let h = AuthHarness::with_config(ConfigFixtures::auth().with_password(stronger));
    let before = h.users.user("alice-id").unwrap().password_hash;

    h.login_alice().await;
    assert_eq!(h.users.password_update_count(), 1);
    assert_ne!(h.users.user("alice-id").unwrap().password_hash, before);

    h.login_alice().await;
    assert_eq!(h.users.password_update_count(), 1);
}

#[tokio::test]
async fn test_password_current_hash_is_not_rewritten() {
    let h = AuthHarness::new();
    h.login_alice().await;
    assert_eq!(h.users.password_update_count(), 0);
}

// =============================================================================
// Authenticate
// =============================================================================

#[tokio::test]
async fn test_authenticate_valid_token() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;

    let ctx = h
        .authenticator
        .authenticate(Some(&AuthHarness::bearer(&outcome.tokens.access_token)))
        .await
        .unwrap();

    assert_eq!(ctx.user_id, "alice-id");
    assert_eq!(ctx.session_id, outcome.session_id);
    assert!(ctx.cache().is_empty());
}

#[tokio::test]
async fn test_authenticate_missing_or_malformed_header() {
    let h = AuthHarness::new();

    assert_auth_error(h.authenticator.authenticate(None).await, "MISSING_CREDENTIALS");
    assert_auth_error(
        h.authenticator.authenticate(Some("Basic dXNlcjpwYXNz")).await,
        "MISSING_CREDENTIALS",
    );
    assert_auth_error(h.authenticator.authenticate(Some("Bearer ")).await, "MISSING_CREDENTIALS");
    assert_auth_error(
        h.authenticator.authenticate(Some("Bearer garbage")).await,
        "INVALID_TOKEN",
    );
}

#[tokio::test]
async fn test_authenticate_expired_token() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;
    let claims = ClaimsBuilder::access("alice-id", &outcome.session_id)
        .expired(5)
        .build();
    let token = h.manager.tokens().sign(&claims).unwrap();

    assert_auth_error(
        h.authenticator.authenticate(Some(&AuthHarness::bearer(&token))).await,
        "TOKEN_EXPIRED",
    );
}

#[tokio::test]
async fn test_authenticate_rejects_refresh_token() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;

    assert_auth_error(
        h.authenticator
            .authenticate(Some(&AuthHarness::bearer(&outcome.tokens.refresh_token)))
            .await,
        "INVALID_TOKEN",
    );
}

#[tokio::test]
async fn test_authenticate_after_logout() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;
    let header = AuthHarness::bearer(&outcome.tokens.access_token);

    h.manager.logout(&outcome.session_id).await.unwrap();

    assert_auth_error(h.authenticator.authenticate(Some(&header)).await, "SESSION_REVOKED");
}

#[tokio::test]
async fn test_authenticate_after_refresh_rejects_old_access_token() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;
    let pair = h.manager.refresh_token(&outcome.tokens.refresh_token).await.unwrap();

    assert_auth_error(
        h.authenticator
            .authenticate(Some(&AuthHarness::bearer(&outcome.tokens.access_token)))
            .await,
        "SESSION_REVOKED",
    );
    assert!(h
        .authenticator
        .authenticate(Some(&AuthHarness::bearer(&pair.access_token)))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_authenticate_session_of_another_user() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;
    let claims = ClaimsBuilder::access("bob-id", &outcome.session_id).build();
    let token = h.manager.tokens().sign(&claims).unwrap();

    assert_auth_error(
        h.authenticator.authenticate(Some(&AuthHarness::bearer(&token))).await,
        "SESSION_REVOKED",
    );
}

#[tokio::test]
async fn test_authenticate_session_lookup_failure() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;
    h.sessions.fail_all(true);

    assert_auth_error(
        h.authenticator
            .authenticate(Some(&AuthHarness::bearer(&outcome.tokens.access_token)))
            .await,
        "SESSION_REVOKED",
    );
}

#[tokio::test]
async fn test_authenticate_records_activity() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;
    let header = AuthHarness::bearer(&outcome.tokens.access_token);

    h.authenticator.authenticate(Some(&header)).await.unwrap();
    h.authenticator.authenticate(Some(&header)).await.unwrap();
    h.authenticator.tracker().flush().await;

    assert_eq!(h.authenticator.tracker().received(), 2);
    assert_eq!(h.authenticator.tracker().applied(), 2);
    assert_eq!(h.sessions.last_seen_count(), 2);
}

#[tokio::test]
async fn test_authenticate_ignores_activity_failures() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;
    h.sessions.fail_last_seen(true);

    let result = h
        .authenticator
        .authenticate(Some(&AuthHarness::bearer(&outcome.tokens.access_token)))
        .await;
    h.authenticator.tracker().flush().await;

    assert!(result.is_ok());
    assert_eq!(h.authenticator.tracker().failed(), 1);
    assert_eq!(h.sessions.last_seen_count(), 0);
}

#[tokio::test]
async fn test_authenticate_after_tracker_shutdown() {
    let h = AuthHarness::new();
    let outcome = h.login_alice().await;
    h.authenticator.shutdown().await;

    let result = h
        .authenticator
        .authenticate(Some(&AuthHarness::bearer(&outcome.tokens.access_token)))
        .await;

    assert!(result.is_ok());
    assert_eq!(h.authenticator.tracker().dropped(), 1);
}
