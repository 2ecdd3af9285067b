use chrono::Utc;
use futures::future::join_all;

use embyhub_bot::domain::types::{RegistrationConfig, RegistrationConfigPatch};
use embyhub_bot::error::BotServiceError;
use embyhub_bot::usecase::account::{
    BanInput, BanUseCase, CreateAccountInput, CreateAccountUseCase, MemberLeftUseCase,
    UnbanUseCase,
};
use embyhub_bot::usecase::invite_code::RedeemInviteCodeUseCase;
use embyhub_bot::usecase::registration::SetRegistrationConfigUseCase;
use embyhub_domain::id::{EmbyId, TelegramId};
use embyhub_domain::invite::InviteCodeType;

use crate::helpers::{
    ADMIN, MemoryStore, MockMediaServer, admins, banned_user, invite, user_with_account,
};

fn creator(
    store: &MemoryStore,
    media: &MockMediaServer,
) -> CreateAccountUseCase<MemoryStore, MemoryStore, MemoryStore, MockMediaServer> {
    CreateAccountUseCase {
        users: store.clone(),
        config: store.clone(),
        uow: store.clone(),
        media: media.clone(),
        admins: admins(),
    }
}

fn create_input(id: i64, name: &str) -> CreateAccountInput {
    CreateAccountInput {
        telegram_id: TelegramId(id),
        name: name.to_owned(),
        password: Some("pw".to_owned()),
    }
}

fn config(total: i64, public: i64, deadline: i64) -> RegistrationConfig {
    RegistrationConfig {
        total_register_user: total,
        register_public_user: public,
        register_public_time: deadline,
    }
}

// ── CreateAccount ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_spend_public_quota_on_creation() {
    let store = MemoryStore::with_config(config(5, 1, 0));
    let media = MockMediaServer::default();

    let created = creator(&store, &media)
        .execute(create_input(100, "alice"))
        .await
        .unwrap();

    assert_eq!(created.password, "pw");
    assert_eq!(created.user.emby_id, Some(EmbyId::from("emby-alice")));
    assert_eq!(created.user.emby_name.as_deref(), Some("alice"));
    assert_eq!(store.config().await, Some(config(6, 0, 0)));
    assert_eq!(
        media.calls(),
        vec![
            "create:alice".to_owned(),
            "set_password:emby-alice".to_owned(),
            "default_policy:emby-alice".to_owned(),
        ]
    );
}

#[tokio::test]
async fn should_close_registration_once_quota_is_spent() {
    let store = MemoryStore::with_config(config(0, 1, 0));
    let media = MockMediaServer::default();
    let uc = creator(&store, &media);

    uc.execute(create_input(100, "alice")).await.unwrap();
    let result = uc.execute(create_input(200, "bob")).await;

    assert!(
        matches!(result, Err(BotServiceError::RegistrationClosed)),
        "expected RegistrationClosed, got {result:?}"
    );
    assert!(!store.user(TelegramId(200)).await.unwrap().has_account());
    assert_eq!(store.config().await, Some(config(1, 0, 0)));
}

#[tokio::test]
async fn should_not_spend_quota_when_register_was_granted_by_code() {
    let store = MemoryStore::with_config(config(0, 3, 0));
    store
        .insert_code(invite("epr-granted", InviteCodeType::Register))
        .await;
    let media = MockMediaServer::default();
    RedeemInviteCodeUseCase {
        users: store.clone(),
        codes: store.clone(),
        uow: store.clone(),
        media: media.clone(),
        admins: admins(),
    }
    .execute(TelegramId(100), "epr-granted")
    .await
    .unwrap();

    let created = creator(&store, &media)
        .execute(create_input(100, "alice"))
        .await
        .unwrap();

    assert!(created.user.has_account());
    assert!(!created.user.enable_register, "grant is one-time");
    assert_eq!(store.config().await, Some(config(1, 3, 0)));
}

#[tokio::test]
async fn should_allow_creation_inside_open_window_without_quota() {
    let deadline = Utc::now().timestamp() + 3600;
    let store = MemoryStore::with_config(config(0, 0, deadline));
    let media = MockMediaServer::default();

    creator(&store, &media)
        .execute(create_input(100, "alice"))
        .await
        .unwrap();

    assert_eq!(store.config().await, Some(config(1, 0, deadline)));
}

#[tokio::test]
async fn should_reject_second_account_for_same_user() {
    let store = MemoryStore::with_config(config(0, 5, 0));
    let media = MockMediaServer::default();
    let uc = creator(&store, &media);

    uc.execute(create_input(100, "alice")).await.unwrap();
    let result = uc.execute(create_input(100, "alice2")).await;

    assert!(
        matches!(result, Err(BotServiceError::AlreadyBound)),
        "expected AlreadyBound, got {result:?}"
    );
    assert_eq!(store.config().await, Some(config(1, 4, 0)));
    assert_eq!(
        store.user(TelegramId(100)).await.unwrap().emby_name.as_deref(),
        Some("alice")
    );
}

#[tokio::test]
async fn should_clear_expired_deadline_once_and_stay_closed() {
    let expired = Utc::now().timestamp() - 10;
    let store = MemoryStore::with_config(config(0, 0, expired));
    let media = MockMediaServer::default();
    let uc = creator(&store, &media);

    for id in [100, 200] {
        let result = uc.execute(create_input(id, "late")).await;
        assert!(
            matches!(result, Err(BotServiceError::RegistrationClosed)),
            "expected RegistrationClosed, got {result:?}"
        );
        assert_eq!(store.config().await, Some(config(0, 0, 0)));
    }
    assert!(media.calls().is_empty());
}

#[tokio::test]
async fn should_leave_quota_untouched_when_remote_creation_fails() {
    let store = MemoryStore::with_config(config(5, 1, 0));
    let media = MockMediaServer::failing();

    let result = creator(&store, &media)
        .execute(create_input(100, "alice"))
        .await;

    assert!(
        matches!(result, Err(BotServiceError::RemoteFailure(_))),
        "expected RemoteFailure, got {result:?}"
    );
    assert_eq!(store.config().await, Some(config(5, 1, 0)));
    assert!(!store.user(TelegramId(100)).await.unwrap().has_account());
}

#[tokio::test]
async fn should_give_last_quota_unit_to_exactly_one_concurrent_creator() {
    let store = MemoryStore::with_config(config(0, 1, 0));
    let media = MockMediaServer::default();

    let attempts = (100..105).map(|id| {
        let uc = creator(&store, &media);
        async move { uc.execute(create_input(id, &format!("user{id}"))).await }
    });
    let results = join_all(attempts).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for r in results.iter().filter(|r| r.is_err()) {
        assert!(
            matches!(r, Err(BotServiceError::RegistrationClosed)),
            "expected RegistrationClosed, got {r:?}"
        );
    }
    let creates = media
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("create:"))
        .count();
    assert_eq!(creates, 1, "losers must not reach the media server");
    assert_eq!(store.config().await, Some(config(1, 0, 0)));
}

#[tokio::test]
async fn should_let_concurrent_creators_through_open_window_after_quota_runs_out() {
    let deadline = Utc::now().timestamp() + 3600;
    let store = MemoryStore::with_config(config(0, 1, deadline));
    let media = MockMediaServer::default();

    let attempts = (100..105).map(|id| {
        let uc = creator(&store, &media);
        async move { uc.execute(create_input(id, &format!("user{id}"))).await }
    });
    let results = join_all(attempts).await;

    for r in &results {
        assert!(r.is_ok(), "expected success inside open window, got {r:?}");
    }
    let config_after = store.config().await.unwrap();
    assert_eq!(config_after.register_public_user, 0);
    assert_eq!(config_after, config(5, 0, deadline));
    for id in 100..105 {
        assert!(store.user(TelegramId(id)).await.unwrap().has_account());
    }
}

#[tokio::test]
async fn should_report_commit_failure_after_remote_creation() {
    let store = MemoryStore::with_config(config(5, 1, 0));
    store.fail_commits();
    let media = MockMediaServer::default();

    let result = creator(&store, &media)
        .execute(create_input(100, "alice"))
        .await;

    assert!(
        matches!(result, Err(BotServiceError::Internal(_))),
        "expected Internal, got {result:?}"
    );
    assert_eq!(store.config().await, Some(config(5, 1, 0)));
    assert!(!store.user(TelegramId(100)).await.unwrap().has_account());
    assert_eq!(
        media.calls(),
        vec!["create:alice".to_owned()],
        "no password or policy call on an unbound account"
    );
}

#[tokio::test]
async fn should_reject_invalid_account_name_before_any_side_effect() {
    let store = MemoryStore::with_config(config(0, 1, 0));
    let media = MockMediaServer::default();

    let result = creator(&store, &media)
        .execute(create_input(100, ""))
        .await;

    assert!(
        matches!(result, Err(BotServiceError::InvalidInput(_))),
        "expected InvalidInput, got {result:?}"
    );
    assert!(store.user(TelegramId(100)).await.is_none());
    assert!(media.calls().is_empty());
}

// ── Ban / Unban ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_walk_ban_and_unban_state_machine() {
    let store = MemoryStore::default();
    store.insert_user(user_with_account(100)).await;
    let media = MockMediaServer::default();
    let ban = BanUseCase {
        users: store.clone(),
        media: media.clone(),
        admins: admins(),
    };
    let unban = UnbanUseCase {
        users: store.clone(),
        media: media.clone(),
        admins: admins(),
    };
    let ban_input = || BanInput {
        target: TelegramId(100),
        reason: "spam".to_owned(),
        operator: Some(ADMIN),
    };

    let banned = ban.execute(ban_input()).await.unwrap();
    assert!(banned.is_banned());
    assert_eq!(banned.reason.as_deref(), Some("spam"));

    let again = ban.execute(ban_input()).await;
    assert!(
        matches!(again, Err(BotServiceError::AlreadyBanned)),
        "expected AlreadyBanned, got {again:?}"
    );

    let active = unban.execute(TelegramId(100), Some(ADMIN)).await.unwrap();
    assert!(!active.is_banned());
    assert_eq!(active.ban_time, Some(0));
    assert!(active.reason.is_none());

    let again = unban.execute(TelegramId(100), Some(ADMIN)).await;
    assert!(
        matches!(again, Err(BotServiceError::NotBanned)),
        "expected NotBanned, got {again:?}"
    );

    assert_eq!(
        media.calls(),
        vec!["ban:emby-100".to_owned(), "default_policy:emby-100".to_owned()]
    );
}

#[tokio::test]
async fn should_refuse_ban_from_non_admin_operator() {
    let store = MemoryStore::default();
    store.insert_user(user_with_account(100)).await;
    let media = MockMediaServer::default();

    let result = BanUseCase {
        users: store.clone(),
        media: media.clone(),
        admins: admins(),
    }
    .execute(BanInput {
        target: TelegramId(100),
        reason: "spam".to_owned(),
        operator: Some(TelegramId(200)),
    })
    .await;

    assert!(
        matches!(result, Err(BotServiceError::PermissionDenied(_))),
        "expected PermissionDenied, got {result:?}"
    );
    assert!(!store.user(TelegramId(100)).await.unwrap().is_banned());
    assert!(media.calls().is_empty());
}

#[tokio::test]
async fn should_keep_user_active_when_remote_ban_fails() {
    let store = MemoryStore::default();
    store.insert_user(user_with_account(100)).await;

    let result = BanUseCase {
        users: store.clone(),
        media: MockMediaServer::failing(),
        admins: admins(),
    }
    .execute(BanInput {
        target: TelegramId(100),
        reason: "spam".to_owned(),
        operator: None,
    })
    .await;

    assert!(
        matches!(result, Err(BotServiceError::RemoteFailure(_))),
        "expected RemoteFailure, got {result:?}"
    );
    assert!(!store.user(TelegramId(100)).await.unwrap().is_banned());
}

// ── MemberLeft ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_ban_active_member_who_left() {
    let store = MemoryStore::default();
    store.insert_user(user_with_account(100)).await;
    let uc = MemberLeftUseCase {
        users: store.clone(),
        media: MockMediaServer::default(),
    };

    assert!(uc.execute(TelegramId(100)).await.unwrap());
    let user = store.user(TelegramId(100)).await.unwrap();
    assert!(user.is_banned());
    assert_eq!(user.reason.as_deref(), Some("left the group"));

    assert!(!uc.execute(TelegramId(100)).await.unwrap(), "already banned");
}

#[tokio::test]
async fn should_spare_whitelisted_and_unknown_members() {
    let store = MemoryStore::default();
    let mut whitelisted = user_with_account(100);
    whitelisted.is_whitelist = true;
    store.insert_user(whitelisted).await;
    store.insert_user(banned_user(300)).await;
    let media = MockMediaServer::default();
    let uc = MemberLeftUseCase {
        users: store.clone(),
        media: media.clone(),
    };

    assert!(!uc.execute(TelegramId(100)).await.unwrap());
    assert!(!uc.execute(TelegramId(200)).await.unwrap());
    assert!(!uc.execute(TelegramId(300)).await.unwrap());
    assert!(store.user(TelegramId(200)).await.is_none());
    assert!(media.calls().is_empty());
}

// ── RegistrationConfig ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_open_window_for_admin_and_reject_past_deadline() {
    let store = MemoryStore::with_config(config(7, 0, 0));
    let uc = SetRegistrationConfigUseCase {
        users: store.clone(),
        config: store.clone(),
        admins: admins(),
    };
    let deadline = Utc::now().timestamp() + 600;

    let updated = uc
        .execute(
            ADMIN,
            RegistrationConfigPatch {
                register_public_user: Some(2),
                register_public_time: Some(deadline),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated, config(7, 2, deadline));

    let past = uc
        .execute(
            ADMIN,
            RegistrationConfigPatch {
                register_public_user: None,
                register_public_time: Some(Utc::now().timestamp() - 1),
            },
        )
        .await;
    assert!(
        matches!(past, Err(BotServiceError::InvalidInput(_))),
        "expected InvalidInput, got {past:?}"
    );

    let denied = uc
        .execute(
            TelegramId(100),
            RegistrationConfigPatch {
                register_public_user: Some(50),
                register_public_time: None,
            },
        )
        .await;
    assert!(
        matches!(denied, Err(BotServiceError::PermissionDenied(_))),
        "expected PermissionDenied, got {denied:?}"
    );
    assert_eq!(store.config().await, Some(config(7, 2, deadline)));
}
