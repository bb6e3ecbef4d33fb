//! Invite redemption
//!
//! Redemption is one atomic store operation: use counts never pass
//! `max_uses`, even under concurrent redemption, and an existing member
//! redeeming again is a no-op success.

use chrono::{Duration, Utc};
use harbor_core::{Invite, InviteRepository};
use harbor_service::dto::CreateInviteRequest;
use harbor_service::{InviteService, MemberService, ServiceError};
use integration_tests::{guild_with_channel, register_and_login, service_env};

fn unbounded_invite() -> CreateInviteRequest {
    CreateInviteRequest {
        max_uses: None,
        max_age: None,
    }
}

#[tokio::test]
async fn test_redeeming_joins_the_guild() {
    let (ctx, _store) = service_env();
    let owner = register_and_login(&ctx).await;
    let joiner = register_and_login(&ctx).await;
    let (guild_id, _channel_id) = guild_with_channel(&ctx, owner.user.id).await;

    let invites = InviteService::new(&ctx);
    let invite = invites
        .create_invite(guild_id, owner.user.id, unbounded_invite())
        .await
        .unwrap();

    let member = invites
        .redeem_invite(&invite.code, joiner.user.id)
        .await
        .unwrap();
    assert_eq!(member.guild_id, guild_id);
    assert_eq!(member.user_id, joiner.user.id);
    // The seeded default role comes with the membership
    assert!(!member.role_ids.is_empty());

    let members = MemberService::new(&ctx)
        .list_members(guild_id, owner.user.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 2);

    assert_eq!(invites.get_invite(&invite.code).await.unwrap().uses, 1);
}

#[tokio::test]
async fn test_redeem_is_idempotent_for_members() {
    let (ctx, _store) = service_env();
    let owner = register_and_login(&ctx).await;
    let joiner = register_and_login(&ctx).await;
    let (guild_id, _channel_id) = guild_with_channel(&ctx, owner.user.id).await;

    let invites = InviteService::new(&ctx);
    let invite = invites
        .create_invite(guild_id, owner.user.id, unbounded_invite())
        .await
        .unwrap();

    let first = invites
        .redeem_invite(&invite.code, joiner.user.id)
        .await
        .unwrap();
    let second = invites
        .redeem_invite(&invite.code, joiner.user.id)
        .await
        .unwrap();
    assert_eq!(first.joined_at, second.joined_at);

    // The repeat redemption consumed nothing
    assert_eq!(invites.get_invite(&invite.code).await.unwrap().uses, 1);
}

#[tokio::test]
async fn test_max_uses_never_exceeded_under_concurrency() {
    let (ctx, store) = service_env();
    let owner = register_and_login(&ctx).await;
    let (guild_id, _channel_id) = guild_with_channel(&ctx, owner.user.id).await;

    let invite = InviteService::new(&ctx)
        .create_invite(
            guild_id,
            owner.user.id,
            CreateInviteRequest {
                max_uses: Some(3),
                max_age: None,
            },
        )
        .await
        .unwrap();

    let mut joiners = Vec::new();
    for _ in 0..8 {
        joiners.push(register_and_login(&ctx).await.user.id);
    }

    let mut tasks = Vec::new();
    for user_id in joiners {
        let ctx = ctx.clone();
        let code = invite.code.clone();
        tasks.push(tokio::spawn(async move {
            InviteService::new(&ctx).redeem_invite(&code, user_id).await
        }));
    }

    let mut admitted = 0;
    let mut exhausted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(e) => {
                assert_eq!(e.error_code(), "INVITE_EXHAUSTED");
                exhausted += 1;
            }
        }
    }
    assert_eq!(admitted, 3);
    assert_eq!(exhausted, 5);

    let stored = store
        .invites()
        .find_by_code(&invite.code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.uses, 3);

    let members = MemberService::new(&ctx)
        .list_members(guild_id, owner.user.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 4); // owner + 3 admitted
}

#[tokio::test]
async fn test_expired_invite_rejected() {
    let (ctx, store) = service_env();
    let owner = register_and_login(&ctx).await;
    let joiner = register_and_login(&ctx).await;
    let (guild_id, _channel_id) = guild_with_channel(&ctx, owner.user.id).await;

    let mut invite = Invite::new("stale123".to_string(), guild_id, owner.user.id);
    invite.expires_at = Some(Utc::now() - Duration::minutes(5));
    store.invites().create(&invite).await.unwrap();

    let err = InviteService::new(&ctx)
        .redeem_invite("stale123", joiner.user.id)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVITE_EXPIRED");
}

#[tokio::test]
async fn test_unknown_invite_rejected() {
    let (ctx, _store) = service_env();
    let user = register_and_login(&ctx).await;

    let err = InviteService::new(&ctx)
        .redeem_invite("nosuch00", user.user.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(_)));
    assert_eq!(err.error_code(), "UNKNOWN_INVITE");
}
