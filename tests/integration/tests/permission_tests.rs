//! Permission resolution
//!
//! Effective permissions are the OR of the member's role masks, computed
//! on demand. The owner bypasses roles; a memberless user resolves to an
//! error and a roleless member to the empty mask.

use harbor_core::{GuildMember, MemberRepository, Permissions};
use harbor_service::dto::{CreateRoleRequest, UpdateRoleRequest};
use harbor_service::{MemberService, PermissionService, RoleService, ServiceError};
use integration_tests::{guild_with_channel, register_and_login, service_env};

#[tokio::test]
async fn test_owner_resolves_to_all_bits() {
    let (ctx, _store) = service_env();
    let owner = register_and_login(&ctx).await;
    let (guild_id, _channel_id) = guild_with_channel(&ctx, owner.user.id).await;

    let resolved = PermissionService::new(&ctx)
        .resolve(guild_id, owner.user.id)
        .await
        .unwrap();
    assert_eq!(resolved, Permissions::ALL);
}

#[tokio::test]
async fn test_role_masks_or_together() {
    let (ctx, store) = service_env();
    let owner = register_and_login(&ctx).await;
    let member = register_and_login(&ctx).await;
    let (guild_id, _channel_id) = guild_with_channel(&ctx, owner.user.id).await;

    store
        .members()
        .create(&GuildMember::new(guild_id, member.user.id))
        .await
        .unwrap();

    let roles = RoleService::new(&ctx);
    let viewer = roles
        .create_role(
            guild_id,
            owner.user.id,
            CreateRoleRequest {
                name: "viewer".to_string(),
                permissions: Some(Permissions::VIEW_CHANNEL.bits().to_string()),
            },
        )
        .await
        .unwrap();
    let speaker = roles
        .create_role(
            guild_id,
            owner.user.id,
            CreateRoleRequest {
                name: "speaker".to_string(),
                permissions: Some(Permissions::SEND_MESSAGES.bits().to_string()),
            },
        )
        .await
        .unwrap();

    let members = MemberService::new(&ctx);
    members
        .assign_role(guild_id, owner.user.id, member.user.id, viewer.id)
        .await
        .unwrap();
    members
        .assign_role(guild_id, owner.user.id, member.user.id, speaker.id)
        .await
        .unwrap();

    let resolved = PermissionService::new(&ctx)
        .resolve(guild_id, member.user.id)
        .await
        .unwrap();
    assert!(resolved.has(Permissions::VIEW_CHANNEL));
    assert!(resolved.has(Permissions::SEND_MESSAGES));
    assert!(!resolved.has(Permissions::MANAGE_GUILD));
}

#[tokio::test]
async fn test_roleless_member_resolves_to_empty_mask() {
    let (ctx, store) = service_env();
    let owner = register_and_login(&ctx).await;
    let member = register_and_login(&ctx).await;
    let (guild_id, _channel_id) = guild_with_channel(&ctx, owner.user.id).await;

    store
        .members()
        .create(&GuildMember::new(guild_id, member.user.id))
        .await
        .unwrap();

    let permissions = PermissionService::new(&ctx);
    let resolved = permissions.resolve(guild_id, member.user.id).await.unwrap();
    assert!(resolved.is_empty());

    let denied = permissions
        .require(guild_id, member.user.id, Permissions::SEND_MESSAGES)
        .await
        .unwrap_err();
    assert!(matches!(denied, ServiceError::PermissionDenied { .. }));
}

#[tokio::test]
async fn test_non_member_resolution_errors() {
    let (ctx, _store) = service_env();
    let owner = register_and_login(&ctx).await;
    let outsider = register_and_login(&ctx).await;
    let (guild_id, _channel_id) = guild_with_channel(&ctx, owner.user.id).await;

    let err = PermissionService::new(&ctx)
        .resolve(guild_id, outsider.user.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn test_role_change_visible_on_next_check() {
    let (ctx, store) = service_env();
    let owner = register_and_login(&ctx).await;
    let member = register_and_login(&ctx).await;
    let (guild_id, _channel_id) = guild_with_channel(&ctx, owner.user.id).await;

    store
        .members()
        .create(&GuildMember::new(guild_id, member.user.id))
        .await
        .unwrap();

    let roles = RoleService::new(&ctx);
    let role = roles
        .create_role(
            guild_id,
            owner.user.id,
            CreateRoleRequest {
                name: "viewer".to_string(),
                permissions: Some(Permissions::VIEW_CHANNEL.bits().to_string()),
            },
        )
        .await
        .unwrap();
    MemberService::new(&ctx)
        .assign_role(guild_id, owner.user.id, member.user.id, role.id)
        .await
        .unwrap();

    let permissions = PermissionService::new(&ctx);
    assert!(!permissions
        .resolve(guild_id, member.user.id)
        .await
        .unwrap()
        .has(Permissions::SEND_MESSAGES));

    // Nothing is cached, so a role edit takes effect immediately
    roles
        .update_role(
            guild_id,
            role.id,
            owner.user.id,
            UpdateRoleRequest {
                name: None,
                permissions: Some(
                    (Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES)
                        .bits()
                        .to_string(),
                ),
                position: None,
            },
        )
        .await
        .unwrap();

    assert!(permissions
        .resolve(guild_id, member.user.id)
        .await
        .unwrap()
        .has(Permissions::SEND_MESSAGES));
}
