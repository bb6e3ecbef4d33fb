//! Gateway fan-out, end to end through the service layer
//!
//! Events published by the services flow through the fanout dispatcher to
//! subscribed connections: per-channel commit order, overflow isolation,
//! and revocation acknowledged before the triggering call returns.

use harbor_core::{GuildMember, MemberRepository, RoleRepository, Snowflake};
use harbor_gateway::protocol::{CloseCode, OpCode};
use harbor_service::dto::CreateMessageRequest;
use harbor_service::{AuthService, MemberService, MessageService, ServiceError};
use integration_tests::{
    attach_connection, drain_messages, gateway_env, guild_with_channel, recv_message,
    register_and_login,
};

fn message_request(content: &str) -> CreateMessageRequest {
    CreateMessageRequest {
        content: content.to_string(),
        reply_to: None,
    }
}

/// Wait until the dispatcher has processed everything queued so far
///
/// Revocations are acknowledged in queue order, so acking one for an
/// unknown session flushes all earlier commands.
async fn flush(ctx: &harbor_service::ServiceContext) {
    ctx.event_sink().close_session(Snowflake::new(i64::MAX)).await;
}

#[tokio::test]
async fn test_channel_events_arrive_in_commit_order() {
    let env = gateway_env();
    let owner = register_and_login(&env.services).await;
    let (guild_id, channel_id) = guild_with_channel(&env.services, owner.user.id).await;

    let mut first_conn = attach_connection(
        &env.manager,
        "orderly-1",
        16,
        owner.user.id,
        owner.session.id,
        &[guild_id],
        &[(channel_id, Some(guild_id))],
    );
    let mut second_conn = attach_connection(
        &env.manager,
        "orderly-2",
        16,
        owner.user.id,
        owner.session.id,
        &[guild_id],
        &[(channel_id, Some(guild_id))],
    );

    let messages = MessageService::new(&env.services);
    for content in ["first", "second", "third"] {
        messages
            .send_message(channel_id, owner.user.id, message_request(content))
            .await
            .unwrap();
    }
    flush(&env.services).await;

    let mut observed = Vec::new();
    for conn in [&mut first_conn, &mut second_conn] {
        let mut seen = Vec::new();
        let mut last_seq = 0;
        for frame in drain_messages(&mut conn.rx) {
            assert_eq!(frame.op, OpCode::Dispatch);
            let seq = frame.s.expect("dispatch frames carry a sequence");
            assert!(seq > last_seq, "sequence must be strictly increasing");
            last_seq = seq;
            if frame.t.as_deref() == Some("MESSAGE_CREATED") {
                let payload = frame.d.expect("dispatch frames carry a payload");
                seen.push(
                    payload
                        .get("content")
                        .and_then(|c| c.as_str())
                        .unwrap_or_default()
                        .to_string(),
                );
            }
        }
        assert_eq!(seen, vec!["first", "second", "third"]);
        observed.push(seen);
    }
    // Both subscribers saw the same relative order
    assert_eq!(observed[0], observed[1]);
}

#[tokio::test]
async fn test_overflow_drops_only_the_slow_connection() {
    let env = gateway_env();
    let owner = register_and_login(&env.services).await;
    let (guild_id, channel_id) = guild_with_channel(&env.services, owner.user.id).await;

    let mut slow = attach_connection(
        &env.manager,
        "slow",
        1,
        owner.user.id,
        owner.session.id,
        &[],
        &[(channel_id, Some(guild_id))],
    );
    let mut fast = attach_connection(
        &env.manager,
        "fast",
        16,
        owner.user.id,
        owner.session.id,
        &[],
        &[(channel_id, Some(guild_id))],
    );

    let messages = MessageService::new(&env.services);
    for content in ["a", "b", "c"] {
        messages
            .send_message(channel_id, owner.user.id, message_request(content))
            .await
            .unwrap();
    }
    flush(&env.services).await;

    // The slow connection kept its one queued event and was then closed
    assert_eq!(*slow.close_rx.borrow(), Some(CloseCode::QueueOverflow));
    assert!(drain_messages(&mut slow.rx).len() <= 1);
    assert!(env.manager.get_connection("slow").is_none());

    // The fast connection saw every event
    let fast_frames = drain_messages(&mut fast.rx);
    assert_eq!(
        fast_frames
            .iter()
            .filter(|f| f.t.as_deref() == Some("MESSAGE_CREATED"))
            .count(),
        3
    );
}

#[tokio::test]
async fn test_kick_stops_delivery_before_returning() {
    let env = gateway_env();
    let owner = register_and_login(&env.services).await;
    let target = register_and_login(&env.services).await;
    let (guild_id, channel_id) = guild_with_channel(&env.services, owner.user.id).await;

    // Target joins through the storage layer; the flows under test start after
    env.store
        .members()
        .create(&GuildMember::new(guild_id, target.user.id))
        .await
        .unwrap();

    let mut kicked = attach_connection(
        &env.manager,
        "kicked",
        16,
        target.user.id,
        target.session.id,
        &[guild_id],
        &[(channel_id, Some(guild_id))],
    );

    // Let setup-time events settle and discard them; only the post-kick
    // window is under test
    flush(&env.services).await;
    drain_messages(&mut kicked.rx);

    MemberService::new(&env.services)
        .kick_member(guild_id, owner.user.id, target.user.id)
        .await
        .unwrap();

    // Everything after the kick returned is invisible to the target,
    // including the MEMBER_LEFT published for the rest of the guild
    MessageService::new(&env.services)
        .send_message(channel_id, owner.user.id, message_request("after the kick"))
        .await
        .unwrap();
    flush(&env.services).await;

    assert!(drain_messages(&mut kicked.rx).is_empty());
}

#[tokio::test]
async fn test_role_revocation_severs_send_and_read() {
    let env = gateway_env();
    let owner = register_and_login(&env.services).await;
    let target = register_and_login(&env.services).await;
    let (guild_id, channel_id) = guild_with_channel(&env.services, owner.user.id).await;

    let member_role = env
        .store
        .roles()
        .list_for_guild(guild_id)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.name == "member")
        .expect("guild creation seeds the member role");

    let mut membership = GuildMember::new(guild_id, target.user.id);
    membership.add_role(member_role.id);
    env.store.members().create(&membership).await.unwrap();

    let mut conn = attach_connection(
        &env.manager,
        "demoted",
        16,
        target.user.id,
        target.session.id,
        &[guild_id],
        &[(channel_id, Some(guild_id))],
    );

    let messages = MessageService::new(&env.services);
    messages
        .send_message(channel_id, target.user.id, message_request("still allowed"))
        .await
        .unwrap();
    flush(&env.services).await;
    assert!(!drain_messages(&mut conn.rx).is_empty());

    // Take the only role granting SEND_MESSAGES (and VIEW_CHANNEL)
    MemberService::new(&env.services)
        .remove_role(guild_id, owner.user.id, target.user.id, member_role.id)
        .await
        .unwrap();

    let denied = messages
        .send_message(channel_id, target.user.id, message_request("now denied"))
        .await
        .unwrap_err();
    assert!(matches!(denied, ServiceError::PermissionDenied { .. }));

    // Events committed after the removal acknowledged never reach them
    messages
        .send_message(channel_id, owner.user.id, message_request("members only"))
        .await
        .unwrap();
    flush(&env.services).await;
    assert!(drain_messages(&mut conn.rx).is_empty());
}

#[tokio::test]
async fn test_logout_closes_bound_connection() {
    let env = gateway_env();
    let user = register_and_login(&env.services).await;

    let mut conn = attach_connection(
        &env.manager,
        "doomed",
        16,
        user.user.id,
        user.session.id,
        &[],
        &[],
    );

    AuthService::new(&env.services)
        .logout(user.session.id)
        .await
        .unwrap();
    flush(&env.services).await;

    let frame = recv_message(&mut conn.rx).await;
    assert_eq!(frame.op, OpCode::InvalidSession);
    assert_eq!(*conn.close_rx.borrow(), Some(CloseCode::AuthenticationFailed));
}
