//! Reaction set semantics through the service layer

use harbor_service::dto::CreateMessageRequest;
use harbor_service::{MessageService, ReactionService};
use integration_tests::{guild_with_channel, register_and_login, service_env};

#[tokio::test]
async fn test_duplicate_reaction_stores_one_row() {
    let (ctx, _store) = service_env();
    let owner = register_and_login(&ctx).await;
    let (_guild_id, channel_id) = guild_with_channel(&ctx, owner.user.id).await;

    let message = MessageService::new(&ctx)
        .send_message(
            channel_id,
            owner.user.id,
            CreateMessageRequest {
                content: "react to this".to_string(),
                reply_to: None,
            },
        )
        .await
        .unwrap();

    let reactions = ReactionService::new(&ctx);
    reactions
        .add_reaction(message.id, owner.user.id, "😀")
        .await
        .unwrap();
    reactions
        .add_reaction(message.id, owner.user.id, "😀")
        .await
        .unwrap();

    let listed = reactions
        .list_reactions(message.id, owner.user.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].emoji, "😀");
}

#[tokio::test]
async fn test_removing_absent_reaction_is_a_no_op() {
    let (ctx, _store) = service_env();
    let owner = register_and_login(&ctx).await;
    let (_guild_id, channel_id) = guild_with_channel(&ctx, owner.user.id).await;

    let message = MessageService::new(&ctx)
        .send_message(
            channel_id,
            owner.user.id,
            CreateMessageRequest {
                content: "nothing here".to_string(),
                reply_to: None,
            },
        )
        .await
        .unwrap();

    ReactionService::new(&ctx)
        .remove_reaction(message.id, owner.user.id, "😀")
        .await
        .unwrap();
}
