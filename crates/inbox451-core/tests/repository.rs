//! Repository contract tests shared by every entity.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use inbox451_core::{
    Database, Error, ErrorKind, ForwardRule, Inbox, InboxId, InboxRepository, MembershipId,
    MembershipRepository, MembershipScope, Message, MessageId, MessageRepository, Page, Project,
    ProjectId, ProjectMember, ProjectRepository, ProjectRole, ProjectScope, Repository, RuleId,
    RuleRepository, RuleScope, Token, TokenId, TokenRepository, TokenService, User, UserId,
    UserRepository,
};

const MISSING: i64 = 4_040;

async fn assert_missing<R: Repository>(repo: &R, id: R::Id, mut unsaved: R::Entity) {
    assert!(repo.get(id).await.unwrap_err().is_not_found(), "{} get", R::ENTITY);
    assert!(repo.delete(id).await.unwrap_err().is_not_found(), "{} delete", R::ENTITY);
    // An unsaved entity cannot be updated at all.
    assert_eq!(
        repo.update(&mut unsaved).await.unwrap_err().kind(),
        ErrorKind::Validation,
        "{} update",
        R::ENTITY
    );
}

async fn assert_update_missing<R: Repository>(repo: &R, mut stale: R::Entity) {
    let err = repo.update(&mut stale).await.unwrap_err();
    assert!(err.is_not_found(), "{} update: {err}", R::ENTITY);
}

#[tokio::test]
async fn test_not_found_for_every_entity() {
    let db = Database::in_memory().await.unwrap();
    let projects = ProjectRepository::new(&db);
    let users = UserRepository::new(&db);
    let members = MembershipRepository::new(&db);
    let inboxes = InboxRepository::new(&db);
    let rules = RuleRepository::new(&db);
    let messages = MessageRepository::new(&db);
    let tokens = TokenRepository::new(&db);

    let project_id = ProjectId::new(MISSING);
    let user_id = UserId::new(MISSING);
    let inbox_id = InboxId::new(MISSING);

    assert_missing(&projects, project_id, Project::new("P")).await;
    assert_missing(&users, user_id, User::new("U", "u", "u@x.com")).await;
    assert_missing(
        &members,
        MembershipId::new(MISSING),
        ProjectMember::new(project_id, user_id, ProjectRole::User),
    )
    .await;
    assert_missing(&inboxes, inbox_id, Inbox::new(project_id, "a@x.com")).await;
    assert_missing(
        &rules,
        RuleId::new(MISSING),
        ForwardRule::new(inbox_id, "s@y.com", "a@x.com", ""),
    )
    .await;
    assert_missing(
        &messages,
        MessageId::new(MISSING),
        Message::new(inbox_id, "s@y.com", "a@x.com", "", ""),
    )
    .await;
    assert_missing(&tokens, TokenId::new(MISSING), Token::issue(user_id, None, None)).await;

    // Entities carrying an id that no longer exists.
    let mut project = Project::new("P");
    project.id = Some(project_id);
    assert_update_missing(&projects, project).await;

    let mut user = User::new("U", "u", "u@x.com");
    user.id = Some(user_id);
    assert_update_missing(&users, user).await;

    let mut member = ProjectMember::new(project_id, user_id, ProjectRole::User);
    member.id = Some(MembershipId::new(MISSING));
    assert_update_missing(&members, member).await;

    let mut inbox = Inbox::new(project_id, "a@x.com");
    inbox.id = Some(inbox_id);
    assert_update_missing(&inboxes, inbox).await;

    let mut rule = ForwardRule::new(inbox_id, "s@y.com", "a@x.com", "");
    rule.id = Some(RuleId::new(MISSING));
    assert_update_missing(&rules, rule).await;

    let mut message = Message::new(inbox_id, "s@y.com", "a@x.com", "", "");
    message.id = Some(MessageId::new(MISSING));
    assert_update_missing(&messages, message).await;

    let mut token = Token::issue(user_id, None, None);
    token.id = Some(TokenId::new(MISSING));
    assert_update_missing(&tokens, token).await;
}

#[tokio::test]
async fn test_empty_lists_report_zero_total() {
    let db = Database::in_memory().await.unwrap();
    let page = Page::new(10, 0);

    let projects = ProjectRepository::new(&db)
        .list(ProjectScope::All, page)
        .await
        .unwrap();
    assert!(projects.is_empty());
    assert_eq!(projects.pagination.total, 0);
    assert_eq!(projects.pagination.limit, 10);

    let id = ProjectId::new(1);
    assert_eq!(InboxRepository::new(&db).list(id, page).await.unwrap().total(), 0);
    assert_eq!(
        RuleRepository::new(&db)
            .list(RuleScope::Inbox(InboxId::new(1)), page)
            .await
            .unwrap()
            .total(),
        0
    );
    assert_eq!(
        MessageRepository::new(&db)
            .list(InboxId::new(1), page)
            .await
            .unwrap()
            .total(),
        0
    );
    assert_eq!(
        MembershipRepository::new(&db)
            .list(MembershipScope::Project(id), page)
            .await
            .unwrap()
            .total(),
        0
    );
    assert_eq!(UserRepository::new(&db).list((), page).await.unwrap().total(), 0);
    assert_eq!(
        TokenRepository::new(&db)
            .list(UserId::new(1), page)
            .await
            .unwrap()
            .total(),
        0
    );
}

#[tokio::test]
async fn test_duplicate_inbox_email_conflicts_across_projects() {
    let db = Database::in_memory().await.unwrap();
    let projects = ProjectRepository::new(&db);
    let inboxes = InboxRepository::new(&db);
    let p1 = projects.create(Project::new("P1")).await.unwrap().id.unwrap();
    let p2 = projects.create(Project::new("P2")).await.unwrap().id.unwrap();

    let first = inboxes.create(Inbox::new(p1, "a@x.com")).await.unwrap();
    let err = inboxes.create(Inbox::new(p2, "a@x.com")).await.unwrap_err();
    assert!(matches!(err, Error::Conflict { entity: "inbox", .. }));

    assert_eq!(inboxes.list(p1, Page::default()).await.unwrap().data, vec![first]);
    assert!(inboxes.list(p2, Page::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tokens_are_distinct_and_owner_scoped() {
    let db = Database::in_memory().await.unwrap();
    let users = UserRepository::new(&db);
    let alice = users
        .create(User::new("Alice", "alice", "alice@x.com"))
        .await
        .unwrap()
        .id
        .unwrap();
    let bob = users
        .create(User::new("Bob", "bob", "bob@x.com"))
        .await
        .unwrap()
        .id
        .unwrap();
    let service = TokenService::new(&db);

    let mut values = HashSet::new();
    let mut last = None;
    for _ in 0..10 {
        let token = service.create_for_user(alice, None, None).await.unwrap();
        assert!(!token.token.is_empty());
        values.insert(token.token);
        last = token.id;
    }
    assert_eq!(values.len(), 10);

    let id = last.unwrap();
    assert!(service.get_by_user(id, bob).await.unwrap_err().is_not_found());
    assert!(service.delete_by_user(bob, id).await.unwrap_err().is_not_found());
    assert_eq!(service.get_by_user(id, alice).await.unwrap().user_id, alice);
}

#[tokio::test]
async fn test_cascading_deletes() {
    let db = Database::in_memory().await.unwrap();
    let projects = ProjectRepository::new(&db);
    let users = UserRepository::new(&db);
    let members = MembershipRepository::new(&db);
    let inboxes = InboxRepository::new(&db);
    let rules = RuleRepository::new(&db);
    let messages = MessageRepository::new(&db);
    let tokens = TokenRepository::new(&db);

    let project_id = projects.create(Project::new("P1")).await.unwrap().id.unwrap();
    let user_id = users
        .create(User::new("Ada", "ada", "ada@x.com"))
        .await
        .unwrap()
        .id
        .unwrap();
    members
        .create(ProjectMember::new(project_id, user_id, ProjectRole::Admin))
        .await
        .unwrap();
    let inbox_id = inboxes
        .create(Inbox::new(project_id, "a@x.com"))
        .await
        .unwrap()
        .id
        .unwrap();
    let rule_id = rules
        .create(ForwardRule::new(inbox_id, "s@y.com", "a@x.com", "Hi"))
        .await
        .unwrap()
        .id
        .unwrap();
    let message_id = messages
        .create(Message::new(inbox_id, "s@y.com", "a@x.com", "Hi", ""))
        .await
        .unwrap()
        .id
        .unwrap();
    let token_id = tokens
        .create(Token::issue(user_id, None, None))
        .await
        .unwrap()
        .id
        .unwrap();

    projects.delete(project_id).await.unwrap();
    assert!(inboxes.get(inbox_id).await.unwrap_err().is_not_found());
    assert!(rules.get(rule_id).await.unwrap_err().is_not_found());
    assert!(messages.get(message_id).await.unwrap_err().is_not_found());
    assert!(members.find(project_id, user_id).await.unwrap().is_none());
    // The user itself is untouched.
    assert!(tokens.get(token_id).await.is_ok());

    users.delete(user_id).await.unwrap();
    assert!(tokens.get(token_id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_project_listing_by_member() {
    let db = Database::in_memory().await.unwrap();
    let projects = ProjectRepository::new(&db);
    let members = MembershipRepository::new(&db);
    let user_id = UserRepository::new(&db)
        .create(User::new("Ada", "ada", "ada@x.com"))
        .await
        .unwrap()
        .id
        .unwrap();

    let mut mine = Vec::new();
    for n in 0..5 {
        let id = projects
            .create(Project::new(format!("P{n}")))
            .await
            .unwrap()
            .id
            .unwrap();
        if n % 2 == 0 {
            members
                .create(ProjectMember::new(id, user_id, ProjectRole::User))
                .await
                .unwrap();
            mine.push(id);
        }
    }

    let page = projects
        .list(ProjectScope::Member(user_id), Page::new(2, 1))
        .await
        .unwrap();
    assert_eq!(page.total(), 3);
    let ids: Vec<_> = page.data.iter().filter_map(|p| p.id).collect();
    assert_eq!(ids, mine[1..].to_vec());

    let memberships = members
        .list(MembershipScope::User(user_id), Page::default())
        .await
        .unwrap();
    assert_eq!(memberships.total(), 3);
}
