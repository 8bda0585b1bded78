use orders_repo::{build_repo, Repo};
use orders_types::ports::identity_repository::IdentityRepository;
use orders_types::ports::order_item_repository::OrderItemRepository;
use orders_types::ports::order_repository::OrderRepository;

#[tokio::test]
async fn builds_repo_from_database_url() {
    // Use a temp DB path for isolation.
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("orders-test.db");
    let url = format!("sqlite://{}", db_path.display());

    let repo: Repo = build_repo(Some(&url)).await.expect("build repo");
    // basic sanity: every table is reachable and empty
    assert!(repo.list().await.expect("list").is_empty());
    assert!(repo
        .list_items(uuid::Uuid::new_v4())
        .await
        .expect("list items")
        .is_empty());
    assert!(repo
        .find_identity_by_username("nobody")
        .await
        .expect("lookup")
        .is_none());
}
