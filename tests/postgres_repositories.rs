use std::path::PathBuf;
use std::sync::Arc;

use elvis::application::attachments::{MediaLocation, RequestOrigin};
use elvis::application::pagination::PageRequest;
use elvis::application::repos::{
    AttachmentsRepo, CatalogRepo, CollectionsRepo, ComposersRepo, MovementsRepo, PiecesRepo,
    TaxonomyRepo, UsersRepo,
};
use elvis::application::serializers::{SiteLinks, TieredSerializer, Viewer};
use elvis::cache::{CacheConfig, MemoryCache};
use elvis::domain::types::{CatalogItem, TaxonomyKind};
use elvis::infra::db::PostgresRepositories;
use serde_json::{Value, json};
use sqlx::PgPool;

const SEED: &str = r#"
INSERT INTO users (id, username, first_name, last_name) VALUES (1, 'ada', 'Ada', 'Lovelace');
INSERT INTO composers (id, name, birth_date) VALUES (1, 'Josquin des Prez', '1450-01-01');
INSERT INTO pieces (id, title, composer_id, creator_id, composition_end_date)
    VALUES (10, 'Missa Pange lingua', 1, 1, 1515), (11, 'Ave Maria', 1, NULL, NULL), (12, 'Chant', NULL, NULL, NULL);
INSERT INTO movements (id, title, piece_id, composer_id, position)
    VALUES (21, 'Gloria', 10, 1, 2), (20, 'Kyrie', 10, 1, 1), (22, 'Motet', NULL, 1, NULL);
INSERT INTO collections (id, title, public, creator_id) VALUES (30, 'Masses', TRUE, 1);
INSERT INTO collection_pieces (collection_id, piece_id) VALUES (30, 10);
INSERT INTO collection_movements (collection_id, movement_id) VALUES (30, 20);
INSERT INTO attachments (id, stored_path, uploader_id) VALUES (40, '/media/scores/piece1.pdf', 1);
INSERT INTO piece_attachments (piece_id, attachment_id) VALUES (10, 40);
INSERT INTO taxonomy_terms (id, kind, title) VALUES (50, 'genre', 'Mass'), (51, 'tag', 'renaissance');
INSERT INTO piece_terms (piece_id, term_id) VALUES (10, 50), (10, 51);
"#;

async fn seeded(pool: PgPool) -> PostgresRepositories {
    sqlx::raw_sql(SEED)
        .execute(&pool)
        .await
        .expect("seed catalogue");
    PostgresRepositories::new(pool)
}

#[sqlx::test(migrations = "./migrations")]
async fn finds_records_and_relationships(pool: PgPool) {
    let repos = seeded(pool).await;

    let piece = repos
        .find_piece(10)
        .await
        .expect("query")
        .expect("piece");
    assert_eq!(piece.title, "Missa Pange lingua");
    assert_eq!(piece.composer_id, Some(1));
    assert!(repos.find_piece(999).await.expect("query").is_none());

    let movements = repos.piece_movements(10).await.expect("movements");
    let ids: Vec<i64> = movements.iter().map(|movement| movement.id).collect();
    assert_eq!(ids, [20, 21]);
    assert_eq!(repos.count_piece_movements(10).await.expect("count"), 2);

    let free = repos.composer_free_movements(1).await.expect("free");
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].title, "Motet");

    let counts = repos.composer_counts(1).await.expect("counts");
    assert_eq!(counts.pieces, 2);
    assert_eq!(counts.movements, 3);

    let genres = repos
        .item_terms(CatalogItem::Piece(10), TaxonomyKind::Genre)
        .await
        .expect("genres");
    assert_eq!(genres.len(), 1);
    assert_eq!(genres[0].title, "Mass");

    let collections = repos
        .item_collections(CatalogItem::Movement(20))
        .await
        .expect("collections");
    assert_eq!(collections.len(), 1);
    assert!(collections[0].public);

    let attachments = repos
        .item_attachments(CatalogItem::Piece(10))
        .await
        .expect("attachments");
    assert_eq!(attachments[0].file_name(), "piece1.pdf");
    assert!(repos.find_attachment(40).await.expect("query").is_some());

    let user = repos.find_user(1).await.expect("query").expect("user");
    assert_eq!(user.display_name(), "Ada Lovelace");
    assert_eq!(repos.user_pieces(1).await.expect("pieces").len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn listings_use_keyset_pagination(pool: PgPool) {
    let repos = seeded(pool).await;

    let first = repos
        .list_pieces(PageRequest::from_query(Some(2), None).expect("page"))
        .await
        .expect("first page");
    let ids: Vec<i64> = first.items.iter().map(|piece| piece.id).collect();
    assert_eq!(ids, [10, 11]);
    let cursor = first.next_cursor.expect("next cursor");

    let second = repos
        .list_pieces(PageRequest::from_query(Some(2), Some(&cursor)).expect("page"))
        .await
        .expect("second page");
    let ids: Vec<i64> = second.items.iter().map(|piece| piece.id).collect();
    assert_eq!(ids, [12]);
    assert!(second.next_cursor.is_none());

    let movements = repos
        .list_movements(PageRequest::from_query(None, None).expect("page"))
        .await
        .expect("movements");
    assert_eq!(movements.items.len(), 3);

    let composers = repos
        .list_composers(PageRequest::from_query(None, None).expect("page"))
        .await
        .expect("composers");
    assert_eq!(composers.items.len(), 1);
    assert_eq!(
        repos.collection_counts(30).await.expect("counts").movements,
        1
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn serializes_database_records(pool: PgPool) {
    let repos = Arc::new(seeded(pool).await);
    let catalog: Arc<dyn CatalogRepo> = repos.clone();
    let serializer = TieredSerializer::new(
        Arc::new(MemoryCache::new(&CacheConfig::default())),
        catalog,
        SiteLinks::new("https://elvis.example.org"),
        MediaLocation {
            root: PathBuf::from("/media/"),
            url: "/media/".to_string(),
        },
    );
    let viewer = Viewer::anonymous(RequestOrigin::new("https", "elvis.example.org"));

    let piece = repos
        .find_piece(10)
        .await
        .expect("query")
        .expect("piece");
    let full = serializer.full(&piece, &viewer).await.expect("full");

    assert_eq!(
        full.get("composer"),
        Some(&json!({
            "title": "Josquin des Prez",
            "url": "https://elvis.example.org/api/composers/1",
            "id": 1
        }))
    );
    assert_eq!(full.get("genres"), Some(&json!([{ "title": "Mass", "id": 50 }])));
    assert_eq!(full.get("creator"), Some(&json!("ada")));

    let chant = repos
        .find_piece(12)
        .await
        .expect("query")
        .expect("piece");
    let list = serializer.list(&chant).await.expect("list");
    assert_eq!(list.get("composer"), Some(&Value::Null));
    assert_eq!(list.get("movement_count"), Some(&json!(0)));
}
