//! Integration tests for the active-record layer
//!
//! These run against a seeded SQLite database:
//! - Persistence (insert, update, delete)
//! - Query execution and pagination
//! - Relationship resolution (has-one, has-many, many-to-many)
//! - Failure reporting

use assert_matches::assert_matches;

use recordkit::db::{Database, bootstrap};
use recordkit::entities::{City, Role, User};
use recordkit::orm::{
    ActiveRecord, Entity, Filters, HasMany, HasOne, OrmError, RecordState, RequestContext,
    SaveHooks,
};

async fn seeded() -> Database {
    let db = Database::connect_in_memory().await.unwrap();
    bootstrap(&db).await.unwrap();
    db
}

fn ids<E: Entity>(entities: &[E]) -> Vec<i64> {
    entities.iter().filter_map(Entity::id).collect()
}

// ============================================================================
// Persistence
// ============================================================================

mod persistence {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_insert_then_get_returns_equal_fields() {
        let db = seeded().await;

        let mut user = User::new("Splinter");
        user.email = Some("splinter@sewer.net".into());
        user.id_city = Some(3);
        assert!(!user.is_persisted());

        user.save(&db).await.unwrap();
        assert!(user.is_persisted());
        let id = user.id.expect("insert assigns an id");

        let loaded = User::get(&db, id).await.unwrap();
        assert_eq!(loaded.name, "Splinter");
        assert_eq!(loaded.email.as_deref(), Some("splinter@sewer.net"));
        assert_eq!(loaded.id_city, Some(3));
        assert!(loaded.is_persisted());
    }

    #[tokio::test]
    async fn test_saving_a_loaded_entity_updates_in_place() {
        let db = seeded().await;
        let before = User::count(&db, Filters::new(), &[]).await.unwrap();

        let mut user = User::get(&db, 1).await.unwrap();
        user.name = "Raphael".into();
        user.save(&db).await.unwrap();

        assert_eq!(User::count(&db, Filters::new(), &[]).await.unwrap(), before);
        assert_eq!(User::get(&db, 1).await.unwrap().name, "Raphael");
        assert_eq!(user.id, Some(1));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let db = seeded().await;

        let mut user = User::get(&db, 4).await.unwrap();
        user.delete(&db).await.unwrap();

        assert!(!user.is_persisted());
        assert_eq!(user.name, "Donatello");

        let err = User::get(&db, 4).await.unwrap_err();
        assert_matches!(err, OrmError::NotFound { entity: "User", id: 4 });
        assert_eq!(err.to_string(), "Entity \"User\" #4 not found");
    }

    #[tokio::test]
    async fn test_deleted_entity_can_be_saved_again_with_its_id() {
        let db = seeded().await;

        let mut user = User::get(&db, 4).await.unwrap();
        user.delete(&db).await.unwrap();
        user.save(&db).await.unwrap();

        assert_eq!(user.id, Some(4));
        assert_eq!(User::get(&db, 4).await.unwrap().name, "Donatello");
    }

    #[tokio::test]
    async fn test_delete_without_id_is_a_no_op() {
        let db = seeded().await;

        let mut user = User::new("Casey");
        user.delete(&db).await.unwrap();

        assert_eq!(User::count(&db, Filters::new(), &[]).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_fill_merges_without_persisting() {
        let db = seeded().await;
        let body = serde_json::json!({ "name": "April", "email": "april@channel6.com" });

        let mut user = User::default();
        user.fill(&recordkit::orm::row_from_json(body.as_object().unwrap()))
            .unwrap();
        assert_eq!(user.name, "April");
        assert!(!user.is_persisted());
        assert_eq!(user.id, None);

        user.save(&db).await.unwrap();
        assert_eq!(User::count(&db, Filters::new(), &[]).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_storage_failure_carries_engine_message_and_code() {
        let db = seeded().await;

        let mut user = User::new("Shredder");
        user.id_city = Some(999);
        let err = user.save(&db).await.unwrap_err();

        assert_matches!(err, OrmError::Storage(ref storage) => {
            assert!(storage.message.contains("FOREIGN KEY"), "{}", storage.message);
            assert!(storage.code.is_some());
        });
        assert!(!user.is_persisted());
        assert_eq!(user.id, None);
    }

    #[tokio::test]
    async fn test_on_disk_database_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("recordkit.db");
        let url = path.to_str().unwrap();

        let id = {
            let db = Database::connect(url, 2).await.unwrap();
            bootstrap(&db).await.unwrap();
            let mut city = City::new("Gotham");
            city.save(&db).await.unwrap();
            db.pool().close().await;
            city.id.unwrap()
        };

        let db = Database::connect(url, 2).await.unwrap();
        assert_eq!(City::get(&db, id).await.unwrap().name, "Gotham");
    }
}

// ============================================================================
// Save hooks
// ============================================================================

mod hooks {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Entity, Debug, Default)]
    #[entity(table = "users", hooks)]
    pub struct AuditedUser {
        pub id: Option<i64>,
        pub name: String,
        pub email: Option<String>,
        pub _calls: Vec<String>,
        #[state]
        _state: RecordState,
    }

    impl SaveHooks for AuditedUser {
        fn before_save(&mut self) -> recordkit::orm::Result<()> {
            if self.name.trim().is_empty() {
                return Err(OrmError::Configuration("a user needs a name".into()));
            }
            self.email = self.email.take().map(|e| e.to_lowercase());
            self._calls.push(format!("before:{:?}", self.id));
            Ok(())
        }

        fn after_save(&mut self) -> recordkit::orm::Result<()> {
            self._calls.push(format!("after:{:?}", self.id));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_hooks_run_around_the_write() {
        let db = seeded().await;

        let mut user = AuditedUser {
            name: "Karai".into(),
            email: Some("KARAI@FOOT.CLAN".into()),
            ..Default::default()
        };
        user.save(&db).await.unwrap();

        let id = user.id.unwrap();
        assert_eq!(user._calls, vec!["before:None".to_string(), format!("after:Some({id})")]);
        assert_eq!(
            User::get(&db, id).await.unwrap().email.as_deref(),
            Some("karai@foot.clan")
        );
    }

    #[tokio::test]
    async fn test_failing_before_save_aborts() {
        let db = seeded().await;

        let mut user = AuditedUser::default();
        assert_matches!(user.save(&db).await, Err(OrmError::Configuration(_)));
        assert!(user._calls.is_empty());
        assert_eq!(User::count(&db, Filters::new(), &[]).await.unwrap(), 4);
    }
}

// ============================================================================
// Queries and pagination
// ============================================================================

mod queries {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_find_filters_sorts_and_pages() {
        let db = seeded().await;

        let in_miami = User::find(&db, Filters::new().eq("id_city", 2), Some("name asc"), 0, 0)
            .await
            .unwrap();
        assert_eq!(ids(&in_miami), vec![3, 2]);

        let second_page = User::find(&db, Filters::new(), Some("id asc"), 2, 2).await.unwrap();
        assert_eq!(ids(&second_page), vec![3, 4]);

        let tail = User::find(&db, Filters::new(), Some("id desc"), 0, 3).await.unwrap();
        assert_eq!(ids(&tail), vec![1]);
    }

    #[tokio::test]
    async fn test_null_filter_matches_missing_values() {
        let db = seeded().await;

        let mut user = User::new("Baxter");
        user.save(&db).await.unwrap();

        let homeless = User::find(
            &db,
            Filters::new().eq("id_city", None::<i64>),
            None,
            0,
            0,
        )
        .await
        .unwrap();
        assert_eq!(ids(&homeless), vec![user.id.unwrap()]);
    }

    #[tokio::test]
    async fn test_count_and_distinct_count() {
        let db = seeded().await;

        assert_eq!(User::count(&db, Filters::new(), &[]).await.unwrap(), 4);
        assert_eq!(
            User::count(&db, Filters::new().eq("id_city", 1), &[]).await.unwrap(),
            2
        );
        assert_eq!(User::count(&db, Filters::new(), &["id_city"]).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_paged_wraps_results() {
        let db = seeded().await;
        let request = RequestContext::new("/users", Vec::new());

        let page = User::find_paged(&db, Filters::new(), Some("id asc"), 2, 0, &request)
            .await
            .unwrap();

        assert_eq!(page.total, 4);
        assert_eq!(ids(&page.items), vec![1, 2]);
        assert!(page.links.previous.is_none());
        assert_eq!(page.links.next.unwrap().href, "/users?limit=2&offset=2");
        assert_eq!(page.links.last.unwrap().href, "/users?limit=2&offset=2");
    }

    #[tokio::test]
    async fn test_invalid_sort_is_rejected_before_the_engine() {
        let db = seeded().await;
        let result = User::find(&db, Filters::new(), Some("name; DROP TABLE users"), 0, 0).await;
        assert_matches!(result, Err(OrmError::InvalidIdentifier(_)));
        assert_eq!(User::count(&db, Filters::new(), &[]).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_fetch_optional() {
        let db = seeded().await;

        let found = User::query(&db)
            .filter(Filters::new().eq("name", "Leonardo"))
            .fetch_optional()
            .await
            .unwrap();
        assert_eq!(found.and_then(|u| u.id), Some(3));

        let missing = User::query(&db)
            .filter(Filters::new().eq("name", "Krang"))
            .fetch_optional()
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}

// ============================================================================
// Relationships
// ============================================================================

mod relationships {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_has_one_resolves_exact_target() {
        let db = seeded().await;

        let user = User::get(&db, 1).await.unwrap();
        let city = user.city(&db).await.unwrap();
        assert_eq!(city.id, Some(1));
        assert_eq!(city.name, "New York");
        assert!(city.is_persisted());
    }

    #[tokio::test]
    async fn test_has_one_defaults_on_empty_foreign_key() {
        let db = seeded().await;

        let user = User::new("Metalhead");
        let city = user.city(&db).await.unwrap();
        assert_eq!(city.id, None);
        assert_eq!(city.name, "");
        assert!(!city.is_persisted());
    }

    #[tokio::test]
    async fn test_has_one_with_dangling_key_is_not_found() {
        let db = seeded().await;

        let mut user = User::new("Bebop");
        user.id_city = Some(42);
        assert_matches!(
            user.city(&db).await,
            Err(OrmError::NotFound { entity: "City", id: 42 })
        );
    }

    #[tokio::test]
    async fn test_has_many_through_foreign_key() {
        let db = seeded().await;

        let miami = City::get(&db, 2).await.unwrap();
        assert_eq!(ids(miami.users(&db).await.unwrap()), vec![2, 3]);

        let chicago = City::get(&db, 3).await.unwrap();
        assert!(chicago.users(&db).await.unwrap().is_empty());

        let unsaved = City::new("Atlantis");
        assert!(unsaved.users(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_has_many_resolves_after_owner_is_saved() {
        let db = seeded().await;

        let mut atlantis = City::new("Atlantis");
        assert!(atlantis.users(&db).await.unwrap().is_empty());

        atlantis.save(&db).await.unwrap();
        let mut resident = User::new("Krang");
        resident.id_city = atlantis.id;
        resident.save(&db).await.unwrap();

        let users = atlantis.users(&db).await.unwrap();
        assert_eq!(ids(users), vec![resident.id.unwrap()]);
    }

    #[tokio::test]
    async fn test_has_one_resolves_after_foreign_key_is_set() {
        let db = seeded().await;

        let mut user = User::new("Rocksteady");
        assert_eq!(user.city(&db).await.unwrap().id, None);

        user.id_city = Some(3);
        assert_eq!(user.city(&db).await.unwrap().name, "Chicago");
    }

    #[tokio::test]
    async fn test_many_to_many_in_declared_order() {
        let db = seeded().await;

        let master = Role::get(&db, 1).await.unwrap();
        let users = master.users(&db).await.unwrap();
        assert_eq!(ids(users), vec![3, 2]);
        assert_eq!(users[0].name, "Leonardo");

        let michelangelo = User::get(&db, 2).await.unwrap();
        let roles = michelangelo.roles(&db).await.unwrap();
        assert_eq!(ids(roles), vec![1, 2]);

        let raphael = User::get(&db, 1).await.unwrap();
        assert_eq!(ids(raphael.roles(&db).await.unwrap()), vec![2]);
    }

    #[tokio::test]
    async fn test_results_are_memoized_per_instance() {
        let db = seeded().await;

        let raphael = User::get(&db, 1).await.unwrap();
        assert_eq!(raphael.roles(&db).await.unwrap().len(), 1);

        sqlx::query("INSERT INTO users_roles (id_user, id_role) VALUES (1, 1)")
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(raphael.roles(&db).await.unwrap().len(), 1);
        let fresh = User::get(&db, 1).await.unwrap();
        assert_eq!(fresh.roles(&db).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_prefilled_relationship_skips_loading() {
        let db = seeded().await;

        let user = User::get(&db, 1).await.unwrap();
        assert!(user.set_city(City::new("Dimension X")));
        assert_eq!(user.city(&db).await.unwrap().name, "Dimension X");
        assert!(!user.set_city(City::new("Earth")));
    }

    #[derive(Entity, Debug, Default)]
    pub struct Post {
        pub id: Option<i64>,
        pub title: String,
        #[relation(cardinality = "has_many", target = Tag)]
        tags: HasMany<Tag>,
        #[state]
        _state: RecordState,
    }

    #[derive(Entity, Debug, Default)]
    pub struct Tag {
        pub id: Option<i64>,
        pub label: String,
        #[relation(cardinality = "has_many", target = Post)]
        posts: HasMany<Post>,
        #[state]
        _state: RecordState,
    }

    #[tokio::test]
    async fn test_many_to_many_without_join_table_is_a_configuration_error() {
        let db = seeded().await;

        let post = Post {
            id: Some(1),
            ..Default::default()
        };
        assert_matches!(post.tags(&db).await, Err(OrmError::Configuration(_)));

        let tag = Tag {
            id: Some(1),
            ..Default::default()
        };
        assert_matches!(tag.posts(&db).await, Err(OrmError::Configuration(_)));
    }

    #[derive(Entity, Debug, Default)]
    #[entity(table = "users")]
    pub struct Mutant {
        pub id: Option<i64>,
        pub name: String,
        #[relation(cardinality = "owns_many", target = City)]
        lairs: HasMany<City>,
        #[relation(cardinality = "has_one")]
        sensei: HasOne<User>,
        #[relation(cardinality = "has_many", target = Role)]
        minions: HasOne<Role>,
        #[state]
        _state: RecordState,
    }

    #[tokio::test]
    async fn test_unusable_declarations_yield_defaults() {
        let db = seeded().await;

        let mutant = Mutant::query(&db)
            .filter(Filters::new().eq("id", 2))
            .fetch_optional()
            .await
            .unwrap()
            .unwrap();

        assert!(mutant.lairs(&db).await.unwrap().is_empty());
        assert_eq!(mutant.sensei(&db).await.unwrap().id, None);
        // Declared has-many but held in a has-one cell
        assert_eq!(mutant.minions(&db).await.unwrap().id, None);
    }
}
