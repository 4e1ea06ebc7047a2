#![allow(dead_code)]

use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use queryhandler::{
    FilterSet, KeyValueJoinFactory, ManyToManyJoinFilter, OneToManyJoinFilter,
    OneToManyKeyValueJoinFilter, OneToOneJoinFilter, Payload, QueryError, QueryHandler,
    QueryOptions, Records,
};
use sea_orm::{
    ActiveValue::Set, Database, DatabaseConnection, DbErr, EntityTrait, RelationTrait, Schema,
};
use sea_orm_migration::prelude::*;
use serde_json::Value as JsonValue;

pub mod author;
pub mod comment;
pub mod post;
pub mod post_attribute;
pub mod post_role;
pub mod post_tag;
pub mod tag;

/// Route filter logs to the test output; `RUST_LOG=queryhandler=debug` shows the SQL.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    seed(&db).await?;
    Ok(db)
}

/// Filters accepted by `/posts`.
pub fn post_filters() -> FilterSet<post::Entity> {
    FilterSet::<post::Entity>::new()
        .relation("owner", |key, value| {
            Ok(Box::new(OneToOneJoinFilter::<post::Entity, author::Entity>::new(
                key,
                value,
                post::Relation::Owner.def(),
            )))
        })
        .relation("comments", |key, value| {
            Ok(Box::new(
                OneToManyJoinFilter::<post::Entity, comment::Entity>::new(
                    key,
                    value,
                    post::Relation::Comments.def(),
                )
                .with_default_column("body"),
            ))
        })
        .relation("tags", |key, value| {
            Ok(Box::new(
                ManyToManyJoinFilter::<post::Entity, post_tag::Entity, tag::Entity>::new(
                    key,
                    value,
                    post::Relation::PostTags.def(),
                    post_tag::Relation::Tag.def(),
                ),
            ))
        })
        .relation("attrs", |key, value| {
            Ok(Box::new(
                OneToManyKeyValueJoinFilter::<post::Entity, post_attribute::Entity>::new(
                    key,
                    value,
                    post::Relation::Attributes.def(),
                    "name",
                    "content",
                ),
            ))
        })
        .relation("people", |key, value| {
            KeyValueJoinFactory::<post::Entity, post_role::Entity, author::Entity>::new(
                key,
                value,
                post::Relation::Roles.def(),
                "role",
                "author_id",
            )
            .with_secondary(post_role::Relation::Author.def())
            .build()
        })
}

/// Handler for raw query-string pairs, as `/posts` builds it.
pub fn post_handler(pairs: &[(&str, &str)]) -> QueryHandler<post::Entity> {
    let pairs = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()));
    let (options, filters) = QueryOptions::from_pairs(pairs).expect("valid options");
    QueryHandler::from_options(&options, &post_filters(), &filters)
}

/// Ids of the posts matching `pairs`, in page order.
pub async fn post_ids(db: &DatabaseConnection, pairs: &[(&str, &str)]) -> Vec<i64> {
    let records = post_handler(pairs)
        .results(db)
        .await
        .expect("query runs");
    let Records::List(records) = records else {
        panic!("expected a flat list");
    };
    ids(&records)
}

pub fn ids(records: &[JsonValue]) -> Vec<i64> {
    records
        .iter()
        .map(|r| r["id"].as_i64().expect("record has an id"))
        .collect()
}

async fn list_posts(
    State(db): State<DatabaseConnection>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, QueryError> {
    let (options, filters) = QueryOptions::from_pairs(pairs)?;
    let handler = QueryHandler::<post::Entity>::from_options(&options, &post_filters(), &filters);
    let payload = handler.payload(&db).await?;
    Ok(match &payload {
        Payload::Page { total_count, .. } => {
            (handler.content_range(*total_count), payload).into_response()
        }
        Payload::Single(_) => payload.into_response(),
    })
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let api = Router::new()
        .route("/posts", get(list_posts))
        .with_state(db);

    Router::new().nest("/api/v1", api)
}

async fn seed(db: &DatabaseConnection) -> Result<(), DbErr> {
    let authors = [
        (1, "Alice", "alice@example.com"),
        (2, "Bob", "bob@sample.org"),
        (3, "Carol", "carol@example.com"),
    ];
    author::Entity::insert_many(authors.map(|(id, name, email)| author::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
    }))
    .exec_without_returning(db)
    .await?;

    let posts = [
        (1, "Intro to Rust", "published", 150, 1, "N"),
        (2, "Async Rust deep dive", "published", 320, 2, "N"),
        (3, "Draft: 100% coverage", "draft", 10, 1, "N"),
        (4, "Deleted post", "published", 999, 3, "Y"),
        (5, "Gardening tips", "archived", 45, 3, "N"),
    ];
    post::Entity::insert_many(posts.map(|(id, title, status, views, owner_id, is_deleted)| {
        post::ActiveModel {
            id: Set(id),
            title: Set(title.to_string()),
            status: Set(status.to_string()),
            views: Set(views),
            owner_id: Set(owner_id),
            is_deleted: Set(is_deleted.to_string()),
        }
    }))
    .exec_without_returning(db)
    .await?;

    let comments = [
        (1, 1, "great read", 5),
        (2, 1, "useful", 4),
        (3, 2, "great read", 3),
        (4, 5, "meh", 1),
    ];
    comment::Entity::insert_many(comments.map(|(id, post_id, body, rating)| {
        comment::ActiveModel {
            id: Set(id),
            post_id: Set(post_id),
            body: Set(body.to_string()),
            rating: Set(rating),
        }
    }))
    .exec_without_returning(db)
    .await?;

    let tags = [
        (1, "rust", "language"),
        (2, "async", "topic"),
        (3, "garden", "hobby"),
        (4, "tutorial", "topic"),
    ];
    tag::Entity::insert_many(tags.map(|(id, name, category)| tag::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        category: Set(category.to_string()),
    }))
    .exec_without_returning(db)
    .await?;

    let post_tags = [(1, 1), (2, 1), (2, 2), (4, 1), (5, 3), (5, 4)];
    post_tag::Entity::insert_many(post_tags.map(|(post_id, tag_id)| post_tag::ActiveModel {
        post_id: Set(post_id),
        tag_id: Set(tag_id),
    }))
    .exec_without_returning(db)
    .await?;

    let attributes = [
        (1, 1, "color", "red"),
        (2, 1, "size", "large"),
        (3, 2, "color", "blue"),
        (4, 3, "color", "red"),
        (5, 5, "size", "small"),
    ];
    post_attribute::Entity::insert_many(attributes.map(|(id, post_id, name, content)| {
        post_attribute::ActiveModel {
            id: Set(id),
            post_id: Set(post_id),
            name: Set(name.to_string()),
            content: Set(content.to_string()),
        }
    }))
    .exec_without_returning(db)
    .await?;

    let roles = [
        (1, 1, "editor", 2),
        (2, 2, "editor", 3),
        (3, 2, "reviewer", 1),
        (4, 3, "reviewer", 2),
    ];
    post_role::Entity::insert_many(roles.map(|(id, post_id, role, author_id)| {
        post_role::ActiveModel {
            id: Set(id),
            post_id: Set(post_id),
            role: Set(role.to_string()),
            author_id: Set(author_id),
        }
    }))
    .exec_without_returning(db)
    .await?;

    Ok(())
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateBlogTables)]
    }
}

pub struct CreateBlogTables;

impl MigrationName for CreateBlogTables {
    fn name(&self) -> &'static str {
        "m20250101_000001_create_blog_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateBlogTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());
        manager
            .create_table(schema.create_table_from_entity(author::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(post::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(comment::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(tag::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(post_tag::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(post_attribute::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(post_role::Entity))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            "post_role",
            "post_attribute",
            "post_tag",
            "tag",
            "comment",
            "post",
            "author",
        ] {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
