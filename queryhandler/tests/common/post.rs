use async_trait::async_trait;
use queryhandler::Resource;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub status: String,
    pub views: i32,
    pub owner_id: i32,
    pub is_deleted: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::author::Entity",
        from = "Column::OwnerId",
        to = "super::author::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::post_tag::Entity")]
    PostTags,
    #[sea_orm(has_many = "super::post_attribute::Entity")]
    Attributes,
    #[sea_orm(has_many = "super::post_role::Entity")]
    Roles,
}

impl Related<super::author::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::post_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostTags.def()
    }
}

impl Related<super::post_attribute::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attributes.def()
    }
}

impl Related<super::post_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[async_trait]
impl Resource for Entity {
    const RESOURCE_NAME_SINGULAR: &'static str = "post";
    const RESOURCE_NAME_PLURAL: &'static str = "posts";
    const SOFT_DELETE_COLUMN: Option<&'static str> = Some("is_deleted");

    fn default_fields() -> Vec<&'static str> {
        vec!["title"]
    }

    fn foreign_key_fields() -> Vec<&'static str> {
        vec!["owner_id"]
    }

    fn keyword_columns() -> Vec<Column> {
        vec![Column::Title, Column::Status]
    }

    /// Supports `owner`: nests the post's author under `"owner"`.
    async fn hydrate(
        db: &DatabaseConnection,
        records: &mut [JsonValue],
        hydrates: &[String],
    ) -> Result<(), DbErr> {
        if !hydrates.iter().any(|h| h == "owner") {
            return Ok(());
        }
        for record in records.iter_mut() {
            let Some(id) = record.get("id").and_then(JsonValue::as_i64) else {
                continue;
            };
            let owner = super::author::Entity::find()
                .inner_join(Entity)
                .filter(Column::Id.eq(id))
                .into_json()
                .one(db)
                .await?;
            if let (Some(fields), Some(owner)) = (record.as_object_mut(), owner) {
                fields.insert("owner".to_string(), owner);
            }
        }
        Ok(())
    }
}
