use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::entities::product::Entity as Product;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "color_variants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub product_id: i32,
    pub color_name: String,
    pub hex_code: String,
    /// Ordered list of image urls, first one is the listing image.
    #[sea_orm(column_type = "Json")]
    pub images: Json,
    #[sea_orm(default = false)]
    pub is_archived: bool,
}

impl Model {
    pub fn first_image(&self) -> Option<String> {
        self.images
            .as_array()
            .and_then(|urls| urls.first())
            .and_then(|url| url.as_str())
            .map(|url| url.to_owned())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Product",
        from = "Column::ProductId",
        to = "crate::entities::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade",
    )]
    Product,
    #[sea_orm(has_many = "crate::entities::size_variant::Entity")]
    SizeVariant,
}

impl Related<crate::entities::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<crate::entities::size_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SizeVariant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
