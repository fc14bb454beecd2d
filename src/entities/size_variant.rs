use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::entities::color_variant::Entity as ColorVariant;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "size_variants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub color_variant_id: i32,
    /// Size label, not strictly numeric ("UK 7", "EU 42").
    pub size: String,
    #[sea_orm(unique)]
    pub sku: String,
    /// Invariant: never negative. Only the stock reconciler decrements it.
    pub stock: i32,
    /// Overrides the product selling price when > 0.
    pub price_override: Option<f32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "ColorVariant",
        from = "Column::ColorVariantId",
        to = "crate::entities::color_variant::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade",
    )]
    ColorVariant,
}

impl Related<crate::entities::color_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ColorVariant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
