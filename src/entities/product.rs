use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::entities::user::Entity as User;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub category: String,
    pub sub_category: String,
    pub gender: Gender,
    pub mrp: f32,
    pub selling_price: f32,
    pub seller_id: i32,
    #[sea_orm(default = false)]
    pub is_deleted: bool,
    #[sea_orm(default = false)]
    pub is_archived: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "User",
        from = "Column::SellerId",
        to = "crate::entities::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict",
    )]
    Seller,
    #[sea_orm(has_many = "crate::entities::color_variant::Entity")]
    ColorVariant,
}

impl Related<crate::entities::color_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ColorVariant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    enum_name = "gender_enum",
    db_type = "String(StringLen::N(255))",
    rs_type = "String"
)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[sea_orm(string_value = "men")]
    Men,
    #[sea_orm(string_value = "women")]
    Women,
    #[sea_orm(string_value = "kids")]
    Kids,
    #[sea_orm(string_value = "unisex")]
    Unisex,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "men" => Ok(Self::Men),
            "women" => Ok(Self::Women),
            "kids" => Ok(Self::Kids),
            "unisex" => Ok(Self::Unisex),
            _ => Err(format!("Invalid gender: {}", s)),
        }
    }
}
