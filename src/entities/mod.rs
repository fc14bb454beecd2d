pub mod user;
pub mod product;
pub mod color_variant;
pub mod size_variant;
pub mod cart;
pub mod wishlist;
pub mod order;
pub mod order_item;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema, Set, TransactionTrait};
use serde_json::json;
use std::sync::Arc;

use crate::entities::{
    cart::Entity as Cart,
    color_variant::Entity as ColorVariant,
    order::Entity as Order,
    order_item::Entity as OrderItem,
    product::Entity as Product,
    size_variant::Entity as SizeVariant,
    user::Entity as User,
    wishlist::Entity as Wishlist,
};

pub async fn setup_schema(db: &DatabaseConnection) {
    let schema = Schema::new(db.get_database_backend());
    let create_user_table = schema.create_table_from_entity(User);
    let create_product_table = schema.create_table_from_entity(Product);
    let create_color_variant_table = schema.create_table_from_entity(ColorVariant);
    let create_size_variant_table = schema.create_table_from_entity(SizeVariant);
    let create_cart_table = schema.create_table_from_entity(Cart);
    let create_wishlist_table = schema.create_table_from_entity(Wishlist);
    let create_order_table = schema.create_table_from_entity(Order);
    let create_order_item_table = schema.create_table_from_entity(OrderItem);

    db.execute(db.get_database_backend().build(&create_user_table))
        .await
        .expect("Failed to create user schema");
    db.execute(db.get_database_backend().build(&create_product_table))
        .await
        .expect("Failed to create product schema");
    db.execute(db.get_database_backend().build(&create_color_variant_table))
        .await
        .expect("Failed to create color variant schema");
    db.execute(db.get_database_backend().build(&create_size_variant_table))
        .await
        .expect("Failed to create size variant schema");
    db.execute(db.get_database_backend().build(&create_cart_table))
        .await
        .expect("Failed to create cart schema");
    db.execute(db.get_database_backend().build(&create_wishlist_table))
        .await
        .expect("Failed to create wishlist schema");
    db.execute(db.get_database_backend().build(&create_order_table))
        .await
        .expect("Failed to create order schema");
    db.execute(db.get_database_backend().build(&create_order_item_table))
        .await
        .expect("Failed to create order item schema");
}

/// Seeds the demo accounts and a small catalog so the API is usable (and
/// testable) right after startup.
pub async fn primary_setup(db: Arc<DatabaseConnection>) {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password("Secret15".as_bytes(), &salt)
        .expect("Failed to hash password")
        .to_string();

    let new_user = user::ActiveModel {
        username: Set("user".to_owned()),
        password: Set(password_hash.clone()),
        role: Set(user::Role::User),
        ..Default::default()
    };

    let new_seller = user::ActiveModel {
        username: Set("seller".to_owned()),
        password: Set(password_hash.clone()),
        role: Set(user::Role::Seller),
        ..Default::default()
    };

    let new_admin = user::ActiveModel {
        username: Set("admin".to_owned()),
        password: Set(password_hash),
        role: Set(user::Role::Admin),
        ..Default::default()
    };

    let txn = db.begin().await.expect("Failed to open seed transaction");

    user::Entity::insert_many([new_user, new_seller, new_admin])
        .exec(&txn)
        .await
        .expect("Failed to seed users");

    let runner = product::ActiveModel {
        title: Set("Velocity Runner".to_owned()),
        slug: Set("velocity-runner".to_owned()),
        category: Set("Sneakers".to_owned()),
        sub_category: Set("Running".to_owned()),
        gender: Set(product::Gender::Men),
        mrp: Set(4999.0),
        selling_price: Set(2999.0),
        seller_id: Set(2),
        is_deleted: Set(false),
        is_archived: Set(false),
        ..Default::default()
    };
    let slide = product::ActiveModel {
        title: Set("Lotus Slide".to_owned()),
        slug: Set("lotus-slide".to_owned()),
        category: Set("Sandals".to_owned()),
        sub_category: Set("Slides".to_owned()),
        gender: Set(product::Gender::Women),
        mrp: Set(1999.0),
        selling_price: Set(1499.0),
        seller_id: Set(2),
        is_deleted: Set(false),
        is_archived: Set(false),
        ..Default::default()
    };
    product::Entity::insert_many([runner, slide])
        .exec(&txn)
        .await
        .expect("Failed to seed products");

    let runner_black = color_variant::ActiveModel {
        product_id: Set(1),
        color_name: Set("Black".to_owned()),
        hex_code: Set("#000000".to_owned()),
        images: Set(json!(["/image/velocity-runner-black-1.jpg"])),
        is_archived: Set(false),
        ..Default::default()
    };
    let runner_white = color_variant::ActiveModel {
        product_id: Set(1),
        color_name: Set("White".to_owned()),
        hex_code: Set("#FFFFFF".to_owned()),
        images: Set(json!(["/image/velocity-runner-white-1.jpg"])),
        is_archived: Set(false),
        ..Default::default()
    };
    let slide_red = color_variant::ActiveModel {
        product_id: Set(2),
        color_name: Set("Red".to_owned()),
        hex_code: Set("#C0392B".to_owned()),
        images: Set(json!(["/image/lotus-slide-red-1.jpg"])),
        is_archived: Set(false),
        ..Default::default()
    };
    color_variant::Entity::insert_many([runner_black, runner_white, slide_red])
        .exec(&txn)
        .await
        .expect("Failed to seed color variants");

    let sizes = [
        ("VR-BLK-UK7", 1, "UK 7", 5, None),
        ("VR-BLK-UK8", 1, "UK 8", 4, Some(3199.0)),
        ("VR-WHT-UK7", 2, "UK 7", 0, None),
        ("LS-RED-UK5", 3, "UK 5", 10, None),
    ]
    .map(|(sku, variant_id, size, stock, price_override)| {
        size_variant::ActiveModel {
            color_variant_id: Set(variant_id),
            size: Set(size.to_owned()),
            sku: Set(sku.to_owned()),
            stock: Set(stock),
            price_override: Set(price_override),
            ..Default::default()
        }
    });
    size_variant::Entity::insert_many(sizes)
        .exec(&txn)
        .await
        .expect("Failed to seed size variants");

    txn.commit().await.expect("Failed to commit seed transaction");
}
