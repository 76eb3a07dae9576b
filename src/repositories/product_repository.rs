use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::entities::{
    order, order_line_item,
    product::{ActiveModel as ProductActiveModel, Column, Entity as Product, Model as ProductModel},
};

pub struct ProductRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ProductRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, model: ProductActiveModel) -> Result<ProductModel, DbErr> {
        model.insert(self.conn).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProductModel>, DbErr> {
        Product::find_by_id(id).one(self.conn).await
    }

    /// Active products of `owner_id` whose code is in `codes`. Unknown codes
    /// are simply absent from the result.
    pub async fn find_active_by_codes(
        &self,
        owner_id: Uuid,
        codes: &[String],
    ) -> Result<Vec<ProductModel>, DbErr> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        Product::find()
            .filter(Column::OwnerId.eq(owner_id))
            .filter(Column::IsActive.eq(true))
            .filter(Column::Code.is_in(codes.iter().cloned()))
            .all(self.conn)
            .await
    }

    pub async fn find_by_code(
        &self,
        owner_id: Uuid,
        code: &str,
    ) -> Result<Option<ProductModel>, DbErr> {
        Product::find()
            .filter(Column::OwnerId.eq(owner_id))
            .filter(Column::Code.eq(code))
            .one(self.conn)
            .await
    }

    /// `quantity += delta` on the owner's active product with this code.
    /// Returns the number of rows touched (0 when no such product exists).
    pub async fn inc_quantity(&self, owner_id: Uuid, code: &str, delta: i32) -> Result<u64, DbErr> {
        let result = Product::update_many()
            .col_expr(Column::Quantity, Expr::col(Column::Quantity).add(delta))
            .col_expr(Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(Column::OwnerId.eq(owner_id))
            .filter(Column::Code.eq(code))
            .filter(Column::IsActive.eq(true))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Guarded decrement: only applies when at least `quantity` units are
    /// available. Returns the number of rows touched.
    pub async fn withdraw(&self, owner_id: Uuid, code: &str, quantity: i32) -> Result<u64, DbErr> {
        let result = Product::update_many()
            .col_expr(Column::Quantity, Expr::col(Column::Quantity).sub(quantity))
            .col_expr(Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(Column::OwnerId.eq(owner_id))
            .filter(Column::Code.eq(code))
            .filter(Column::IsActive.eq(true))
            .filter(Column::Quantity.gte(quantity))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn deactivate(&self, product: ProductModel) -> Result<ProductModel, DbErr> {
        let mut active: ProductActiveModel = product.into();
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(self.conn).await
    }

    /// Whether any of the owner's orders has a line with this code.
    pub async fn has_order_references(&self, owner_id: Uuid, code: &str) -> Result<bool, DbErr> {
        let count = order_line_item::Entity::find()
            .join(JoinType::InnerJoin, order_line_item::Relation::Order.def())
            .filter(order::Column::OwnerId.eq(owner_id))
            .filter(order_line_item::Column::Code.eq(code))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }
}
