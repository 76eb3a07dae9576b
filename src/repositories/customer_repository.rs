use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::entities::customer::{
    ActiveModel as CustomerActiveModel, Column, Entity as Customer, Model as CustomerModel,
};

pub struct CustomerRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> CustomerRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, model: CustomerActiveModel) -> Result<CustomerModel, DbErr> {
        model.insert(self.conn).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CustomerModel>, DbErr> {
        Customer::find_by_id(id).one(self.conn).await
    }

    /// Most recently created customer of the owner. Ties on creation time go
    /// to the highest number, comparing length first so `-10000` beats `-9999`.
    pub async fn find_latest_by_owner(&self, owner_id: Uuid) -> Result<Option<CustomerModel>, DbErr> {
        Customer::find()
            .filter(Column::OwnerId.eq(owner_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(SimpleExpr::from(Func::char_length(Expr::col(Column::CustomerNo))))
            .order_by_desc(Column::CustomerNo)
            .one(self.conn)
            .await
    }

    pub async fn set_blacklisted(
        &self,
        customer: CustomerModel,
        is_blacklisted: bool,
    ) -> Result<CustomerModel, DbErr> {
        let mut active: CustomerActiveModel = customer.into();
        active.is_blacklisted = Set(is_blacklisted);
        active.updated_at = Set(Some(Utc::now()));
        active.update(self.conn).await
    }
}
