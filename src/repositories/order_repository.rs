use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::entities::{
    order::{self, ActiveModel as OrderActiveModel, Entity as Order, Model as OrderModel},
    order_line_item::{self, Entity as OrderLineItem, Model as OrderLineItemModel},
};
use crate::models::OrderLineInput;

/// An order together with its line items in entry order.
#[derive(Debug, Clone)]
pub struct OrderWithLines {
    pub order: OrderModel,
    pub lines: Vec<OrderLineItemModel>,
}

pub struct OrderRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> OrderRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Inserts the order and its lines. Lines keep their input order.
    pub async fn insert(
        &self,
        model: OrderActiveModel,
        lines: &[OrderLineInput],
    ) -> Result<OrderWithLines, DbErr> {
        let order = model.insert(self.conn).await?;
        let lines = self.insert_lines(order.id, lines).await?;
        Ok(OrderWithLines { order, lines })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderModel>, DbErr> {
        Order::find_by_id(id).one(self.conn).await
    }

    pub async fn find_by_po_no(
        &self,
        owner_id: Uuid,
        po_no: &str,
    ) -> Result<Option<OrderModel>, DbErr> {
        Order::find()
            .filter(order::Column::OwnerId.eq(owner_id))
            .filter(order::Column::PoNo.eq(po_no))
            .one(self.conn)
            .await
    }

    /// Most recently created order of the owner.
    pub async fn find_latest_by_owner(&self, owner_id: Uuid) -> Result<Option<OrderModel>, DbErr> {
        Order::find()
            .filter(order::Column::OwnerId.eq(owner_id))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(SimpleExpr::from(Func::char_length(Expr::col(order::Column::PoNo))))
            .order_by_desc(order::Column::PoNo)
            .one(self.conn)
            .await
    }

    pub async fn lines(&self, order_id: Uuid) -> Result<Vec<OrderLineItemModel>, DbErr> {
        OrderLineItem::find()
            .filter(order_line_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_line_item::Column::Position)
            .all(self.conn)
            .await
    }

    pub async fn update(&self, model: OrderActiveModel) -> Result<OrderModel, DbErr> {
        model.update(self.conn).await
    }

    /// Swaps the stored lines of a draft order for `lines`.
    pub async fn replace_lines(
        &self,
        order_id: Uuid,
        lines: &[OrderLineInput],
    ) -> Result<Vec<OrderLineItemModel>, DbErr> {
        OrderLineItem::delete_many()
            .filter(order_line_item::Column::OrderId.eq(order_id))
            .exec(self.conn)
            .await?;
        self.insert_lines(order_id, lines).await
    }

    async fn insert_lines(
        &self,
        order_id: Uuid,
        lines: &[OrderLineInput],
    ) -> Result<Vec<OrderLineItemModel>, DbErr> {
        let mut stored = Vec::with_capacity(lines.len());
        for (position, line) in lines.iter().enumerate() {
            let model = order_line_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                position: Set(position as i32),
                code: Set(line.code.clone()),
                name: Set(line.name.clone()),
                quantity: Set(line.quantity),
                price: Set(line.price),
                cost: Set(line.cost),
            };
            stored.push(model.insert(self.conn).await?);
        }
        Ok(stored)
    }
}
