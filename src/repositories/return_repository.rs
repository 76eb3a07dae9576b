use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::{
    purchase_return::{self, ActiveModel as ReturnActiveModel, Entity as PurchaseReturn, Model as ReturnModel},
    return_line_item::{self, Entity as ReturnLineItem, Model as ReturnLineItemModel},
};
use crate::models::ReturnLineInput;

/// Counters grow past four digits, so numbers are compared by length first.
fn prt_no_length() -> SimpleExpr {
    Func::char_length(Expr::col(purchase_return::Column::PrtNo)).into()
}

/// A purchase return together with its returned products in entry order.
#[derive(Debug, Clone)]
pub struct ReturnWithLines {
    pub purchase_return: ReturnModel,
    pub lines: Vec<ReturnLineItemModel>,
}

pub struct ReturnRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ReturnRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        model: ReturnActiveModel,
        lines: &[ReturnLineInput],
    ) -> Result<ReturnWithLines, DbErr> {
        let purchase_return = model.insert(self.conn).await?;

        let mut stored = Vec::with_capacity(lines.len());
        for (position, line) in lines.iter().enumerate() {
            let model = return_line_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                return_id: Set(purchase_return.id),
                position: Set(position as i32),
                code: Set(line.code.clone()),
                name: Set(line.name.clone()),
                quantity: Set(line.quantity),
                price: Set(line.price),
            };
            stored.push(model.insert(self.conn).await?);
        }

        Ok(ReturnWithLines {
            purchase_return,
            lines: stored,
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ReturnWithLines>, DbErr> {
        let Some(purchase_return) = PurchaseReturn::find_by_id(id).one(self.conn).await? else {
            return Ok(None);
        };
        let lines = ReturnLineItem::find()
            .filter(return_line_item::Column::ReturnId.eq(id))
            .order_by_asc(return_line_item::Column::Position)
            .all(self.conn)
            .await?;
        Ok(Some(ReturnWithLines {
            purchase_return,
            lines,
        }))
    }

    /// All returns recorded against an order, oldest first.
    pub async fn find_by_order(&self, order_id: Uuid) -> Result<Vec<ReturnWithLines>, DbErr> {
        let returns = PurchaseReturn::find()
            .filter(purchase_return::Column::OrderId.eq(order_id))
            .order_by_asc(purchase_return::Column::CreatedAt)
            .order_by_asc(prt_no_length())
            .order_by_asc(purchase_return::Column::PrtNo)
            .all(self.conn)
            .await?;
        if returns.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = returns.iter().map(|r| r.id).collect();
        let mut lines_by_return: HashMap<Uuid, Vec<ReturnLineItemModel>> = HashMap::new();
        for line in ReturnLineItem::find()
            .filter(return_line_item::Column::ReturnId.is_in(ids))
            .order_by_asc(return_line_item::Column::Position)
            .all(self.conn)
            .await?
        {
            lines_by_return.entry(line.return_id).or_default().push(line);
        }

        Ok(returns
            .into_iter()
            .map(|purchase_return| ReturnWithLines {
                lines: lines_by_return
                    .remove(&purchase_return.id)
                    .unwrap_or_default(),
                purchase_return,
            })
            .collect())
    }

    /// Most recently created return of the owner.
    pub async fn find_latest_by_owner(&self, owner_id: Uuid) -> Result<Option<ReturnModel>, DbErr> {
        PurchaseReturn::find()
            .filter(purchase_return::Column::OwnerId.eq(owner_id))
            .order_by_desc(purchase_return::Column::CreatedAt)
            .order_by_desc(prt_no_length())
            .order_by_desc(purchase_return::Column::PrtNo)
            .one(self.conn)
            .await
    }
}
