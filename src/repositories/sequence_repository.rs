use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::document_sequence::{
    ActiveModel as SequenceActiveModel, Column, DocumentKind, Entity as DocumentSequence,
    Model as SequenceModel,
};

pub struct SequenceRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SequenceRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(
        &self,
        owner_id: Uuid,
        kind: DocumentKind,
    ) -> Result<Option<SequenceModel>, DbErr> {
        DocumentSequence::find()
            .filter(Column::OwnerId.eq(owner_id))
            .filter(Column::Kind.eq(kind))
            .one(self.conn)
            .await
    }

    pub async fn insert(
        &self,
        owner_id: Uuid,
        kind: DocumentKind,
        number: &str,
    ) -> Result<SequenceModel, DbErr> {
        SequenceActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            kind: Set(kind),
            last_number: Set(number.to_string()),
            updated_at: Set(Utc::now()),
        }
        .insert(self.conn)
        .await
    }

    /// Moves the counter from `expected` to `next`. Returns 0 when another
    /// writer advanced it first.
    pub async fn advance(&self, id: Uuid, expected: &str, next: &str) -> Result<u64, DbErr> {
        let result = DocumentSequence::update_many()
            .col_expr(Column::LastNumber, Expr::value(next))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::LastNumber.eq(expected))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}
