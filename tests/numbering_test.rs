//! Document numbers handed out per owner, kind and month.

mod common;

use chrono::{Datelike, NaiveDate, Utc};
use common::{order_line, response_json, TestApp};
use axum::http::Method;
use serde_json::json;
use sea_orm::{sea_query::Expr, ActiveValue::NotSet, EntityTrait, Set};
use stockroom_api::{
    entities::{customer, DocumentKind},
    repositories::customer_repository::CustomerRepository,
    services::numbering::NumberingService,
};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn orders_are_numbered_in_sequence_for_the_current_month() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let (status, body) = app
            .create_order(json!({ "customer": customer, "products": [order_line("A", 1, "5")] }))
            .await;
        assert_eq!(status, 201);
        numbers.push(body["poNo"].as_str().unwrap().to_string());
    }

    let today = Utc::now().date_naive();
    let period = format!("{}{:02}", today.year(), today.month());
    assert_eq!(
        numbers,
        vec![
            format!("PONO{}-0001", period),
            format!("PONO{}-0002", period),
            format!("PONO{}-0003", period),
        ]
    );
}

#[tokio::test]
async fn customers_get_their_own_prefix_and_sequence() {
    let app = TestApp::new().await;
    app.seed_product("A", 10, "5").await;
    let customer = app.seed_customer().await;
    app.create_order(json!({ "customer": customer, "products": [order_line("A", 1, "5")] }))
        .await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/customers",
            Some(json!({ "firstName": "Grace", "lastName": "Hopper" })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    let number = body["customerNo"].as_str().unwrap();
    assert!(number.starts_with("CRM"), "{}", number);
    assert!(number.ends_with("-0002"), "{}", number);
}

#[tokio::test]
async fn owners_do_not_share_sequences() {
    let app = TestApp::new().await;
    let db = app.state.db.as_ref();
    let other = Uuid::new_v4();
    let today = date(2024, 3, 5);

    let mine = NumberingService::allocate(db, app.owner_id, DocumentKind::Order, today)
        .await
        .unwrap();
    let theirs = NumberingService::allocate(db, other, DocumentKind::Order, today)
        .await
        .unwrap();

    assert_eq!(mine, "PONO202403-0001");
    assert_eq!(theirs, "PONO202403-0001");
}

#[tokio::test]
async fn sequence_restarts_each_month_and_year() {
    let app = TestApp::new().await;
    let db = app.state.db.as_ref();
    let owner = app.owner_id;
    let kind = DocumentKind::Return;

    let allocate = |day| NumberingService::allocate(db, owner, kind, day);

    assert_eq!(allocate(date(2024, 3, 1)).await.unwrap(), "PRTNO202403-0001");
    assert_eq!(allocate(date(2024, 3, 31)).await.unwrap(), "PRTNO202403-0002");
    assert_eq!(allocate(date(2024, 4, 1)).await.unwrap(), "PRTNO202404-0001");
    assert_eq!(allocate(date(2024, 4, 2)).await.unwrap(), "PRTNO202404-0002");
    assert_eq!(allocate(date(2025, 4, 2)).await.unwrap(), "PRTNO202504-0001");
}

#[tokio::test]
async fn kinds_are_numbered_independently() {
    let app = TestApp::new().await;
    let db = app.state.db.as_ref();
    let today = date(2024, 7, 9);

    for _ in 0..2 {
        NumberingService::allocate(db, app.owner_id, DocumentKind::Order, today)
            .await
            .unwrap();
    }
    let crm = NumberingService::allocate(db, app.owner_id, DocumentKind::Customer, today)
        .await
        .unwrap();

    assert_eq!(crm, "CRM202407-0001");
}

#[tokio::test]
async fn five_digit_counters_outrank_four_digit_ones_created_at_the_same_time() {
    let app = TestApp::new().await;
    let db = app.state.db.as_ref();
    let customers = CustomerRepository::new(db);

    for number in ["CRM202403-9999", "CRM202403-10000"] {
        customers
            .insert(customer::ActiveModel {
                id: Set(Uuid::new_v4()),
                owner_id: Set(app.owner_id),
                customer_no: Set(number.to_string()),
                first_name: Set("Ada".to_string()),
                last_name: Set("Lovelace".to_string()),
                email: Set(None),
                is_blacklisted: Set(false),
                is_active: Set(true),
                created_at: NotSet,
                updated_at: NotSet,
            })
            .await
            .unwrap();
    }
    let same_moment = Utc::now();
    customer::Entity::update_many()
        .col_expr(customer::Column::CreatedAt, Expr::value(same_moment))
        .exec(db)
        .await
        .unwrap();

    let latest = customers.find_latest_by_owner(app.owner_id).await.unwrap().unwrap();
    assert_eq!(latest.customer_no, "CRM202403-10000");

    let next = NumberingService::allocate(db, app.owner_id, DocumentKind::Customer, date(2024, 3, 20))
        .await
        .unwrap();
    assert_eq!(next, "CRM202403-10001");
}
