mod common;

use common::{add_product, count, file_system, stock_of, test_system};
use coord_store::CoordinationStore;
use order_desk::lock::product_lock_key;
use order_desk::model::{OrderCreate, OrderItemCreate};
use order_desk::ServiceError;
use std::time::Duration;

/// Two orders of 60 against a stock of 100: exactly one may commit.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_competing_orders_never_oversell() {
    let system = test_system().await;
    let p = add_product(&system, "Widget", "10.00", 100).await;

    let mut handles = vec![];
    for token in ["race-a", "race-b"] {
        let desk = system.desk.clone();
        let params = OrderCreate::new("Alice", vec![OrderItemCreate::new(p.id.0, 60)]);
        handles.push(tokio::spawn(async move { desk.create_order(token, params).await }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(ServiceError::InsufficientStock { .. }) | Err(ServiceError::LockUnavailable(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(stock_of(&system, p.id).await, 40);
    assert_eq!(count(&system, "orders").await, 1);
    assert_eq!(count(&system, "order_items").await, 1);
}

#[tokio::test]
async fn test_sequenced_orders_report_insufficient_stock() {
    let system = test_system().await;
    let p = add_product(&system, "Widget", "10.00", 100).await;
    let params = OrderCreate::new("Alice", vec![OrderItemCreate::new(p.id.0, 60)]);

    system.desk.create_order("seq-a", params.clone()).await.unwrap();
    let second = system.desk.create_order("seq-b", params).await;

    assert_eq!(
        second,
        Err(ServiceError::InsufficientStock {
            product_id: p.id,
            requested: 60,
            available: 40,
        })
    );
    assert_eq!(stock_of(&system, p.id).await, 40);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_small_orders_keep_stock_consistent() {
    let system = test_system().await;
    let p = add_product(&system, "Widget", "1.00", 20).await;

    let mut handles = vec![];
    for i in 0..16 {
        let desk = system.desk.clone();
        let params = OrderCreate::new(format!("customer-{i}"), vec![OrderItemCreate::new(p.id.0, 2)]);
        handles.push(tokio::spawn(async move {
            desk.create_order(&format!("many-{i}"), params).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(ServiceError::InsufficientStock { .. }) | Err(ServiceError::LockUnavailable(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let stock = stock_of(&system, p.id).await;
    assert!(stock >= 0);
    assert!(successes <= 10);
    assert_eq!(stock, 20 - 2 * successes);
    assert_eq!(count(&system, "orders").await, successes);
}

#[tokio::test]
async fn test_held_lease_aborts_and_releases_earlier_leases() {
    let system = test_system().await;
    let a = add_product(&system, "A", "1.00", 10).await;
    let b = add_product(&system, "B", "1.00", 10).await;

    // Someone else is adjusting B
    assert!(system
        .locks
        .acquire(&product_lock_key(b.id), Duration::from_secs(5))
        .await
        .unwrap());

    let params = OrderCreate::new(
        "Alice",
        vec![OrderItemCreate::new(b.id.0, 1), OrderItemCreate::new(a.id.0, 1)],
    );
    let result = system.desk.create_order("locked-out", params.clone()).await;
    assert_eq!(
        result,
        Err(ServiceError::LockUnavailable(product_lock_key(b.id)))
    );

    let store = system.store();
    assert_eq!(store.get(&product_lock_key(a.id)).await.unwrap(), None);
    assert_eq!(stock_of(&system, a.id).await, 10);
    assert_eq!(count(&system, "orders").await, 0);

    // Once B is free the same token goes through
    system.locks.release(&product_lock_key(b.id)).await.unwrap();
    let retry = system.desk.create_order("locked-out", params).await.unwrap();
    assert!(!retry.is_replay());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stock_update_and_orders_interleave_safely() {
    let system = test_system().await;
    let p = add_product(&system, "Widget", "1.00", 10).await;

    let mut handles = vec![];
    for i in 0..6 {
        let desk = system.desk.clone();
        let id = p.id;
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                desk.update_product_stock(&format!("set-{i}"), id, 3).await.map(|_| ())
            } else {
                let params = OrderCreate::new("Bob", vec![OrderItemCreate::new(id.0, 3)]);
                desk.create_order(&format!("buy-{i}"), params).await.map(|_| ())
            }
        }));
    }
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => {}
            Err(ServiceError::InsufficientStock { .. }) | Err(ServiceError::LockUnavailable(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert!(stock_of(&system, p.id).await >= 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disjoint_orders_all_commit_on_a_shared_file_database() {
    let (system, _dir) = file_system(5).await;
    let mut products = vec![];
    for i in 0..8 {
        products.push(add_product(&system, &format!("P{i}"), "1.00", 100).await);
    }

    let mut handles = vec![];
    for (i, product) in products.iter().enumerate() {
        let desk = system.desk.clone();
        let params = OrderCreate::new("Dana", vec![OrderItemCreate::new(product.id.0, 10)]);
        handles.push(tokio::spawn(async move {
            desk.create_order(&format!("disjoint-{i}"), params).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("disjoint order failed");
    }

    for product in &products {
        assert_eq!(stock_of(&system, product.id).await, 90);
    }
    assert_eq!(count(&system, "orders").await, 8);
    assert_eq!(count(&system, "order_items").await, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_product_race_on_a_shared_file_database() {
    let (system, _dir) = file_system(5).await;
    let p = add_product(&system, "Widget", "10.00", 100).await;

    let mut handles = vec![];
    for i in 0..6 {
        let desk = system.desk.clone();
        let params = OrderCreate::new("Erin", vec![OrderItemCreate::new(p.id.0, 60)]);
        handles.push(tokio::spawn(async move {
            desk.create_order(&format!("contended-{i}"), params).await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(ServiceError::InsufficientStock { .. }) | Err(ServiceError::LockUnavailable(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(stock_of(&system, p.id).await, 100 - 60 * ok);
    assert_eq!(count(&system, "orders").await, ok);
    assert_eq!(count(&system, "order_items").await, ok);
}
