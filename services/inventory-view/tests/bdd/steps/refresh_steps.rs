//! BDD step definitions for refresh and polling feature

use std::sync::Arc;
use std::time::Duration;

use cucumber::gherkin::Step;
use cucumber::{given, then, when};

use inventory_view::config::Config;
use inventory_view::controller::CycleOutcome;
use inventory_view::io::HttpResponse;
use inventory_view::{InventoryController, RefreshOutcome, Variant};

use crate::world::InventoryWorld;

fn parse_variant(s: &str) -> Variant {
    match s {
        "corporate" => Variant::Corporate,
        "hub" => Variant::Hub,
        "branch" => Variant::Branch,
        other => panic!("Unknown variant: {}", other),
    }
}

/// Render records as `group:item:quantity`, or `item:quantity` without a group
pub fn describe(records: &[inventory_view::inventory::InventoryRecord]) -> String {
    records
        .iter()
        .map(|r| match &r.group_key {
            Some(group) => format!("{}:{}:{}", group, r.item_type, r.quantity),
            None => format!("{}:{}", r.item_type, r.quantity),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[given(expr = "a {word} inventory view")]
fn inventory_view(world: &mut InventoryWorld, variant: String) {
    let variant = parse_variant(&variant);
    let config = Config {
        base_url: "http://inventory.test".to_string(),
        variant,
        ..Config::default()
    };
    let controller = InventoryController::new(&config, Arc::new(world.client.clone()));
    world.variant = Some(variant);
    world.controller = Some(Arc::new(controller));
}

#[given("the inventory service returns:")]
async fn inventory_returns(world: &mut InventoryWorld, step: &Step) {
    let body = step.docstring.clone().expect("docstring with the response body");
    world
        .client
        .respond(
            "inventory",
            Ok(HttpResponse {
                status: 200,
                body: body.trim().to_string(),
            }),
        )
        .await;
}

#[given("the inventory service is unreachable")]
async fn inventory_unreachable(world: &mut InventoryWorld) {
    world
        .client
        .respond("inventory", Err("connection refused".to_string()))
        .await;
}

#[given(expr = "the {word} endpoint responds with status {int} and body {string}")]
async fn endpoint_responds(world: &mut InventoryWorld, path: String, status: u16, body: String) {
    world
        .client
        .respond(&path, Ok(HttpResponse { status, body }))
        .await;
}

#[when(expr = "the inventory service starts returning {string}")]
async fn inventory_starts_returning(world: &mut InventoryWorld, body: String) {
    world
        .client
        .respond("inventory", Ok(HttpResponse { status: 200, body }))
        .await;
}

#[given("the inventory has been loaded")]
async fn loaded(world: &mut InventoryWorld) {
    let outcome = world.controller().refresh_inventory().await;
    assert!(matches!(outcome, RefreshOutcome::Applied { .. }), "{:?}", outcome);
}

#[when("the inventory is refreshed")]
async fn refresh(world: &mut InventoryWorld) {
    world.refresh = Some(world.controller().refresh_inventory().await);
}

#[when("a poll cycle with rundown runs")]
async fn poll_cycle_with_rundown(world: &mut InventoryWorld) {
    match world
        .controller()
        .poll_cycle(true, Duration::from_millis(10))
        .await
    {
        CycleOutcome::Completed { refresh } => world.refresh = Some(refresh),
        CycleOutcome::Skipped => panic!("poll cycle unexpectedly skipped"),
    }
}

#[then(expr = "the displayed items should be {string}")]
async fn displayed_items(world: &mut InventoryWorld, expected: String) {
    let shown = world.controller().displayed().await;
    assert_eq!(describe(&shown), expected);
}

#[then("no items should be displayed")]
async fn nothing_displayed(world: &mut InventoryWorld) {
    assert!(world.controller().displayed().await.is_empty());
}

#[then("the view should show the fallback dataset")]
async fn shows_fallback(world: &mut InventoryWorld) {
    let variant = world.variant.expect("variant not set");
    assert_eq!(world.controller().displayed().await, variant.fallback_records());
}

#[then(expr = "the refresh outcome should be {string}")]
fn refresh_outcome(world: &mut InventoryWorld, expected: String) {
    let outcome = world.refresh.as_ref().expect("no refresh outcome");
    let actual = match outcome {
        RefreshOutcome::Applied { .. } => "applied",
        RefreshOutcome::FellBack { .. } => "fell back",
        RefreshOutcome::Stale => "stale",
    };
    assert_eq!(actual, expected);
}

#[then(expr = "{int} {word} request(s) should have been sent to {word}")]
async fn request_count(world: &mut InventoryWorld, count: usize, method: String, path: String) {
    assert_eq!(world.client.count(&method, &path).await, count);
}

#[then(expr = "the {word} request should come before the {word} request")]
async fn request_order(world: &mut InventoryWorld, first: String, second: String) {
    let requests = world.client.requests.read().await;
    let position = |path: &str| {
        requests
            .iter()
            .position(|r| r.path == path)
            .unwrap_or_else(|| panic!("no request to {}", path))
    };
    assert!(position(&first) < position(&second));
}
