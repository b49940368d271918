//! BDD step definitions for mutation feature

use cucumber::{then, when};

use inventory_view::Mutation;

use crate::world::InventoryWorld;

#[when(expr = "record {string} is selected with quantity {string}")]
async fn select_record(world: &mut InventoryWorld, id: String, quantity: String) {
    let controller = world.controller();
    controller
        .select_record(&id)
        .await
        .expect("record should exist");
    controller
        .edit_selection(None, Some(&quantity))
        .await
        .expect("selection should be editable");
}

#[when(expr = "a new item {string} is staged with quantity {string}")]
async fn stage_new_item(world: &mut InventoryWorld, item_type: String, quantity: String) {
    let controller = world.controller();
    controller.select_new_item().await;
    controller
        .edit_selection(Some(item_type), Some(&quantity))
        .await
        .expect("placeholder should be editable");
}

async fn selected(world: &InventoryWorld) -> inventory_view::inventory::SelectedItem {
    world
        .controller()
        .snapshot()
        .await
        .selected
        .expect("nothing selected")
}

#[when("an order is placed")]
async fn place_order(world: &mut InventoryWorld) {
    let item = selected(world).await;
    world.report = Some(world.controller().submit_mutation(Mutation::Order(item)).await);
}

#[when("a shipment is submitted")]
async fn submit_shipment(world: &mut InventoryWorld) {
    let item = selected(world).await;
    world.report = Some(
        world
            .controller()
            .submit_mutation(Mutation::Shipment(item))
            .await,
    );
}

#[when(expr = "the name is set to {string}")]
async fn set_name(world: &mut InventoryWorld, name: String) {
    world.report = Some(
        world
            .controller()
            .submit_mutation(Mutation::SetName(name))
            .await,
    );
}

#[when("the inventory is cleared")]
async fn clear(world: &mut InventoryWorld) {
    world.report = Some(world.controller().submit_mutation(Mutation::Clear).await);
}

#[then("the mutation should succeed")]
fn mutation_succeeds(world: &mut InventoryWorld) {
    let report = world.report.as_ref().expect("no mutation report");
    assert!(report.result.is_ok(), "{:?}", report.result);
}

#[then(expr = "the mutation should fail with {string}")]
fn mutation_fails(world: &mut InventoryWorld, fragment: String) {
    let report = world.report.as_ref().expect("no mutation report");
    let err = report.result.as_ref().expect_err("mutation should fail");
    assert!(err.to_string().contains(&fragment), "{}", err);
}

#[then(expr = "the last {word} body sent to {word} should be {string}")]
async fn last_body(world: &mut InventoryWorld, method: String, path: String, expected: String) {
    let requests = world.client.requests.read().await;
    let body = requests
        .iter()
        .rev()
        .find(|r| r.method == method && r.path == path)
        .and_then(|r| r.body.clone())
        .unwrap_or_else(|| panic!("no {} body sent to {}", method, path));
    assert_eq!(body, expected);
}

#[then(expr = "the view name should be {string}")]
async fn view_name(world: &mut InventoryWorld, expected: String) {
    assert_eq!(world.controller().snapshot().await.name, expected);
}
