//! BDD step definitions for filtering feature

use cucumber::{then, when};

use crate::world::InventoryWorld;

#[when(expr = "the view is filtered to {string}")]
async fn filter_to(world: &mut InventoryWorld, group: String) {
    world.controller().set_filter(Some(group)).await;
}

#[when("the filter is cleared")]
async fn clear_filter(world: &mut InventoryWorld) {
    world.controller().set_filter(None).await;
}

#[then(expr = "the group choices should be {string}")]
async fn group_choices(world: &mut InventoryWorld, expected: String) {
    let values = world.controller().group_values().await;
    assert_eq!(values.join(", "), expected);
}
