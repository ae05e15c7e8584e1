use clap::Args;
use sacola::{
    delivery::DeliveryChoice,
    ids::{ItemId, LineId, RestaurantId},
    money::format_brl,
};
use sacola_app::{
    context::AppContext,
    domain::{
        bag::{CartStore, SyncOutcome},
        catalog::find_item,
    },
    http::ApiError,
};

use super::render;

#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    /// Catalog item id
    #[arg(long)]
    item: i64,

    /// Restaurant the item belongs to
    #[arg(long)]
    restaurant: i64,

    /// Quantity to add
    #[arg(long, default_value_t = 1)]
    quantity: i64,
}

#[derive(Debug, Args)]
pub(crate) struct QuantityArgs {
    /// Bag line id
    #[arg(long)]
    line: i64,

    /// New quantity
    #[arg(long, allow_negative_numbers = true)]
    quantity: i64,
}

#[derive(Debug, Args)]
pub(crate) struct RemoveArgs {
    /// Bag line id
    #[arg(long)]
    line: i64,
}

pub(crate) async fn load(ctx: &AppContext) -> Result<CartStore, String> {
    let mut store = ctx.cart_store();

    store
        .load()
        .await
        .map_err(|error| format!("failed to load bag: {error}"))?;

    Ok(store)
}

pub(crate) fn print(store: &CartStore, delivery: &DeliveryChoice) -> Result<(), String> {
    if store.cart().is_empty() {
        println!("bag is empty");
        return Ok(());
    }

    let totals = store
        .totals(delivery)
        .map_err(|error| format!("failed to total bag: {error}"))?;

    println!("{}", render::bag(store.lines()));
    println!("{}", render::totals(&totals));

    Ok(())
}

fn report(store: &CartStore, outcome: SyncOutcome) -> Result<(), String> {
    match outcome {
        SyncOutcome::Confirmed => print(store, &DeliveryChoice::Standard),
        SyncOutcome::Resynchronized => {
            print(store, &DeliveryChoice::Standard)?;

            Err("bag change was rejected; showing the bag as saved".to_string())
        }
        SyncOutcome::Restored => {
            print(store, &DeliveryChoice::Standard)?;

            Err(format!(
                "bag change was not saved: {}",
                store.error().unwrap_or("unknown error")
            ))
        }
    }
}

pub(crate) async fn show(ctx: &AppContext) -> Result<(), String> {
    let store = load(ctx).await?;

    print(&store, &DeliveryChoice::Standard)
}

pub(crate) async fn add(ctx: &AppContext, args: AddArgs) -> Result<(), String> {
    let item = ItemId::new(args.item);
    let restaurant = RestaurantId::new(args.restaurant);

    let dish = find_item(ctx.catalog.as_ref(), restaurant, item)
        .await
        .map_err(|error| match error {
            ApiError::NotFound => format!("item {item} is not on restaurant {restaurant}'s menu"),
            error => format!("failed to load menu: {error}"),
        })?;
    let price = dish
        .unit_price()
        .map_or_else(|| dish.price.to_string(), format_brl);
    println!("adding {} x {} ({price})", args.quantity, dish.name);

    let mut store = load(ctx).await?;

    let outcome = store
        .add_item(item, restaurant, args.quantity)
        .await
        .map_err(|error| format!("failed to add item: {error}"))?;

    report(&store, outcome)
}

pub(crate) async fn quantity(ctx: &AppContext, args: QuantityArgs) -> Result<(), String> {
    let mut store = load(ctx).await?;

    let outcome = store
        .update_quantity(LineId::new(args.line), args.quantity)
        .await
        .map_err(|error| format!("failed to change quantity: {error}"))?;

    report(&store, outcome)
}

pub(crate) async fn remove(ctx: &AppContext, args: RemoveArgs) -> Result<(), String> {
    let mut store = load(ctx).await?;

    let outcome = store
        .delete_line(LineId::new(args.line))
        .await
        .map_err(|error| format!("failed to remove line: {error}"))?;

    report(&store, outcome)
}

pub(crate) async fn clear(ctx: &AppContext) -> Result<(), String> {
    let mut store = load(ctx).await?;

    let outcome = store.clear().await;

    report(&store, outcome)
}
