use clap::Args;
use sacola::ids::RestaurantId;
use sacola_app::context::AppContext;

use super::render;

#[derive(Debug, Args)]
pub(crate) struct MenuArgs {
    /// Restaurant id
    restaurant: i64,
}

pub(crate) async fn run(ctx: &AppContext, args: MenuArgs) -> Result<(), String> {
    let restaurant = RestaurantId::new(args.restaurant);

    let items = ctx
        .catalog
        .list_items(restaurant)
        .await
        .map_err(|error| format!("failed to load menu: {error}"))?;

    if items.is_empty() {
        println!("restaurant {restaurant} has nothing on the menu");
        return Ok(());
    }

    println!("{}", render::menu(&items));

    Ok(())
}
