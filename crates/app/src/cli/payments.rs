use sacola_app::context::AppContext;

use super::render;

pub(crate) async fn run(ctx: &AppContext) -> Result<(), String> {
    let mut resolver = ctx.payment_resolver();
    let (methods, cards) = resolver.load_all(ctx.user).await;

    methods.map_err(|error| format!("failed to load payment methods: {error}"))?;
    println!("{}", render::methods(resolver.methods()));

    match cards {
        Ok(()) if resolver.cards().is_empty() => println!("no stored cards"),
        Ok(()) => println!("{}", render::cards(resolver.cards())),
        Err(error) => eprintln!("failed to load stored cards: {error}"),
    }

    Ok(())
}
