use std::{error::Error as _, sync::Arc};

use clap::{Args, ValueEnum};
use jiff::Timestamp;
use sacola::{
    delivery::DeliveryChoice,
    ids::{CardId, OrderId},
};
use sacola_app::{
    context::AppContext,
    domain::checkout::{CheckoutError, Navigator},
};

use super::{address, bag, orders};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DeliveryKind {
    Standard,
    Express,
    Scheduled,
}

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Payment method code, e.g. PIX, CARTAO, DINHEIRO
    #[arg(long)]
    method: String,

    /// Stored card id, for card payments
    #[arg(long)]
    card: Option<i64>,

    /// Change-for amount as digits of centavos, for cash payments
    #[arg(long)]
    change: Option<String>,

    /// Delivery type
    #[arg(long, value_enum, default_value_t = DeliveryKind::Standard)]
    delivery: DeliveryKind,

    /// Delivery time for scheduled delivery, e.g. 2026-10-14T19:30:00-03:00
    #[arg(long)]
    at: Option<Timestamp>,

    /// Note for the restaurant
    #[arg(long, default_value = "")]
    note: String,

    /// Follow the order's status once placed
    #[arg(long)]
    track: bool,
}

struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn order_placed(&self, order: OrderId) {
        println!("order {order} placed");
    }
}

fn describe(error: &CheckoutError) -> String {
    match error.source() {
        Some(source) => format!("{error}: {source}"),
        None => error.to_string(),
    }
}

pub(crate) async fn run(ctx: &AppContext, args: CheckoutArgs) -> Result<(), String> {
    let mut cart = bag::load(ctx).await?;
    let mut payments = ctx.payment_resolver();
    let mut session = ctx.checkout_session(Arc::new(ConsoleNavigator));

    session
        .load_prerequisites(&mut payments)
        .await
        .map_err(|error| describe(&error))?;

    if session.address_missing() {
        eprintln!("no saved address; set one with `sacola address`");
    }

    if let Some(error) = session.address_error() {
        eprintln!("failed to load saved address: {error}");
    }

    payments
        .select(&args.method)
        .map_err(|error| format!("invalid payment: {error}"))?;

    if let Some(card) = args.card {
        payments
            .select_card(CardId::new(card))
            .map_err(|error| format!("invalid card: {error}"))?;
    }

    if let Some(change) = &args.change {
        payments
            .set_change_amount(change)
            .map_err(|error| format!("invalid change amount: {error}"))?;
    }

    session.set_delivery(match args.delivery {
        DeliveryKind::Standard => DeliveryChoice::Standard,
        DeliveryKind::Express => DeliveryChoice::Express {
            extra_fee: ctx.express_fee,
        },
        DeliveryKind::Scheduled => DeliveryChoice::Scheduled { at: args.at },
    });

    address::print_address(session.address());
    bag::print(&cart, session.delivery())?;

    let order = session
        .submit(&mut cart, &payments, &args.note)
        .await
        .map_err(|error| describe(&error))?;

    if args.track {
        orders::follow(ctx, order).await?;
    }

    Ok(())
}
