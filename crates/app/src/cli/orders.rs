use clap::Args;
use sacola::{ids::OrderId, orders::OrderStatus};
use sacola_app::{
    context::AppContext,
    domain::tracking::{ConnectionState, OrderTracker, TrackingSnapshot},
};

use super::render;

#[derive(Debug, Args)]
pub(crate) struct TrackArgs {
    /// Order id
    order: i64,
}

/// What the terminal already shows.
#[derive(Debug, Default)]
struct Shown {
    connection: Option<ConnectionState>,
    status: Option<OrderStatus>,
    delivery_code: Option<String>,
}

impl Shown {
    fn update(&mut self, snapshot: &TrackingSnapshot) {
        if self.connection.as_ref() != Some(&snapshot.connection) {
            match &snapshot.connection {
                ConnectionState::Connecting => eprintln!("connecting to status channel..."),
                ConnectionState::Connected => eprintln!("live updates on"),
                ConnectionState::Errored(error) => eprintln!("status channel error: {error}"),
                ConnectionState::Disconnected => {}
            }

            self.connection = Some(snapshot.connection.clone());
        }

        if snapshot.status() != self.status {
            if let Some(status) = snapshot.status() {
                println!("status: {status}");
            }

            self.status = snapshot.status();
        }

        if let Some(code) = snapshot.delivery_code() {
            if self.delivery_code.as_deref() != Some(code) {
                println!("delivery code: {code}");
                self.delivery_code = Some(code.to_string());
            }
        }
    }
}

pub(crate) async fn follow(ctx: &AppContext, order: OrderId) -> Result<(), String> {
    let mut tracker = OrderTracker::new(ctx.status_subscriber());
    let subscription = tracker.track(order).await;
    let mut shown = Shown::default();

    println!("tracking order {order}; press Ctrl-C to stop");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(|error| format!("failed to listen for Ctrl-C: {error}"))?;
                break;
            }
            update = subscription.changed() => {
                let Some(snapshot) = update else {
                    eprintln!("tracking ended");
                    break;
                };

                shown.update(&snapshot);

                if snapshot.status().is_some_and(OrderStatus::is_terminal) {
                    break;
                }
            }
        }
    }

    tracker.stop().await;

    Ok(())
}

pub(crate) async fn track(ctx: &AppContext, args: TrackArgs) -> Result<(), String> {
    follow(ctx, OrderId::new(args.order)).await
}

pub(crate) async fn history(ctx: &AppContext) -> Result<(), String> {
    let orders = ctx
        .orders
        .list_orders(ctx.user)
        .await
        .map_err(|error| format!("failed to load order history: {error}"))?;

    if orders.is_empty() {
        println!("no orders yet");
        return Ok(());
    }

    println!("{}", render::history(&orders));

    Ok(())
}
