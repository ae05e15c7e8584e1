use clap::Args;
use sacola::{
    ids::OrderId,
    rating::{NewRating, Score},
};
use sacola_app::{
    context::AppContext,
    domain::ratings::{RatingOutcome, RatingStatus, rate_order, rating_status},
};

#[derive(Debug, Args)]
pub(crate) struct RateArgs {
    /// Order id
    order: i64,

    /// Stars from 1 to 5; omit to show the current rating
    #[arg(long, allow_negative_numbers = true)]
    score: Option<i64>,

    /// Optional comment
    #[arg(long)]
    comment: Option<String>,
}

pub(crate) async fn run(ctx: &AppContext, args: RateArgs) -> Result<(), String> {
    let order = OrderId::new(args.order);

    let Some(score) = args.score else {
        return show(ctx, order).await;
    };

    let score = Score::new(score).map_err(|error| format!("invalid rating: {error}"))?;
    let rating = NewRating::new(order, score, args.comment.as_deref());

    let outcome = rate_order(ctx.ratings.as_ref(), &rating)
        .await
        .map_err(|error| format!("failed to rate order: {error}"))?;

    match outcome {
        RatingOutcome::Submitted => println!("order {order} rated {score}, thank you"),
        RatingOutcome::AlreadyRated => println!("order {order} was already rated"),
    }

    Ok(())
}

async fn show(ctx: &AppContext, order: OrderId) -> Result<(), String> {
    let status = rating_status(ctx.ratings.as_ref(), order)
        .await
        .map_err(|error| format!("failed to load rating: {error}"))?;

    match status {
        RatingStatus::Unrated => println!("order {order} is not rated yet"),
        RatingStatus::Rated(rating) => {
            println!("order {order} rated {}/{}", rating.score, Score::MAX);

            if let Some(comment) = rating.comment.filter(|comment| !comment.is_empty()) {
                println!("comment: {comment}");
            }
        }
    }

    Ok(())
}
