//! Table output.

use sacola::{
    cart::{CartLine, CartTotals},
    money::{format_brl, format_money},
    payments::{PaymentMethod, StoredCard},
};
use sacola_app::domain::{catalog::MenuItem, orders::OrderSummary};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};

fn finish(builder: Builder, right_aligned: Columns<std::ops::Range<usize>>) -> String {
    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(right_aligned, Alignment::right());

    table.to_string()
}

pub(crate) fn menu(items: &[MenuItem]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Item", "Name", "Description", "Price"]);

    for item in items {
        let price = item
            .unit_price()
            .map_or_else(|| item.price.to_string(), format_brl);

        builder.push_record([
            item.id.to_string(),
            item.name.clone(),
            item.description.clone().unwrap_or_default(),
            price,
        ]);
    }

    finish(builder, Columns::new(3..4))
}

pub(crate) fn bag(lines: &[CartLine]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Line", "Item", "Name", "Qty", "Unit", "Total"]);

    for line in lines {
        let total = line
            .unit_price
            .checked_mul(i64::from(line.quantity))
            .map_or_else(|| "overflow".to_string(), format_brl);

        builder.push_record([
            line.line_id.to_string(),
            line.item_id.to_string(),
            line.name.clone(),
            line.quantity.to_string(),
            format_brl(line.unit_price),
            total,
        ]);
    }

    finish(builder, Columns::new(3..6))
}

pub(crate) fn totals(totals: &CartTotals) -> String {
    let mut builder = Builder::default();
    builder.push_record(["", "Amount"]);
    builder.push_record(["Subtotal".to_string(), format_money(&totals.subtotal)]);
    builder.push_record(["Delivery fee".to_string(), format_money(&totals.delivery_fee)]);

    if totals.surcharge.to_minor_units() != 0 {
        builder.push_record(["Surcharge".to_string(), format_money(&totals.surcharge)]);
    }

    builder.push_record(["Total".to_string(), format_money(&totals.total)]);

    finish(builder, Columns::new(1..2))
}

pub(crate) fn methods(methods: &[PaymentMethod]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Code", "Name", "Change"]);

    for method in methods {
        builder.push_record([
            method.code.clone(),
            method.name.clone(),
            if method.requires_change { "yes" } else { "no" }.to_string(),
        ]);
    }

    finish(builder, Columns::new(2..3))
}

pub(crate) fn cards(cards: &[StoredCard]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Id", "Brand", "Number", "Nickname"]);

    for card in cards {
        builder.push_record([
            card.id.to_string(),
            card.brand.clone(),
            card.masked_number.clone(),
            card.nickname.clone().unwrap_or_default(),
        ]);
    }

    finish(builder, Columns::new(0..1))
}

pub(crate) fn history(orders: &[OrderSummary]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Order", "Status", "Placed", "Total"]);

    for order in orders {
        let status = order
            .stage()
            .map_or_else(|| order.status.clone(), |stage| stage.to_string());
        let total = sacola::money::minor_from_decimal(order.total)
            .map_or_else(|| order.total.to_string(), format_brl);

        builder.push_record([
            order.id.to_string(),
            status,
            order.created_at.clone().unwrap_or_default(),
            total,
        ]);
    }

    finish(builder, Columns::new(3..4))
}
