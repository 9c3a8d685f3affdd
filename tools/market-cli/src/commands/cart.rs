//! Cart commands.

use anyhow::Result;
use market_cart::{CartError, CartStore, NewLineItem, ProductId};

use super::{AddArgs, QuantityArgs};
use crate::context::Context;

/// Print the cart.
pub async fn show(ctx: &Context) -> Result<()> {
    let scope = ctx.cart_scope().await?;
    let cart = scope.cart()?;

    ctx.output.header("Cart");
    ctx.output.cart(&cart.products());
    Ok(())
}

/// Add a product.
pub async fn add(args: AddArgs, ctx: &Context) -> Result<()> {
    let scope = ctx.cart_scope().await?;
    let cart = scope.cart()?;

    let id = ProductId::new(args.id);
    let item = NewLineItem::new(id.clone(), args.title, args.image_url, args.price);
    let saved = report_write(ctx, &cart, cart.add_to_cart(item).await)?;

    let quantity = cart.get(&id).map(|i| i.quantity).unwrap_or_default();
    finish(ctx, &cart, saved, &format!("Added {} (quantity {})", id, quantity));
    Ok(())
}

/// Increase a product's quantity.
pub async fn increment(args: QuantityArgs, ctx: &Context) -> Result<()> {
    let scope = ctx.cart_scope().await?;
    let cart = scope.cart()?;

    let id = ProductId::new(args.id);
    let saved = report_write(ctx, &cart, cart.increment(&id).await)?;

    let quantity = cart.get(&id).map(|i| i.quantity).unwrap_or_default();
    finish(ctx, &cart, saved, &format!("{} now has quantity {}", id, quantity));
    Ok(())
}

/// Decrease a product's quantity.
pub async fn decrement(args: QuantityArgs, ctx: &Context) -> Result<()> {
    let scope = ctx.cart_scope().await?;
    let cart = scope.cart()?;

    let id = ProductId::new(args.id);
    let saved = report_write(ctx, &cart, cart.decrement(&id).await)?;

    let msg = match cart.get(&id) {
        Some(item) => format!("{} now has quantity {}", id, item.quantity),
        None => format!("Removed {} from the cart", id),
    };
    finish(ctx, &cart, saved, &msg);
    Ok(())
}

/// Empty the cart.
pub async fn clear(ctx: &Context) -> Result<()> {
    let scope = ctx.cart_scope().await?;
    let cart = scope.cart()?;

    let saved = report_write(ctx, &cart, cart.clear().await)?;
    finish(ctx, &cart, saved, "Cart cleared");
    Ok(())
}

/// Separate write failures from rejected operations.
///
/// A failed write still leaves the in-memory cart updated, so it is shown
/// with a warning rather than aborting. Anything else is returned.
fn report_write(
    ctx: &Context,
    cart: &CartStore,
    result: Result<(), CartError>,
) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e @ CartError::Persist { .. }) if cart.is_dirty() => {
            ctx.output.warn(&format!("Change not saved: {}", e));
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

fn finish(ctx: &Context, cart: &CartStore, saved: bool, msg: &str) {
    if saved {
        ctx.output.success(msg);
    } else {
        ctx.output.info(msg);
    }
    ctx.output.cart(&cart.products());
}
