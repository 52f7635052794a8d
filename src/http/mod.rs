//! HTTP surface
//!
//! An axum router over a shared [`WalletPlatform`]. User routes act on the
//! caller's own wallet; admin routes sit behind [`caller::require_admin`].
//!
//! ```text
//! GET  /wallet                                  caller's wallet
//! PUT  /wallet/settings                         auto-recharge settings
//! GET  /wallet/transactions?limit=&offset=      caller's ledger
//! POST /wallet/withdrawals                      request a payout
//! POST /wallet/admin/{userId}/adjust            admin credit/debit
//! GET  /wallet/admin/{userId}/transactions      user's ledger
//! GET  /wallet/admin/{userId}/reconcile         ledger vs balance
//! GET  /admin/wallet/stats                      cached platform totals
//! PUT  /admin/orders/{orderId}/zen-status       order status change
//! GET  /admin/withdrawals?status=&userId=       withdrawal queue
//! GET  /admin/withdrawals/{id}
//! PUT  /admin/withdrawals/{id}                  notes and tx ref only
//! PUT  /admin/withdrawals/{id}/status           withdrawal status change
//! ```

pub mod caller;
pub mod error;
pub mod handlers;

pub use caller::Caller;
pub use error::ApiError;

use crate::core::platform::WalletPlatform;
use crate::types::LedgerError;
use axum::routing::{get, post, put};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tracing::info;

/// Build the full router with the platform as shared state
pub fn router(platform: WalletPlatform) -> Router {
    let user_routes = Router::new()
        .route("/wallet", get(handlers::get_wallet))
        .route("/wallet/settings", put(handlers::update_settings))
        .route("/wallet/transactions", get(handlers::list_transactions))
        .route("/wallet/withdrawals", post(handlers::request_withdrawal));

    let admin_routes = Router::new()
        .route("/wallet/admin/{user_id}/adjust", post(handlers::adjust_wallet))
        .route(
            "/wallet/admin/{user_id}/transactions",
            get(handlers::user_transactions),
        )
        .route("/wallet/admin/{user_id}/reconcile", get(handlers::reconcile))
        .route("/admin/wallet/stats", get(handlers::wallet_stats))
        .route(
            "/admin/orders/{order_id}/zen-status",
            put(handlers::update_order_status),
        )
        .route("/admin/withdrawals", get(handlers::list_withdrawals))
        .route(
            "/admin/withdrawals/{id}",
            get(handlers::get_withdrawal).put(handlers::annotate_withdrawal),
        )
        .route(
            "/admin/withdrawals/{id}/status",
            put(handlers::update_withdrawal_status),
        )
        .layer(middleware::from_fn(caller::require_admin));

    user_routes.merge(admin_routes).with_state(platform)
}

/// Bind `0.0.0.0:port` and serve until the process is stopped
pub async fn serve(platform: WalletPlatform, port: u16) -> Result<(), LedgerError> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(addr = %listener.local_addr()?, "wallet API listening");

    axum::serve(listener, router(platform)).await?;
    Ok(())
}
