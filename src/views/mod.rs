//! Page view-models. Each view fetches what it needs from the gateway on
//! load and after every mutation, holds it in local state, and surfaces
//! failures through the notifier. Nothing here mutates local state
//! optimistically: after a successful write the authoritative rows are
//! re-fetched, because the gateway is the only place the capacity and
//! credit invariants are actually enforced.

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod logs;
pub mod storefront;
