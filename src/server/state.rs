//! Shared handler state: the pool handle, the dispatcher, and the
//! process-lifetime translator caches (§9 — "global state is confined to
//! the account pool singleton, the two caches, admin credentials").

use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::pool::AccountPoolHandle;
use crate::translate::TranslateContext;

#[derive(Clone)]
pub struct AppState {
    pub pool: AccountPoolHandle,
    pub dispatcher: Arc<Dispatcher>,
    pub translate: TranslateContext,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        pool: AccountPoolHandle,
        dispatcher: Dispatcher,
        translate: TranslateContext,
        config: Arc<Config>,
    ) -> Self {
        Self { pool, dispatcher: Arc::new(dispatcher), translate, config }
    }
}
