//! Admin store: the back-office view of users, orders and dashboard numbers.
//!
//! Mutations notify success or failure. Reads only record `error`.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{instrument, warn};

use tetranoma_core::{FigureId, OrderId, OrderStatus, UserId, UserRole};

use crate::gateway::{ApiRequest, Gateway, GatewayError, fetch};
use crate::models::{
    AccountCreated, AdminUserUpdate, DashboardStats, DeletionReason, Figure, FigureEnvelope,
    FigureInput, NewAccount, Order, OrderEnvelope, OrderList, OrderQuery, RoleChange,
    StatsEnvelope, StatusChange, UserEnvelope, UserList, UserQuery, UserRecord,
};
use crate::notify::Notifier;

use super::BusyFlag;

#[derive(Debug, Default)]
struct AdminState {
    users: Vec<UserRecord>,
    orders: Vec<Order>,
    stats: DashboardStats,
    error: Option<String>,
}

/// Owns the back-office lists.
pub struct AdminStore {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    state: RwLock<AdminState>,
    busy: BusyFlag,
}

impl AdminStore {
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            state: RwLock::new(AdminState::default()),
            busy: BusyFlag::default(),
        }
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Load users together with their activity counters.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn get_all_users_with_activity(
        &self,
        query: &UserQuery,
    ) -> Result<Vec<UserRecord>, GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::get("/admin/users-with-activity")
            .param_opt("search", query.search.as_deref())
            .param_opt("role", query.role)
            .param_opt("page", query.page)
            .param_opt("limit", query.limit);

        match fetch::<UserList>(self.gateway.as_ref(), request).await {
            Ok(list) => {
                let mut state = self.state.write().await;
                state.users = list.users.clone();
                state.error = None;
                Ok(list.users)
            }
            Err(e) => Err(self.fail(e, "Error loading users", false).await),
        }
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self), fields(user_id = %user_id, role = %role))]
    pub async fn update_user_role(
        &self,
        user_id: &UserId,
        role: UserRole,
    ) -> Result<UserRecord, GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::put("/admin/users/role").json(&RoleChange {
            user_id: user_id.clone(),
            role,
        })?;

        match fetch::<UserEnvelope>(self.gateway.as_ref(), request).await {
            Ok(envelope) => {
                self.replace_user(user_id, &envelope.user).await;
                self.notifier.success("User role updated successfully");
                Ok(envelope.user)
            }
            Err(e) => Err(self.fail(e, "Error updating role", true).await),
        }
    }

    /// Create a user, optionally with a role.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn create_user(&self, account: &NewAccount) -> Result<AccountCreated, GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::post("/admin/create-user").json(account)?;

        match fetch::<AccountCreated>(self.gateway.as_ref(), request).await {
            Ok(created) => {
                let mut state = self.state.write().await;
                if let Some(user) = &created.user {
                    state.users.push(user.clone());
                }
                state.error = None;
                drop(state);
                self.notifier.success("User created successfully");
                Ok(created)
            }
            Err(e) => Err(self.fail(e, "Error creating user", true).await),
        }
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, update), fields(user_id = %user_id))]
    pub async fn update_user(
        &self,
        user_id: &UserId,
        update: &AdminUserUpdate,
    ) -> Result<UserRecord, GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::put(format!("/admin/update-user/{user_id}")).json(update)?;

        match fetch::<UserEnvelope>(self.gateway.as_ref(), request).await {
            Ok(envelope) => {
                self.replace_user(user_id, &envelope.user).await;
                self.notifier.success("User updated successfully");
                Ok(envelope.user)
            }
            Err(e) => Err(self.fail(e, "Error updating user", true).await),
        }
    }

    /// Delete a user; the local entry is removed after the server confirms.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::delete(format!("/admin/delete-user/{user_id}"));

        match self.gateway.send(request).await {
            Ok(_) => {
                let mut state = self.state.write().await;
                state.users.retain(|u| u.id != *user_id);
                state.error = None;
                drop(state);
                self.notifier.success("User deleted successfully");
                Ok(())
            }
            Err(e) => Err(self.fail(e, "Error deleting user", true).await),
        }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn get_all_orders(&self, query: &OrderQuery) -> Result<Vec<Order>, GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::get("/admin/orders")
            .param_opt("status", query.status)
            .param_opt("page", query.page)
            .param_opt("limit", query.limit);

        match fetch::<OrderList>(self.gateway.as_ref(), request).await {
            Ok(list) => {
                let mut state = self.state.write().await;
                state.orders = list.orders.clone();
                state.error = None;
                Ok(list.orders)
            }
            Err(e) => Err(self.fail(e, "Error loading orders", false).await),
        }
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::put(format!("/admin/orders/{order_id}/status"))
            .json(&StatusChange { status })?;

        match fetch::<OrderEnvelope>(self.gateway.as_ref(), request).await {
            Ok(envelope) => {
                let mut state = self.state.write().await;
                if let Some(order) = state.orders.iter_mut().find(|o| o.id == *order_id) {
                    *order = envelope.order.clone();
                }
                state.error = None;
                drop(state);
                self.notifier.success("Order status updated successfully");
                Ok(envelope.order)
            }
            Err(e) => Err(self.fail(e, "Error updating status", true).await),
        }
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Load headline numbers. A missing revenue series becomes one zero bucket.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn get_dashboard_stats(&self) -> Result<DashboardStats, GatewayError> {
        let _busy = self.busy.enter();

        match fetch::<StatsEnvelope>(self.gateway.as_ref(), ApiRequest::get("/admin/dashboard-stats"))
            .await
        {
            Ok(envelope) => {
                let stats = envelope.stats.normalized();
                let mut state = self.state.write().await;
                state.stats = stats.clone();
                state.error = None;
                Ok(stats)
            }
            Err(e) => Err(self.fail(e, "Error loading stats", false).await),
        }
    }

    // =========================================================================
    // Figures
    // =========================================================================

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, input))]
    pub async fn create_figure_admin(&self, input: &FigureInput) -> Result<Figure, GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::post("/admin/create-figure").json(input)?;

        match fetch::<FigureEnvelope>(self.gateway.as_ref(), request).await {
            Ok(envelope) => {
                self.state.write().await.error = None;
                self.notifier.success("Figure created successfully");
                Ok(envelope.figure)
            }
            Err(e) => Err(self.fail(e, "Error creating figure", true).await),
        }
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, input), fields(figure_id = %figure_id))]
    pub async fn update_figure_admin(
        &self,
        figure_id: &FigureId,
        input: &FigureInput,
    ) -> Result<Figure, GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::put(format!("/admin/update-figure/{figure_id}")).json(input)?;

        match fetch::<FigureEnvelope>(self.gateway.as_ref(), request).await {
            Ok(envelope) => {
                self.state.write().await.error = None;
                self.notifier.success("Figure updated successfully");
                Ok(envelope.figure)
            }
            Err(e) => Err(self.fail(e, "Error updating figure", true).await),
        }
    }

    /// Delete any figure. `reason` is sent in the request body.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, reason), fields(figure_id = %figure_id))]
    pub async fn delete_figure_admin(
        &self,
        figure_id: &FigureId,
        reason: Option<String>,
    ) -> Result<(), GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::delete(format!("/admin/delete-figure/{figure_id}"))
            .json(&DeletionReason { reason })?;

        match self.gateway.send(request).await {
            Ok(_) => {
                self.state.write().await.error = None;
                self.notifier.success("Figure deleted successfully");
                Ok(())
            }
            Err(e) => Err(self.fail(e, "Error deleting figure", true).await),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub async fn users(&self) -> Vec<UserRecord> {
        self.state.read().await.users.clone()
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.state.read().await.orders.clone()
    }

    pub async fn stats(&self) -> DashboardStats {
        self.state.read().await.stats.clone()
    }

    /// Message of the last failed action, cleared by the next success.
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.busy.is_busy()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn replace_user(&self, user_id: &UserId, updated: &UserRecord) {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == *user_id) {
            *user = updated.clone();
        }
        state.error = None;
    }

    async fn fail(&self, error: GatewayError, fallback: &str, notify: bool) -> GatewayError {
        let message = error.user_message(fallback);
        warn!(error = %error, "{fallback}");
        self.state.write().await.error = Some(message.clone());
        if notify {
            self.notifier.error(&message);
        }
        error
    }
}
