//! Back-office types.

use serde::{Deserialize, Serialize};

use tetranoma_core::{OrderStatus, Price, UserId, UserRole};

use super::{Order, UserRecord};

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_figures: u64,
    #[serde(default)]
    pub total_orders: u64,
    /// Never empty: a missing or empty list becomes a single zero bucket.
    #[serde(default)]
    pub revenue: Vec<RevenueBucket>,
}

impl DashboardStats {
    /// Replace an empty revenue list with a single zero bucket.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.revenue.is_empty() {
            self.revenue.push(RevenueBucket::default());
        }
        self
    }

    /// Sum of all revenue buckets.
    #[must_use]
    pub fn total_revenue(&self) -> Price {
        Price::new(self.revenue.iter().map(|b| b.total.amount()).sum())
    }
}

impl Default for DashboardStats {
    fn default() -> Self {
        Self {
            total_users: 0,
            total_figures: 0,
            total_orders: 0,
            revenue: vec![RevenueBucket::default()],
        }
    }
}

/// One revenue aggregate as grouped by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueBucket {
    #[serde(default)]
    pub total: Price,
}

/// Filters for the user list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Filters for the order list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Body for `PUT /admin/users/role`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChange {
    pub user_id: UserId,
    pub role: UserRole,
}

/// Admin edits to a user. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminUserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

/// Body for `PUT /admin/orders/{id}/status`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusChange {
    pub status: OrderStatus,
}

/// Body for `DELETE /admin/delete-figure/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeletionReason {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `{users}` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserList {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

/// `{orders}` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderList {
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// `{order}` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderEnvelope {
    pub order: Order,
}

/// `{stats}` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsEnvelope {
    pub stats: DashboardStats,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_revenue_defaults_to_zero_bucket() {
        let stats: DashboardStats =
            serde_json::from_value(json!({"totalUsers": 3, "totalFigures": 10, "totalOrders": 4}))
                .unwrap();
        let stats = stats.normalized();

        assert_eq!(stats.revenue, vec![RevenueBucket { total: Price::ZERO }]);
        assert_eq!(stats.total_revenue(), Price::ZERO);
    }

    #[test]
    fn test_total_revenue_sums_buckets() {
        let stats: DashboardStats = serde_json::from_value(json!({
            "revenue": [{"total": 100}, {"total": 20.5}]
        }))
        .unwrap();
        assert_eq!(stats.total_revenue(), Price::parse("120.5").unwrap());
    }

    #[test]
    fn test_role_change_body() {
        let body = RoleChange {
            user_id: UserId::from("u1"),
            role: UserRole::Admin,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"userId": "u1", "role": "admin"})
        );
    }
}
