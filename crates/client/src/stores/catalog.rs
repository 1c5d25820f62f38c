//! Catalog store: figure listing, filters, pagination and favorites.
//!
//! The listing reflects the newest list request that succeeded. A filter
//! change resets to page 1 and fences off any fetch still in flight; its
//! response is discarded when it lands, even if the filtered fetch fails.
//!
//! Mutations (favorites, own figures) notify success or failure. Reads only
//! record `error`.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use tetranoma_core::FigureId;

use crate::error::add_breadcrumb;
use crate::gateway::{ApiRequest, Gateway, GatewayError, fetch};
use crate::models::{
    FavoriteToggle, Figure, FigureEnvelope, FigureFilters, FigureInput, FigurePage, FilterPatch,
    Pagination,
};
use crate::notify::Notifier;

use super::{BusyFlag, RequestSequence, Ticket};

#[derive(Debug)]
struct CatalogState {
    figures: Vec<Figure>,
    pagination: Pagination,
    filters: FigureFilters,
    current_figure: Option<Figure>,
    favorites: Vec<Figure>,
    my_figures: Vec<Figure>,
    error: Option<String>,
}

/// Owns the catalog listing and the figures around it.
pub struct CatalogStore {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    items_per_page: u32,
    state: RwLock<CatalogState>,
    busy: BusyFlag,
    /// Orders list fetches.
    listing: RequestSequence,
    /// Orders single-figure fetches.
    detail: RequestSequence,
}

impl CatalogStore {
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, notifier: Arc<dyn Notifier>, items_per_page: u32) -> Self {
        Self {
            gateway,
            notifier,
            items_per_page,
            state: RwLock::new(CatalogState {
                figures: Vec::new(),
                pagination: Pagination::first_page(items_per_page),
                filters: FigureFilters::default(),
                current_figure: None,
                favorites: Vec::new(),
                my_figures: Vec::new(),
                error: None,
            }),
            busy: BusyFlag::default(),
            listing: RequestSequence::default(),
            detail: RequestSequence::default(),
        }
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Fetch one page of figures.
    ///
    /// `filters` replaces the active filters; `None` keeps them. On success
    /// the listing, pagination and filters are replaced together, unless a
    /// newer list response has been applied in the meantime.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, filters))]
    pub async fn get_figures(
        &self,
        page: u32,
        filters: Option<FigureFilters>,
    ) -> Result<FigurePage, GatewayError> {
        let ticket = self.listing.issue();
        let filters = match filters {
            Some(filters) => filters,
            None => self.state.read().await.filters.clone(),
        };
        self.fetch_listing(ticket, page, filters).await
    }

    async fn fetch_listing(
        &self,
        ticket: Ticket,
        page: u32,
        filters: FigureFilters,
    ) -> Result<FigurePage, GatewayError> {
        let _busy = self.busy.enter();
        let mut request = ApiRequest::get("/figures")
            .param("page", page)
            .param("limit", self.items_per_page);
        for (key, value) in filters.query_params() {
            request = request.param(key, value);
        }

        match fetch::<FigurePage>(self.gateway.as_ref(), request).await {
            Ok(page_data) => {
                self.apply_listing(ticket, page, filters, &page_data).await;
                Ok(page_data)
            }
            Err(e) => Err(self
                .fail(Some((&self.listing, ticket)), e, "Error loading figures", false)
                .await),
        }
    }

    /// Merge `patch` into the active filters and fetch page 1.
    ///
    /// The merged filters and page 1 take effect immediately, so the state
    /// never pairs new filters with an old page. Listings requested before
    /// the change are discarded.
    ///
    /// # Errors
    ///
    /// Returns the gateway error of the fetch.
    #[instrument(skip(self, patch))]
    pub async fn update_filters(&self, patch: FilterPatch) -> Result<FigurePage, GatewayError> {
        let (ticket, merged) = {
            let mut state = self.state.write().await;
            let merged = patch.merge_into(&state.filters);
            state.filters = merged.clone();
            state.pagination.current_page = 1;
            (self.fenced_ticket(), merged)
        };
        debug!(?merged, "Filters updated");
        self.fetch_listing(ticket, 1, merged).await
    }

    /// Drop every filter and fetch page 1.
    ///
    /// # Errors
    ///
    /// Returns the gateway error of the fetch.
    #[instrument(skip(self))]
    pub async fn clear_filters(&self) -> Result<FigurePage, GatewayError> {
        let ticket = {
            let mut state = self.state.write().await;
            state.filters = FigureFilters::default();
            state.pagination.current_page = 1;
            self.fenced_ticket()
        };
        self.fetch_listing(ticket, 1, FigureFilters::default()).await
    }

    // =========================================================================
    // Single figure
    // =========================================================================

    /// Load one figure into `current_figure`.
    ///
    /// # Errors
    ///
    /// Returns the gateway error (e.g. 404).
    #[instrument(skip(self), fields(figure_id = %id))]
    pub async fn get_figure_by_id(&self, id: &FigureId) -> Result<Figure, GatewayError> {
        let _busy = self.busy.enter();
        let ticket = self.detail.issue();
        let request = ApiRequest::get(format!("/figures/{id}"));

        match fetch::<FigureEnvelope>(self.gateway.as_ref(), request).await {
            Ok(envelope) => {
                let mut state = self.state.write().await;
                if self.detail.claim(ticket) {
                    state.current_figure = Some(envelope.figure.clone());
                    state.error = None;
                } else {
                    debug!(?ticket, "Discarding superseded figure response");
                }
                Ok(envelope.figure)
            }
            Err(e) => Err(self
                .fail(Some((&self.detail, ticket)), e, "Error loading figure", false)
                .await),
        }
    }

    /// Toggle the signed-in user's favorite on a figure.
    ///
    /// Only that figure's favorites set is patched, using the server's answer.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; nothing is patched in that case.
    #[instrument(skip(self), fields(figure_id = %id))]
    pub async fn toggle_favorite(&self, id: &FigureId) -> Result<FavoriteToggle, GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::post(format!("/figures/{id}/favorite"));

        let toggle = match fetch::<FavoriteToggle>(self.gateway.as_ref(), request).await {
            Ok(toggle) => toggle,
            Err(e) => return Err(self.fail(None, e, "Error updating favorites", true).await),
        };

        let mut state = self.state.write().await;
        let CatalogState {
            figures,
            current_figure,
            favorites,
            my_figures,
            error,
            ..
        } = &mut *state;

        for figure in figures
            .iter_mut()
            .chain(my_figures.iter_mut())
            .chain(current_figure.iter_mut())
            .filter(|f| f.id == *id)
        {
            figure.apply_favorite(&toggle.user_id, toggle.is_favorite);
        }

        if toggle.is_favorite {
            if !favorites.iter().any(|f| f.id == *id) {
                let known = figures
                    .iter()
                    .chain(current_figure.iter())
                    .find(|f| f.id == *id)
                    .cloned();
                if let Some(figure) = known {
                    favorites.push(figure);
                }
            }
        } else {
            favorites.retain(|f| f.id != *id);
        }
        for figure in favorites.iter_mut().filter(|f| f.id == *id) {
            figure.apply_favorite(&toggle.user_id, toggle.is_favorite);
        }
        *error = None;
        drop(state);

        self.notifier.success(if toggle.is_favorite {
            "Added to favorites"
        } else {
            "Removed from favorites"
        });
        add_breadcrumb(
            "catalog",
            if toggle.is_favorite { "Favorited" } else { "Unfavorited" },
            Some(&[("figure_id", id.to_string().as_str())]),
        );

        Ok(toggle)
    }

    // =========================================================================
    // Own figures
    // =========================================================================

    /// List a new figure. It is added to `my_figures`.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, input))]
    pub async fn create_figure(&self, input: &FigureInput) -> Result<Figure, GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::post("/figures/create").json(input)?;

        match fetch::<FigureEnvelope>(self.gateway.as_ref(), request).await {
            Ok(envelope) => {
                let mut state = self.state.write().await;
                state.my_figures.push(envelope.figure.clone());
                state.error = None;
                drop(state);
                self.notifier.success("Figure created successfully");
                Ok(envelope.figure)
            }
            Err(e) => Err(self.fail(None, e, "Error creating figure", true).await),
        }
    }

    /// Update a figure and replace every local copy of it.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, input), fields(figure_id = %id))]
    pub async fn update_figure(
        &self,
        id: &FigureId,
        input: &FigureInput,
    ) -> Result<Figure, GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::put(format!("/figures/update/{id}")).json(input)?;

        match fetch::<FigureEnvelope>(self.gateway.as_ref(), request).await {
            Ok(envelope) => {
                let updated = envelope.figure;
                let mut state = self.state.write().await;
                let CatalogState {
                    figures,
                    current_figure,
                    favorites,
                    my_figures,
                    error,
                    ..
                } = &mut *state;
                for figure in figures
                    .iter_mut()
                    .chain(favorites.iter_mut())
                    .chain(my_figures.iter_mut())
                    .chain(current_figure.iter_mut())
                    .filter(|f| f.id == *id)
                {
                    *figure = updated.clone();
                }
                *error = None;
                drop(state);
                self.notifier.success("Figure updated successfully");
                Ok(updated)
            }
            Err(e) => Err(self.fail(None, e, "Error updating figure", true).await),
        }
    }

    /// Delete a figure. Local copies are removed only after the server
    /// confirms.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; local state is unchanged in that case.
    #[instrument(skip(self), fields(figure_id = %id))]
    pub async fn delete_figure(&self, id: &FigureId) -> Result<(), GatewayError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::delete(format!("/figures/delete/{id}"));

        match self.gateway.send(request).await {
            Ok(_) => {
                let mut state = self.state.write().await;
                state.figures.retain(|f| f.id != *id);
                state.favorites.retain(|f| f.id != *id);
                state.my_figures.retain(|f| f.id != *id);
                if state.current_figure.as_ref().is_some_and(|f| f.id == *id) {
                    state.current_figure = None;
                }
                state.error = None;
                drop(state);
                self.notifier.success("Figure deleted successfully");
                Ok(())
            }
            Err(e) => Err(self.fail(None, e, "Error deleting figure", true).await),
        }
    }

    /// Load the signed-in user's favorites.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn get_favorites(&self) -> Result<Vec<Figure>, GatewayError> {
        let _busy = self.busy.enter();

        match fetch::<FigurePage>(self.gateway.as_ref(), ApiRequest::get("/figures/favorites")).await
        {
            Ok(page) => {
                let mut state = self.state.write().await;
                state.favorites = page.figures.clone();
                state.error = None;
                Ok(page.figures)
            }
            Err(e) => Err(self.fail(None, e, "Error loading favorites", false).await),
        }
    }

    /// Load the figures listed by the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn get_my_figures(&self) -> Result<Vec<Figure>, GatewayError> {
        let _busy = self.busy.enter();

        match fetch::<FigurePage>(self.gateway.as_ref(), ApiRequest::get("/figures/my-figures"))
            .await
        {
            Ok(page) => {
                let mut state = self.state.write().await;
                state.my_figures = page.figures.clone();
                state.error = None;
                Ok(page.figures)
            }
            Err(e) => Err(self.fail(None, e, "Error loading your figures", false).await),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub async fn figures(&self) -> Vec<Figure> {
        self.state.read().await.figures.clone()
    }

    pub async fn pagination(&self) -> Pagination {
        self.state.read().await.pagination
    }

    pub async fn filters(&self) -> FigureFilters {
        self.state.read().await.filters.clone()
    }

    pub async fn current_figure(&self) -> Option<Figure> {
        self.state.read().await.current_figure.clone()
    }

    pub async fn favorites(&self) -> Vec<Figure> {
        self.state.read().await.favorites.clone()
    }

    pub async fn my_figures(&self) -> Vec<Figure> {
        self.state.read().await.my_figures.clone()
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

    /// Issue a list ticket that discards every listing requested before it.
    fn fenced_ticket(&self) -> Ticket {
        let ticket = self.listing.issue();
        self.listing.fence(ticket);
        ticket
    }

    async fn apply_listing(
        &self,
        ticket: Ticket,
        page: u32,
        filters: FigureFilters,
        data: &FigurePage,
    ) {
        let mut state = self.state.write().await;
        if !self.listing.claim(ticket) {
            debug!(?ticket, page, "Discarding superseded figure listing");
            return;
        }

        state.figures = data.figures.clone();
        state.pagination = data.pagination.unwrap_or(Pagination {
            current_page: page,
            total_pages: page,
            total_items: data.figures.len() as u64,
            items_per_page: self.items_per_page,
        });
        state.filters = filters;
        state.error = None;
    }

    /// Record a failure. Sequenced requests only record it while not stale.
    async fn fail(
        &self,
        sequenced: Option<(&RequestSequence, Ticket)>,
        error: GatewayError,
        fallback: &str,
        notify: bool,
    ) -> GatewayError {
        let message = error.user_message(fallback);
        warn!(error = %error, "{fallback}");
        let current = sequenced.is_none_or(|(sequence, ticket)| !sequence.is_stale(ticket));
        if current {
            self.state.write().await.error = Some(message.clone());
        }
        if notify {
            self.notifier.error(&message);
        }
        error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::Method;
    use crate::gateway::mock::MockGateway;
    use crate::notify::RecordingNotifier;

    #[tokio::test]
    async fn test_listing_without_pagination_falls_back_to_request() {
        let gateway = Arc::new(MockGateway::new());
        gateway.respond(
            Method::Get,
            "/figures",
            json!({"figures": [{"_id": "f1", "title": "Rei", "price": 80}]}),
        );
        let store = CatalogStore::new(gateway.clone(), Arc::new(RecordingNotifier::new()), 12);

        store.get_figures(3, None).await.unwrap();

        let pagination = store.pagination().await;
        assert_eq!(pagination.current_page, 3);
        assert_eq!(pagination.items_per_page, 12);
        let request = gateway.last_request(Method::Get, "/figures").unwrap();
        assert_eq!(request.param_value("limit"), Some("12"));
    }

    #[tokio::test]
    async fn test_delete_figure_failure_keeps_entry() {
        let gateway = Arc::new(MockGateway::new());
        gateway.respond(
            Method::Get,
            "/figures",
            json!({"figures": [{"_id": "f1", "title": "Rei", "price": 80}]}),
        );
        gateway.fail(
            Method::Delete,
            "/figures/delete/f1",
            GatewayError::Api {
                status: 403,
                message: Some("Not your figure".to_string()),
            },
        );
        let store = CatalogStore::new(gateway, Arc::new(RecordingNotifier::new()), 12);

        store.get_figures(1, None).await.unwrap();
        assert!(store.delete_figure(&FigureId::from("f1")).await.is_err());

        assert_eq!(store.figures().await.len(), 1);
        assert_eq!(store.error().await.as_deref(), Some("Not your figure"));
    }
}
