use resource_list::{ControllerError, ListEntity, ListHandle, ListView};
use async_trait::async_trait;

/// Trait for screen clients to inherit the standard list navigation.
///
/// Implementors only expose their [`ListHandle`]; search and paging come for free.
#[async_trait]
pub trait ListClient<T: ListEntity>: Send + Sync {
    /// The screen-specific error type.
    type Error: From<ControllerError> + Send;

    /// Access the inner list handle.
    fn list(&self) -> &ListHandle<T>;

    /// The latest published view.
    fn view(&self) -> ListView<T> {
        self.list().view()
    }

    /// Forward a keystroke in the search box. Debounced by the controller.
    #[tracing::instrument(skip(self))]
    async fn search(&self, text: &str) -> Result<(), Self::Error> {
        tracing::debug!("Sending command");
        Ok(self.list().change_search_text(text).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn go_to_page(&self, page: u32) -> Result<(), Self::Error> {
        tracing::debug!("Sending command");
        Ok(self.list().change_page(page).await?)
    }

    /// Moves forward one page; does nothing on the last page.
    async fn next_page(&self) -> Result<(), Self::Error> {
        let view = self.view();
        if view.page >= view.total_pages {
            return Ok(());
        }
        self.go_to_page(view.page + 1).await
    }

    /// Moves back one page; does nothing on the first page.
    async fn previous_page(&self) -> Result<(), Self::Error> {
        let view = self.view();
        if view.page <= 1 {
            return Ok(());
        }
        self.go_to_page(view.page - 1).await
    }

    /// Waits for the list to finish loading and returns the settled view.
    async fn settled(&self) -> Result<ListView<T>, Self::Error> {
        Ok(self.list().settled().await?)
    }
}
