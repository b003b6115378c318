//! Request store: UI-facing state for the superhero screens.
//!
//! All state changes go through [`StoreState::apply`]; [`SuperheroStore`]
//! drives the remote calls and publishes every new state on a watch channel.
//! Results are applied only after the remote call returns. Concurrent calls
//! of the same kind are not de-duplicated, so the last response wins.

use tokio::sync::watch;

use super::api::{ImageFile, SuperheroApi};
use crate::config::DEFAULT_PAGE_LIMIT;
use crate::heroes::{NewSuperhero, Paginated, SuperheroPatch, SuperheroWithImages};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Details,
    Create,
    Update,
    Delete,
    Upload,
}

/// In-flight flag per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    pub list: bool,
    pub details: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
    pub upload: bool,
}

impl LoadingFlags {
    pub fn get(&self, op: Operation) -> bool {
        match op {
            Operation::List => self.list,
            Operation::Details => self.details,
            Operation::Create => self.create,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
            Operation::Upload => self.upload,
        }
    }

    fn set(&mut self, op: Operation, value: bool) {
        let flag = match op {
            Operation::List => &mut self.list,
            Operation::Details => &mut self.details,
            Operation::Create => &mut self.create,
            Operation::Update => &mut self.update,
            Operation::Delete => &mut self.delete,
            Operation::Upload => &mut self.upload,
        };
        *flag = value;
    }

    pub fn any(&self) -> bool {
        self.list || self.details || self.create || self.update || self.delete || self.upload
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreState {
    pub superheroes: Vec<SuperheroWithImages>,
    pub selected_superhero: Option<SuperheroWithImages>,
    pub total_heroes: u64,
    pub current_page: u64,
    pub limit: u64,
    pub loading: LoadingFlags,
    /// Last failure message, shared by all operations
    pub error: Option<String>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            superheroes: Vec::new(),
            selected_superhero: None,
            total_heroes: 0,
            current_page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            loading: LoadingFlags::default(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A remote call began: raise its flag and clear the error.
    Started(Operation),
    Failed { op: Operation, message: String },
    ListLoaded {
        result: Paginated<SuperheroWithImages>,
        page: u64,
        limit: u64,
    },
    DetailsLoaded(SuperheroWithImages),
    Created,
    Updated(SuperheroWithImages),
    Deleted,
    Uploaded,
    SelectionCleared,
    ErrorSet(Option<String>),
}

impl StoreState {
    pub fn apply(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Started(op) => {
                self.loading.set(op, true);
                self.error = None;
            }
            StoreEvent::Failed { op, message } => {
                if op == Operation::Details {
                    self.selected_superhero = None;
                }
                self.error = Some(message);
                self.loading.set(op, false);
            }
            StoreEvent::ListLoaded { result, page, limit } => {
                self.superheroes = result.items;
                self.total_heroes = result.total;
                self.current_page = page;
                self.limit = limit;
                self.loading.list = false;
            }
            StoreEvent::DetailsLoaded(hero) => {
                self.selected_superhero = Some(hero);
                self.loading.details = false;
            }
            StoreEvent::Created => {
                // Newest heroes surface on the first page
                self.current_page = 1;
                self.loading.create = false;
            }
            StoreEvent::Updated(hero) => {
                for entry in self.superheroes.iter_mut().filter(|h| h.id() == hero.id()) {
                    *entry = hero.clone();
                }
                if let Some(selected) = self.selected_superhero.as_mut().filter(|s| s.id() == hero.id()) {
                    *selected = hero;
                }
                self.loading.update = false;
            }
            StoreEvent::Deleted => self.loading.delete = false,
            StoreEvent::Uploaded => self.loading.upload = false,
            StoreEvent::SelectionCleared => self.selected_superhero = None,
            StoreEvent::ErrorSet(message) => self.error = message,
        }
    }
}

pub struct SuperheroStore<A> {
    api: A,
    state: watch::Sender<StoreState>,
}

impl<A: SuperheroApi> SuperheroStore<A> {
    pub fn new(api: A) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self { api, state }
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    fn dispatch(&self, event: StoreEvent) {
        self.state.send_modify(|state| state.apply(event));
    }

    fn fail(&self, op: Operation, message: String) {
        tracing::warn!("{:?} failed: {}", op, message);
        self.dispatch(StoreEvent::Failed { op, message });
    }

    /// Load a page; missing arguments fall back to the stored page and limit.
    pub async fn fetch_superheroes(&self, page: Option<u64>, limit: Option<u64>) {
        let (page, limit) = {
            let state = self.state.borrow();
            (page.unwrap_or(state.current_page), limit.unwrap_or(state.limit))
        };

        self.dispatch(StoreEvent::Started(Operation::List));
        match self.api.fetch_superheroes(page, limit).await {
            Ok(result) => self.dispatch(StoreEvent::ListLoaded { result, page, limit }),
            Err(e) => self.fail(Operation::List, e.to_string()),
        }
    }

    pub async fn fetch_superhero_by_id(&self, id: &str) {
        self.dispatch(StoreEvent::Started(Operation::Details));
        match self.api.fetch_superhero(id).await {
            Ok(hero) => self.dispatch(StoreEvent::DetailsLoaded(hero)),
            Err(e) => self.fail(Operation::Details, e.to_string()),
        }
    }

    pub async fn create_superhero(&self, data: &NewSuperhero) -> Option<SuperheroWithImages> {
        self.dispatch(StoreEvent::Started(Operation::Create));
        match self.api.create_superhero(data).await {
            Ok(hero) => {
                self.dispatch(StoreEvent::Created);
                Some(hero)
            }
            Err(e) => {
                self.fail(Operation::Create, e.to_string());
                None
            }
        }
    }

    pub async fn update_superhero(&self, id: &str, patch: &SuperheroPatch) {
        self.dispatch(StoreEvent::Started(Operation::Update));
        match self.api.update_superhero(id, patch).await {
            Ok(hero) => self.dispatch(StoreEvent::Updated(hero)),
            Err(e) => self.fail(Operation::Update, e.to_string()),
        }
    }

    /// Delete on the server; callers refetch the list afterwards.
    pub async fn delete_superhero(&self, id: &str) {
        self.dispatch(StoreEvent::Started(Operation::Delete));
        match self.api.delete_superhero(id).await {
            Ok(_) => self.dispatch(StoreEvent::Deleted),
            Err(e) => self.fail(Operation::Delete, e.to_string()),
        }
    }

    pub async fn upload_image(&self, file: ImageFile) -> Option<String> {
        self.dispatch(StoreEvent::Started(Operation::Upload));
        match self.api.upload_image(file).await {
            Ok(url) => {
                self.dispatch(StoreEvent::Uploaded);
                Some(url)
            }
            Err(e) => {
                self.fail(Operation::Upload, e.to_string());
                None
            }
        }
    }

    pub fn clear_selected_superhero(&self) {
        self.dispatch(StoreEvent::SelectionCleared);
    }

    pub fn set_error(&self, message: Option<String>) {
        self.dispatch(StoreEvent::ErrorSet(message));
    }
}
