//! In-memory catalog

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use brew_catalog::{Catalog, CatalogError, CatalogSource};
use tracing::debug;

/// A catalog source whose contents can be swapped between queries
///
/// Clones share the same catalog, so a test can hand one clone to the
/// executor and edit the catalog through another.
#[derive(Debug, Clone, Default)]
pub struct SimCatalog {
    catalog: Rc<RefCell<Catalog>>,
    loads: Rc<Cell<usize>>,
    unreachable: Rc<Cell<bool>>,
}

impl SimCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Rc::new(RefCell::new(catalog)),
            ..Self::default()
        }
    }

    /// Replace the catalog served by every clone
    pub fn replace(&self, catalog: Catalog) {
        debug!("Simulated catalog replaced");
        *self.catalog.borrow_mut() = catalog;
    }

    /// Edit the served catalog in place
    pub fn update(&self, edit: impl FnOnce(&mut Catalog)) {
        edit(&mut self.catalog.borrow_mut());
    }

    /// Make subsequent loads fail as if the server were down
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.set(unreachable);
    }

    /// Number of times the catalog was loaded
    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl CatalogSource for SimCatalog {
    fn load(&self) -> Result<Catalog, CatalogError> {
        self.loads.set(self.loads.get() + 1);
        if self.unreachable.get() {
            return Err(CatalogError::FetchFailed {
                location: "sim://catalog".to_string(),
                reason: "simulated outage".to_string(),
            });
        }
        Ok(self.catalog.borrow().clone())
    }
}
