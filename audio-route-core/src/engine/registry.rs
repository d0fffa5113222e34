use crate::models::devices::DeviceMask;
use crate::models::error::RouteError;
use crate::models::usecase::{ClassSet, StreamId, Usecase, UsecaseId};

/// Ordered collection of active usecases, at most one per id.
///
/// Only ever touched with the device lock held. Routes of a usecase must
/// be disabled by the caller before it is destroyed.
#[derive(Debug, Default, Clone)]
pub struct UsecaseRegistry {
    usecases: Vec<Usecase>,
}

impl UsecaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        id: UsecaseId,
        stream: StreamId,
        devices: DeviceMask,
    ) -> Result<&mut Usecase, RouteError> {
        self.insert(Usecase::new(id, stream, devices))
    }

    /// Appends a prepared usecase. Its routes must still be empty.
    pub fn insert(&mut self, usecase: Usecase) -> Result<&mut Usecase, RouteError> {
        if self.contains(usecase.id) {
            return Err(RouteError::UsecaseExists(usecase.id));
        }
        log::debug!("Creating usecase {} for {}", usecase.id, usecase.stream);
        self.usecases.push(usecase);
        let last = self.usecases.len() - 1;
        Ok(&mut self.usecases[last])
    }

    pub fn destroy(&mut self, id: UsecaseId) -> Result<Usecase, RouteError> {
        let index = self
            .usecases
            .iter()
            .position(|uc| uc.id == id)
            .ok_or(RouteError::UnknownUsecase(id))?;
        log::debug!("Destroying usecase {}", id);
        Ok(self.usecases.remove(index))
    }

    pub fn contains(&self, id: UsecaseId) -> bool {
        self.find_by_id(id).is_some()
    }

    pub fn find_by_id(&self, id: UsecaseId) -> Option<&Usecase> {
        self.usecases.iter().find(|uc| uc.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: UsecaseId) -> Option<&mut Usecase> {
        self.usecases.iter_mut().find(|uc| uc.id == id)
    }

    /// First usecase, in creation order, whose class is in `classes`.
    pub fn find_by_class(&self, classes: ClassSet) -> Option<&Usecase> {
        self.usecases.iter().find(|uc| classes.contains(uc.class))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Usecase> {
        self.usecases.iter()
    }

    pub fn ids(&self) -> Vec<UsecaseId> {
        self.usecases.iter().map(|uc| uc.id).collect()
    }

    pub fn len(&self) -> usize {
        self.usecases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usecases.is_empty()
    }
}
