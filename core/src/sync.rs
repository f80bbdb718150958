//! Remote-backed roster synchronizer.
//!
//! # Design
//! `RosterSync` owns a [`RosterApi`], a [`Transport`] and a [`RosterStore`].
//! Fetches and creates make one blocking round trip and then fold the response
//! into the store; updates and deletes are local only. A failed round trip
//! returns the error and leaves the store as it was.
//!
//! Overlapping fetches are not sequenced: whichever response is applied last
//! determines the collection.

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::repository::RosterApi;
use crate::store::RosterStore;
use crate::transport::Transport;
use crate::types::{ClassEntity, ClassUpdate, CreateClass, CreateSchool, EntityId, School, SchoolUpdate};
use crate::usecase;

#[derive(Debug)]
pub struct RosterSync<T> {
    api: RosterApi,
    transport: T,
    store: RosterStore,
}

impl<T: Transport> RosterSync<T> {
    pub fn new(api: RosterApi, transport: T) -> Self {
        Self {
            api,
            transport,
            store: RosterStore::new(),
        }
    }

    pub fn from_config(config: &ClientConfig, transport: T) -> Self {
        Self::new(RosterApi::from_config(config), transport)
    }

    pub fn store(&self) -> &RosterStore {
        &self.store
    }

    pub fn schools(&self) -> &[School] {
        self.store.schools()
    }

    pub fn classes(&self) -> &[ClassEntity] {
        self.store.classes()
    }

    pub fn into_store(self) -> RosterStore {
        self.store
    }

    /// Replace the schools with the remote list, filtered by `query` when given.
    pub fn fetch_schools(&mut self, query: Option<&str>) -> Result<()> {
        let search = query.unwrap_or_default();
        debug!(search, "fetching schools");
        let schools = usecase::load_schools(&self.api.schools, &self.transport, search)?;
        self.store.replace_schools(schools);
        Ok(())
    }

    /// Replace the classes with the remote list, filtered by `query` when given.
    pub fn fetch_classes(&mut self, query: Option<&str>) -> Result<()> {
        let search = query.unwrap_or_default();
        debug!(search, "fetching classes");
        let classes = usecase::load_classes(&self.api.classes, &self.transport, search)?;
        self.store.replace_classes(classes);
        Ok(())
    }

    /// Unfiltered load of both collections.
    pub fn refresh(&mut self) -> Result<()> {
        self.fetch_schools(None)?;
        self.fetch_classes(None)
    }

    pub fn add_school(&mut self, input: &CreateSchool) -> Result<School> {
        let created = usecase::create_school(&self.api.schools, &self.transport, input)?;
        self.store.insert_school(created.clone());
        Ok(created)
    }

    pub fn add_class(&mut self, input: &CreateClass) -> Result<ClassEntity> {
        let created = usecase::create_class(&self.api.classes, &self.transport, input)?;
        self.store.insert_class(created.clone());
        Ok(created)
    }

    pub fn update_school(&mut self, id: &EntityId, updates: &SchoolUpdate) -> bool {
        self.store.update_school(id, updates)
    }

    pub fn update_class(&mut self, id: &EntityId, updates: &ClassUpdate) -> bool {
        self.store.update_class(id, updates)
    }

    pub fn delete_school(&mut self, id: &EntityId) -> bool {
        self.store.delete_school(id)
    }

    pub fn delete_class(&mut self, id: &EntityId) -> bool {
        self.store.delete_class(id)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::client::ApiClient;
    use crate::error::RosterError;
    use crate::http::{HttpRequest, HttpResponse};

    /// Replays queued responses in order and records every request.
    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<HttpResponse>>,
        requests: RefCell<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn reply(self, status: u16, body: &str) -> Self {
            self.responses.borrow_mut().push_back(HttpResponse::new(status, body));
            self
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| RosterError::Transport("no scripted response".to_string()))
        }
    }

    fn sync(transport: Scripted) -> RosterSync<Scripted> {
        RosterSync::new(RosterApi::new(ApiClient::new("http://localhost:3000")), transport)
    }

    const SCHOOLS: &str = r#"[{"id":1,"name":"Escola Alfa","classIds":[1]},{"id":2,"name":"Escola Beta"}]"#;
    const CLASSES: &str = r#"[{"id":1,"name":"Turma 1A","schoolId":1}]"#;

    #[test]
    fn refresh_loads_both_collections() {
        let mut s = sync(Scripted::default().reply(200, SCHOOLS).reply(200, CLASSES));
        s.refresh().unwrap();
        assert_eq!(s.schools().len(), 2);
        assert!(s.schools()[1].class_ids.is_empty());
        assert_eq!(s.classes().len(), 1);
        assert!(s.store().is_consistent());

        let requests = s.transport.requests.borrow();
        assert_eq!(requests[0].url, "http://localhost:3000/schools");
        assert_eq!(requests[1].url, "http://localhost:3000/classes");
    }

    #[test]
    fn fetch_with_query_sends_q() {
        let mut s = sync(Scripted::default().reply(200, "[]"));
        s.fetch_schools(Some("alfa")).unwrap();
        assert_eq!(
            s.transport.requests.borrow()[0].url,
            "http://localhost:3000/schools?q=alfa"
        );
        assert!(s.schools().is_empty());
    }

    #[test]
    fn failed_fetch_keeps_previous_state() {
        let mut s = sync(Scripted::default().reply(200, SCHOOLS).reply(500, "boom"));
        s.fetch_schools(None).unwrap();
        let err = s.fetch_schools(None).unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(s.schools().len(), 2);
    }

    #[test]
    fn add_class_links_owning_school() {
        let mut s = sync(
            Scripted::default()
                .reply(200, SCHOOLS)
                .reply(200, CLASSES)
                .reply(201, r#"{"id":3,"name":"Turma 3C","schoolId":2}"#),
        );
        s.refresh().unwrap();
        let input = CreateClass {
            name: "Turma 3C".to_string(),
            school_id: Some(EntityId::from(2u64)),
            ..Default::default()
        };
        let created = s.add_class(&input).unwrap();
        assert_eq!(created.school_id, Some(EntityId::from(2u64)));
        assert_eq!(s.classes()[0].id, EntityId::from(3u64));
        assert_eq!(s.schools()[1].class_ids, vec![EntityId::from(3u64)]);
        assert!(s.store().is_consistent());
    }

    #[test]
    fn invalid_add_school_sends_nothing() {
        let mut s = sync(Scripted::default());
        let err = s.add_school(&CreateSchool::default()).unwrap_err();
        assert!(matches!(err, RosterError::Validation { .. }));
        assert!(s.transport.requests.borrow().is_empty());
        assert!(s.schools().is_empty());
    }

    #[test]
    fn rejected_create_leaves_store_untouched() {
        let mut s = sync(Scripted::default().reply(200, SCHOOLS).reply(422, "bad"));
        s.fetch_schools(None).unwrap();
        let before = s.store().clone();
        let input = CreateSchool {
            name: "Escola Gama".to_string(),
            address: None,
        };
        assert!(s.add_school(&input).is_err());
        assert_eq!(s.store(), &before);
    }

    #[test]
    fn into_store_hands_back_loaded_state() {
        let mut s = sync(Scripted::default().reply(200, SCHOOLS).reply(200, CLASSES));
        s.refresh().unwrap();
        let expected = s.store().clone();
        let store = s.into_store();
        assert_eq!(store, expected);
        assert_eq!(store.classes_of(&EntityId::from(1u64)).count(), 1);
    }
}
