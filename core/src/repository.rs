//! Typed repositories over the REST resources.
//!
//! Each resource maps one-to-one to `GET {path}?q=` and `POST {path}`. The
//! split `build_*` / `parse_*` forms serve hosts that run their own I/O.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{ClassEntity, CreateClass, CreateSchool, School};

/// A REST collection the client knows how to list and create.
pub trait Resource {
    const PATH: &'static str;
    type Entity: DeserializeOwned;
    type Create: Serialize;
}

#[derive(Debug, Clone, Copy)]
pub struct Schools;

impl Resource for Schools {
    const PATH: &'static str = "/schools";
    type Entity = School;
    type Create = CreateSchool;
}

#[derive(Debug, Clone, Copy)]
pub struct Classes;

impl Resource for Classes {
    const PATH: &'static str = "/classes";
    type Entity = ClassEntity;
    type Create = CreateClass;
}

pub struct Repository<R> {
    client: ApiClient,
    _resource: PhantomData<R>,
}

pub type SchoolRepository = Repository<Schools>;
pub type ClassRepository = Repository<Classes>;

impl<R: Resource> Repository<R> {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Only a non-empty search adds the `q` parameter.
    pub fn build_list(&self, search: &str) -> Result<HttpRequest> {
        if search.is_empty() {
            self.client.build_get(R::PATH, &[])
        } else {
            self.client.build_get(R::PATH, &[("q", search)])
        }
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<R::Entity>> {
        self.client.parse_json(response)
    }

    pub fn build_create(&self, input: &R::Create) -> Result<HttpRequest> {
        self.client.build_post(R::PATH, input)
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<R::Entity> {
        self.client.parse_json(response)
    }

    pub fn list<X: Transport + ?Sized>(&self, transport: &X, search: &str) -> Result<Vec<R::Entity>> {
        if search.is_empty() {
            self.client.get(transport, R::PATH, &[])
        } else {
            self.client.get(transport, R::PATH, &[("q", search)])
        }
    }

    pub fn create<X: Transport + ?Sized>(&self, transport: &X, input: &R::Create) -> Result<R::Entity> {
        self.client.post(transport, R::PATH, input)
    }
}

// Manual impls: the derive would demand `R: Clone` / `R: Debug`.
impl<R> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> fmt::Debug for Repository<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("path", &R::PATH)
            .field("client", &self.client)
            .finish()
    }
}

/// Both repositories over one base URL.
#[derive(Debug, Clone)]
pub struct RosterApi {
    pub schools: SchoolRepository,
    pub classes: ClassRepository,
}

impl RosterApi {
    pub fn new(client: ApiClient) -> Self {
        Self {
            schools: Repository::new(client.clone()),
            classes: Repository::new(client),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(ApiClient::from_config(config))
    }
}
