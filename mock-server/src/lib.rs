use std::{fmt, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

/// Identifier as sent by clients: the roster API accepts numbers or strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(u64),
    Text(String),
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireId::Number(n) => write!(f, "{n}"),
            WireId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub class_ids: Vec<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: u64,
    pub name: String,
    pub school_id: Option<WireId>,
    pub school_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ano_letivo: Option<u16>,
}

#[derive(Deserialize)]
pub struct CreateSchool {
    pub name: String,
    #[serde(default, alias = "city")]
    pub address: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClass {
    pub name: String,
    #[serde(default)]
    pub school_id: Option<WireId>,
    #[serde(default)]
    pub turno: Option<String>,
    #[serde(default)]
    pub ano_letivo: Option<u16>,
}

#[derive(Deserialize)]
pub struct Search {
    pub q: Option<String>,
}

/// Backing data. Collections are kept most-recent-first.
#[derive(Clone, Debug)]
pub struct Roster {
    pub schools: Vec<School>,
    pub classes: Vec<Class>,
    next_school_id: u64,
    next_class_id: u64,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl Roster {
    pub fn new(schools: Vec<School>, classes: Vec<Class>) -> Self {
        let next_school_id = schools.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let next_class_id = classes.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        Self {
            schools,
            classes,
            next_school_id,
            next_class_id,
        }
    }

    /// Two schools with one class each.
    pub fn seeded() -> Self {
        let schools = vec![
            School {
                id: 1,
                name: "Escola Alfa".to_string(),
                address: Some("São Paulo".to_string()),
                class_ids: vec![1],
            },
            School {
                id: 2,
                name: "Escola Beta".to_string(),
                address: Some("Rio de Janeiro".to_string()),
                class_ids: vec![2],
            },
        ];
        let classes = vec![
            Class {
                id: 1,
                name: "Turma 1A".to_string(),
                school_id: Some(WireId::Number(1)),
                school_name: Some("Escola Alfa".to_string()),
                turno: Some("Manhã".to_string()),
                ano_letivo: Some(2025),
            },
            Class {
                id: 2,
                name: "Turma 2B".to_string(),
                school_id: Some(WireId::Number(2)),
                school_name: Some("Escola Beta".to_string()),
                turno: Some("Tarde".to_string()),
                ano_letivo: Some(2025),
            },
        ];
        Self::new(schools, classes)
    }
}

pub type Db = Arc<RwLock<Roster>>;

pub fn app() -> Router {
    app_with(Roster::seeded())
}

pub fn app_with(roster: Roster) -> Router {
    let db: Db = Arc::new(RwLock::new(roster));
    Router::new()
        .route("/schools", get(list_schools).post(create_school))
        .route("/classes", get(list_classes).post(create_class))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn name_matches(name: &str, search: &Search) -> bool {
    match search.q.as_deref() {
        Some(q) if !q.is_empty() => name.to_lowercase().contains(&q.to_lowercase()),
        _ => true,
    }
}

async fn list_schools(State(db): State<Db>, Query(search): Query<Search>) -> Json<Vec<School>> {
    let roster = db.read().await;
    Json(
        roster
            .schools
            .iter()
            .filter(|s| name_matches(&s.name, &search))
            .cloned()
            .collect(),
    )
}

async fn create_school(
    State(db): State<Db>,
    Json(input): Json<CreateSchool>,
) -> (StatusCode, Json<School>) {
    let mut roster = db.write().await;
    let school = School {
        id: roster.next_school_id,
        name: input.name,
        address: input.address,
        class_ids: Vec::new(),
    };
    roster.next_school_id += 1;
    roster.schools.insert(0, school.clone());
    info!(id = school.id, name = %school.name, "school created");
    (StatusCode::CREATED, Json(school))
}

async fn list_classes(State(db): State<Db>, Query(search): Query<Search>) -> Json<Vec<Class>> {
    let roster = db.read().await;
    Json(
        roster
            .classes
            .iter()
            .filter(|c| name_matches(&c.name, &search))
            .cloned()
            .collect(),
    )
}

async fn create_class(
    State(db): State<Db>,
    Json(input): Json<CreateClass>,
) -> (StatusCode, Json<Class>) {
    let mut roster = db.write().await;
    let id = roster.next_class_id;
    roster.next_class_id += 1;

    let owner = input.school_id.as_ref().map(ToString::to_string);
    let school = roster
        .schools
        .iter_mut()
        .find(|s| owner.as_deref() == Some(s.id.to_string().as_str()));
    let school_name = school.map(|s| {
        s.class_ids.push(id);
        s.name.clone()
    });

    let class = Class {
        id,
        name: input.name,
        school_id: input.school_id,
        school_name,
        turno: input.turno,
        ano_letivo: input.ano_letivo,
    };
    roster.classes.insert(0, class.clone());
    info!(id, name = %class.name, "class created");
    (StatusCode::CREATED, Json(class))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_serializes_camel_case() {
        let class = Roster::seeded().classes[0].clone();
        let json = serde_json::to_value(&class).unwrap();
        assert_eq!(json["schoolId"], 1);
        assert_eq!(json["schoolName"], "Escola Alfa");
        assert_eq!(json["anoLetivo"], 2025);
    }

    #[test]
    fn create_school_accepts_city() {
        let input: CreateSchool =
            serde_json::from_str(r#"{"name":"Escola Gama","city":"Recife"}"#).unwrap();
        assert_eq!(input.address.as_deref(), Some("Recife"));
    }

    #[test]
    fn create_school_rejects_missing_name() {
        let result: Result<CreateSchool, _> = serde_json::from_str(r#"{"address":"Recife"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn create_class_accepts_string_school_id() {
        let input: CreateClass =
            serde_json::from_str(r#"{"name":"Turma 3C","schoolId":"2"}"#).unwrap();
        assert_eq!(input.school_id, Some(WireId::Text("2".to_string())));
        assert_eq!(input.school_id.unwrap().to_string(), "2");
    }

    #[test]
    fn search_is_case_insensitive() {
        let search = Search {
            q: Some("ALFA".to_string()),
        };
        assert!(name_matches("Escola Alfa", &search));
        assert!(!name_matches("Escola Beta", &search));
        assert!(name_matches("anything", &Search { q: None }));
    }

    #[test]
    fn ids_continue_after_seed() {
        let roster = Roster::seeded();
        assert_eq!(roster.next_school_id, 3);
        assert_eq!(roster.next_class_id, 3);
    }
}
