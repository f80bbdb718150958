//! In-memory roster state.
//!
//! # Design
//! `RosterStore` owns the school and class collections and every mutation that
//! could break the link between them: for each school `S` and class `C` held
//! in memory, `C.id ∈ S.class_ids` exactly when `C.school_id == S.id`, and no
//! id appears twice in one `class_ids`. The store performs no I/O; network
//! results are folded in through `replace_*` and `insert_*`.
//!
//! Updates and deletes naming an id that is not in memory leave the state
//! untouched and return `false`.

use std::fmt;

use tracing::{debug, info};

use crate::types::{ClassEntity, ClassUpdate, EntityId, School, SchoolUpdate};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterStore {
    schools: Vec<School>,
    classes: Vec<ClassEntity>,
}

/// A breach of the school/class link found by [`RosterStore::integrity_violations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// The class points at the school but the school does not list it.
    MissingLink { school: EntityId, class: EntityId },
    /// The school lists the class but the class points elsewhere.
    DanglingLink { school: EntityId, class: EntityId },
    /// The school lists the class more than once.
    DuplicateLink { school: EntityId, class: EntityId },
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLink { school, class } => {
                write!(f, "class {class} points at school {school} but is not listed")
            }
            Self::DanglingLink { school, class } => {
                write!(f, "school {school} lists class {class} which points elsewhere")
            }
            Self::DuplicateLink { school, class } => {
                write!(f, "school {school} lists class {class} more than once")
            }
        }
    }
}

impl RosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schools(&self) -> &[School] {
        &self.schools
    }

    pub fn classes(&self) -> &[ClassEntity] {
        &self.classes
    }

    pub fn school(&self, id: &EntityId) -> Option<&School> {
        self.schools.iter().find(|s| &s.id == id)
    }

    pub fn class(&self, id: &EntityId) -> Option<&ClassEntity> {
        self.classes.iter().find(|c| &c.id == id)
    }

    /// Classes in memory that point at `school_id`, in collection order.
    pub fn classes_of<'a>(&'a self, school_id: &'a EntityId) -> impl Iterator<Item = &'a ClassEntity> + 'a {
        self.classes.iter().filter(move |c| c.belongs_to(school_id))
    }

    /// Replace the school collection with a fetch result.
    pub fn replace_schools(&mut self, schools: Vec<School>) {
        debug!(count = schools.len(), "replacing schools");
        self.schools = schools;
    }

    /// Replace the class collection with a fetch result.
    pub fn replace_classes(&mut self, classes: Vec<ClassEntity>) {
        debug!(count = classes.len(), "replacing classes");
        self.classes = classes;
    }

    /// Fold a freshly created school into the front of the collection.
    pub fn insert_school(&mut self, school: School) {
        info!(id = %school.id, name = %school.name, "school added");
        self.schools.insert(0, school);
    }

    /// Fold a freshly created class into the front of the collection and link
    /// it to its school, if that school is in memory.
    pub fn insert_class(&mut self, class: ClassEntity) {
        info!(id = %class.id, name = %class.name, "class added");
        if let Some(school_id) = &class.school_id {
            if let Some(school) = self.schools.iter_mut().find(|s| &s.id == school_id) {
                if !school.holds(&class.id) {
                    school.class_ids.push(class.id.clone());
                }
            }
        }
        self.classes.insert(0, class);
    }

    /// Merge `updates` into the school with `id`. Classes are not touched.
    pub fn update_school(&mut self, id: &EntityId, updates: &SchoolUpdate) -> bool {
        match self.schools.iter_mut().find(|s| &s.id == id) {
            Some(school) => {
                updates.apply_to(school);
                true
            }
            None => {
                debug!(%id, "update of unknown school ignored");
                false
            }
        }
    }

    /// Merge `updates` into the class with `id`. A new `school_id` moves the
    /// class: every other school drops it, the target school gains it once.
    pub fn update_class(&mut self, id: &EntityId, updates: &ClassUpdate) -> bool {
        let Some(class) = self.classes.iter_mut().find(|c| &c.id == id) else {
            debug!(%id, "update of unknown class ignored");
            return false;
        };
        updates.apply_to(class);

        if let Some(owner) = &updates.school_id {
            for school in &mut self.schools {
                if &school.id == owner {
                    if !school.holds(id) {
                        school.class_ids.push(id.clone());
                    }
                } else {
                    school.class_ids.retain(|cid| cid != id);
                }
            }
        }
        true
    }

    /// Remove the school and every class pointing at it.
    ///
    /// Returns `false` when neither a school nor a class matched.
    pub fn delete_school(&mut self, id: &EntityId) -> bool {
        let schools_before = self.schools.len();
        self.schools.retain(|s| &s.id != id);

        let mut removed = Vec::new();
        self.classes.retain(|c| {
            if c.belongs_to(id) {
                removed.push(c.id.clone());
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            for school in &mut self.schools {
                school.class_ids.retain(|cid| !removed.contains(cid));
            }
        }

        let found = self.schools.len() != schools_before || !removed.is_empty();
        if found {
            info!(%id, cascaded = removed.len(), "school deleted");
        } else {
            debug!(%id, "delete of unknown school ignored");
        }
        found
    }

    /// Remove the class and strip its id from every school.
    ///
    /// Returns `false` when the id was neither a class nor listed by a school.
    pub fn delete_class(&mut self, id: &EntityId) -> bool {
        let classes_before = self.classes.len();
        self.classes.retain(|c| &c.id != id);

        let mut unlinked = false;
        for school in &mut self.schools {
            let before = school.class_ids.len();
            school.class_ids.retain(|cid| cid != id);
            unlinked |= school.class_ids.len() != before;
        }

        let found = self.classes.len() != classes_before || unlinked;
        if found {
            info!(%id, "class deleted");
        } else {
            debug!(%id, "delete of unknown class ignored");
        }
        found
    }

    /// Every breach of the school/class link among entities in memory.
    ///
    /// Ids listed by a school whose class is not loaded (e.g. after a filtered
    /// fetch) are not reported.
    pub fn integrity_violations(&self) -> Vec<IntegrityViolation> {
        let mut violations = Vec::new();
        for school in &self.schools {
            for (i, cid) in school.class_ids.iter().enumerate() {
                if school.class_ids[..i].contains(cid) {
                    violations.push(IntegrityViolation::DuplicateLink {
                        school: school.id.clone(),
                        class: cid.clone(),
                    });
                }
            }
            for class in &self.classes {
                let listed = school.holds(&class.id);
                let owned = class.belongs_to(&school.id);
                if owned && !listed {
                    violations.push(IntegrityViolation::MissingLink {
                        school: school.id.clone(),
                        class: class.id.clone(),
                    });
                } else if listed && !owned {
                    violations.push(IntegrityViolation::DanglingLink {
                        school: school.id.clone(),
                        class: class.id.clone(),
                    });
                }
            }
        }
        violations
    }

    pub fn is_consistent(&self) -> bool {
        self.integrity_violations().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Turno;

    fn id(n: u64) -> EntityId {
        EntityId::from(n)
    }

    fn school(n: u64, name: &str) -> School {
        School {
            id: id(n),
            name: name.to_string(),
            address: None,
            class_ids: Vec::new(),
        }
    }

    fn class(n: u64, name: &str, school_id: Option<u64>) -> ClassEntity {
        ClassEntity {
            id: id(n),
            name: name.to_string(),
            school_id: school_id.map(id),
            turno: None,
            ano_letivo: None,
        }
    }

    /// Two schools, class 1 in school 1, class 2 in school 2.
    fn seeded() -> RosterStore {
        let mut store = RosterStore::new();
        store.replace_schools(vec![school(1, "Escola Alfa"), school(2, "Escola Beta")]);
        store.insert_class(class(2, "Turma 2B", Some(2)));
        store.insert_class(class(1, "Turma 1A", Some(1)));
        assert!(store.is_consistent());
        store
    }

    #[test]
    fn insert_class_links_whole_float_school_id() {
        let mut store = seeded();
        let created: ClassEntity =
            serde_json::from_str(r#"{"id":3,"name":"Turma 3C","schoolId":1.0}"#).unwrap();
        store.insert_class(created);
        assert_eq!(store.school(&id(1)).unwrap().class_ids, vec![id(1), id(3)]);
        assert!(store.is_consistent());
    }

    #[test]
    fn classes_of_follows_school_id() {
        let mut store = seeded();
        store.insert_class(class(3, "Turma 3C", Some(1)));
        store.insert_class(class(4, "Avulsa", None));

        let school = id(1);
        let names: Vec<&str> = store.classes_of(&school).map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Turma 3C", "Turma 1A"]);
        assert_eq!(store.classes_of(&id(2)).count(), 1);
        assert_eq!(store.classes_of(&id(9)).count(), 0);
    }

    #[test]
    fn insert_school_prepends() {
        let mut store = seeded();
        store.insert_school(school(3, "Escola Gama"));
        assert_eq!(store.schools()[0].id, id(3));
        assert_eq!(store.schools().len(), 3);
        assert_eq!(store.classes().len(), 2);
    }

    #[test]
    fn insert_class_links_school_once() {
        let mut store = seeded();
        store.insert_class(class(3, "Turma 3C", Some(1)));
        assert_eq!(store.classes()[0].id, id(3));
        let alfa = store.school(&id(1)).unwrap();
        assert_eq!(alfa.class_ids.iter().filter(|c| **c == id(3)).count(), 1);

        // Already listed locally: still listed once.
        let mut linked = seeded();
        linked.schools[0].class_ids.push(id(3));
        linked.insert_class(class(3, "Turma 3C", Some(1)));
        let alfa = linked.school(&id(1)).unwrap();
        assert_eq!(alfa.class_ids.iter().filter(|c| **c == id(3)).count(), 1);
        assert!(linked.is_consistent());
    }

    #[test]
    fn insert_class_for_unknown_school_links_nothing() {
        let mut store = seeded();
        store.insert_class(class(3, "Turma 3C", Some(99)));
        assert!(store.schools().iter().all(|s| !s.holds(&id(3))));
        assert!(store.is_consistent());
    }

    #[test]
    fn mixed_id_representations_link() {
        let mut store = seeded();
        let mut c = class(3, "Turma 3C", None);
        c.school_id = Some(serde_json::from_str(r#""1""#).unwrap());
        store.insert_class(c);
        assert!(store.school(&id(1)).unwrap().holds(&id(3)));
    }

    #[test]
    fn update_school_merges_fields_only() {
        let mut store = seeded();
        let updates = SchoolUpdate {
            name: Some("Escola Alfa II".to_string()),
            address: Some("Campinas".to_string()),
        };
        assert!(store.update_school(&id(1), &updates));
        let alfa = store.school(&id(1)).unwrap();
        assert_eq!(alfa.name, "Escola Alfa II");
        assert_eq!(alfa.address.as_deref(), Some("Campinas"));
        assert_eq!(alfa.class_ids, vec![id(1)]);
    }

    #[test]
    fn update_class_moves_between_schools() {
        let mut store = seeded();
        let updates = ClassUpdate {
            school_id: Some(id(2)),
            ..Default::default()
        };
        assert!(store.update_class(&id(1), &updates));
        assert!(!store.school(&id(1)).unwrap().holds(&id(1)));
        let beta = store.school(&id(2)).unwrap();
        assert_eq!(beta.class_ids.iter().filter(|c| **c == id(1)).count(), 1);
        assert_eq!(store.class(&id(1)).unwrap().school_id, Some(id(2)));
        assert!(store.is_consistent());
    }

    #[test]
    fn update_class_with_same_school_is_idempotent() {
        let mut store = seeded();
        let before = store.clone();
        let updates = ClassUpdate {
            school_id: Some(id(1)),
            ..Default::default()
        };
        assert!(store.update_class(&id(1), &updates));
        assert!(store.update_class(&id(1), &updates));
        assert_eq!(store, before);
    }

    #[test]
    fn update_class_without_school_leaves_links() {
        let mut store = seeded();
        let updates = ClassUpdate {
            name: Some("Turma 1A Noturna".to_string()),
            turno: Some(Turno::Evening),
            ..Default::default()
        };
        assert!(store.update_class(&id(1), &updates));
        assert_eq!(store.schools(), seeded().schools());
        assert_eq!(store.class(&id(1)).unwrap().turno, Some(Turno::Evening));
    }

    #[test]
    fn update_unknown_class_changes_nothing() {
        let mut store = seeded();
        let before = store.clone();
        let updates = ClassUpdate {
            school_id: Some(id(1)),
            ..Default::default()
        };
        assert!(!store.update_class(&id(42), &updates));
        assert!(!store.update_school(&id(42), &SchoolUpdate::default()));
        assert_eq!(store, before);
    }

    #[test]
    fn delete_school_cascades_to_classes() {
        let mut store = seeded();
        store.insert_class(class(3, "Turma 3C", Some(1)));
        assert!(store.delete_school(&id(1)));
        assert!(store.school(&id(1)).is_none());
        assert!(store.classes().iter().all(|c| !c.belongs_to(&id(1))));
        assert_eq!(store.classes().len(), 1);
        assert!(store.is_consistent());
    }

    #[test]
    fn delete_class_unlinks_everywhere() {
        let mut store = seeded();
        // A stray listing in the wrong school is stripped as well.
        store.schools[1].class_ids.push(id(1));
        assert!(store.delete_class(&id(1)));
        assert!(store.class(&id(1)).is_none());
        assert!(store.schools().iter().all(|s| !s.holds(&id(1))));
    }

    #[test]
    fn delete_unknown_ids_return_false() {
        let mut store = seeded();
        let before = store.clone();
        assert!(!store.delete_school(&id(42)));
        assert!(!store.delete_class(&id(42)));
        assert_eq!(store, before);
    }

    #[test]
    fn violations_are_reported() {
        let mut store = RosterStore::new();
        let mut alfa = school(1, "Escola Alfa");
        alfa.class_ids = vec![id(2), id(2)];
        store.replace_schools(vec![alfa]);
        store.replace_classes(vec![class(1, "Turma 1A", Some(1)), class(2, "Turma 2B", Some(9))]);

        let violations = store.integrity_violations();
        assert!(violations.contains(&IntegrityViolation::MissingLink { school: id(1), class: id(1) }));
        assert!(violations.contains(&IntegrityViolation::DanglingLink { school: id(1), class: id(2) }));
        assert!(violations.contains(&IntegrityViolation::DuplicateLink { school: id(1), class: id(2) }));
    }

    #[test]
    fn unloaded_class_ids_are_not_violations() {
        let mut store = seeded();
        store.replace_classes(vec![class(1, "Turma 1A", Some(1))]);
        assert!(store.school(&id(2)).unwrap().holds(&id(2)));
        assert!(store.is_consistent());
    }
}
