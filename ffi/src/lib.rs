//! C-ABI wrapper around `roster-core`.
//!
//! # Overview
//! Exposes the school/class roster through `extern "C"` functions so a native
//! host (the mobile shell) can keep the local store in Rust while doing all
//! network I/O itself.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Network operations are split: `roster_build_*` returns an
//!   `FfiHttpRequest`, the host executes it, then `roster_apply_*` parses the
//!   response and folds it into the store.
//! - Local mutations (`roster_update_*`, `roster_delete_*`) take ids as C
//!   strings and partial updates as JSON; an id that is not loaded yields
//!   `NotFoundLocal` with the store untouched.
//! - A single `FfiRosterResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must release them with
//!   `roster_free_result` / `roster_free`.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use roster_core::usecase;
use roster_core::{
    ApiClient, ClassEntity, ClassUpdate, CreateClass, CreateSchool, EntityId, HttpResponse,
    RosterApi, RosterStore, School, SchoolUpdate,
};
use serde::de::DeserializeOwned;

use types::*;

/// `Err` carries a failure envelope that is already built.
type Outcome = Result<*mut FfiRosterResult, *mut FfiRosterResult>;

fn guarded(name: &str, f: impl FnOnce() -> Outcome) -> *mut FfiRosterResult {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(result)) | Ok(Err(result)) => result,
        Err(_) => FfiRosterResult::panic(&format!("panic in {name}")),
    }
}

fn roster_ref<'a>(roster: *const FfiRoster) -> Result<&'a FfiRoster, *mut FfiRosterResult> {
    unsafe { roster.as_ref() }.ok_or_else(|| FfiRosterResult::null_arg("roster"))
}

fn roster_mut<'a>(roster: *mut FfiRoster) -> Result<&'a mut FfiRoster, *mut FfiRosterResult> {
    unsafe { roster.as_mut() }.ok_or_else(|| FfiRosterResult::null_arg("roster"))
}

/// Borrow a required C string argument as UTF-8.
fn str_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, *mut FfiRosterResult> {
    if ptr.is_null() {
        return Err(FfiRosterResult::null_arg(name));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| FfiRosterResult::invalid_input(format!("{name} is not valid UTF-8")))
}

fn json_arg<T: DeserializeOwned>(ptr: *const c_char, name: &str) -> Result<T, *mut FfiRosterResult> {
    let raw = str_arg(ptr, name)?;
    serde_json::from_str(raw).map_err(|e| FfiRosterResult::invalid_input(format!("{name}: {e}")))
}

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body reads
/// as empty.
fn response_arg(response: *const FfiHttpResponse) -> Result<HttpResponse, *mut FfiRosterResult> {
    let resp = unsafe { response.as_ref() }.ok_or_else(|| FfiRosterResult::null_arg("response"))?;
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }.to_string_lossy().into_owned()
    };
    Ok(HttpResponse::new(resp.status, body))
}

/// Null or empty means no filter.
fn query_arg<'a>(query: *const c_char) -> Result<&'a str, *mut FfiRosterResult> {
    if query.is_null() {
        Ok("")
    } else {
        str_arg(query, "query")
    }
}

// ---------------------------------------------------------------------------
// Handle lifecycle
// ---------------------------------------------------------------------------

/// Create a roster handle bound to `base_url` with an empty store.
///
/// Returns null if `base_url` is null, not UTF-8, or if an internal panic
/// occurs. The caller must free the returned pointer with `roster_free`.
#[unsafe(no_mangle)]
pub extern "C" fn roster_new(base_url: *const c_char) -> *mut FfiRoster {
    catch_unwind(|| {
        if base_url.is_null() {
            return std::ptr::null_mut();
        }
        let Ok(url) = unsafe { CStr::from_ptr(base_url) }.to_str() else {
            return std::ptr::null_mut();
        };
        Box::into_raw(Box::new(FfiRoster {
            api: RosterApi::new(ApiClient::new(url)),
            store: RosterStore::new(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a handle created by `roster_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn roster_free(roster: *mut FfiRoster) {
    if !roster.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(roster) });
        });
    }
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Build `GET /schools`, with `?q=` when `query` is non-null and non-empty.
///
/// Returns a result with `data_tag = Request` on success.
#[unsafe(no_mangle)]
pub extern "C" fn roster_build_fetch_schools(
    roster: *const FfiRoster,
    query: *const c_char,
) -> *mut FfiRosterResult {
    guarded("roster_build_fetch_schools", || {
        let roster = roster_ref(roster)?;
        let query = query_arg(query)?;
        Ok(match roster.api.schools.build_list(query) {
            Ok(req) => FfiRosterResult::ok_request(req),
            Err(e) => FfiRosterResult::from_error(e),
        })
    })
}

/// Parse a `GET /schools` response and replace the school list with it.
///
/// On failure the store is left as it was.
#[unsafe(no_mangle)]
pub extern "C" fn roster_apply_fetch_schools(
    roster: *mut FfiRoster,
    response: *const FfiHttpResponse,
) -> *mut FfiRosterResult {
    guarded("roster_apply_fetch_schools", || {
        let roster = roster_mut(roster)?;
        let response = response_arg(response)?;
        Ok(match roster.api.schools.parse_list(response) {
            Ok(schools) => {
                roster.store.replace_schools(schools);
                FfiRosterResult::ok_empty()
            }
            Err(e) => FfiRosterResult::from_error(e),
        })
    })
}

/// Build `GET /classes`, with `?q=` when `query` is non-null and non-empty.
#[unsafe(no_mangle)]
pub extern "C" fn roster_build_fetch_classes(
    roster: *const FfiRoster,
    query: *const c_char,
) -> *mut FfiRosterResult {
    guarded("roster_build_fetch_classes", || {
        let roster = roster_ref(roster)?;
        let query = query_arg(query)?;
        Ok(match roster.api.classes.build_list(query) {
            Ok(req) => FfiRosterResult::ok_request(req),
            Err(e) => FfiRosterResult::from_error(e),
        })
    })
}

/// Parse a `GET /classes` response and replace the class list with it.
#[unsafe(no_mangle)]
pub extern "C" fn roster_apply_fetch_classes(
    roster: *mut FfiRoster,
    response: *const FfiHttpResponse,
) -> *mut FfiRosterResult {
    guarded("roster_apply_fetch_classes", || {
        let roster = roster_mut(roster)?;
        let response = response_arg(response)?;
        Ok(match roster.api.classes.parse_list(response) {
            Ok(classes) => {
                roster.store.replace_classes(classes);
                FfiRosterResult::ok_empty()
            }
            Err(e) => FfiRosterResult::from_error(e),
        })
    })
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Validate `input_json` (a `CreateSchool`) and build `POST /schools`.
///
/// A blank name yields `Validation` and no request.
#[unsafe(no_mangle)]
pub extern "C" fn roster_build_add_school(
    roster: *const FfiRoster,
    input_json: *const c_char,
) -> *mut FfiRosterResult {
    guarded("roster_build_add_school", || {
        let roster = roster_ref(roster)?;
        let input: CreateSchool = json_arg(input_json, "input_json")?;
        Ok(match usecase::prepare_create_school(&roster.api.schools, &input) {
            Ok(req) => FfiRosterResult::ok_request(req),
            Err(e) => FfiRosterResult::from_error(e),
        })
    })
}

/// Parse a `POST /schools` response and prepend the created school.
///
/// Returns the created school as JSON (`data_tag = Json`).
#[unsafe(no_mangle)]
pub extern "C" fn roster_apply_add_school(
    roster: *mut FfiRoster,
    response: *const FfiHttpResponse,
) -> *mut FfiRosterResult {
    guarded("roster_apply_add_school", || {
        let roster = roster_mut(roster)?;
        let response = response_arg(response)?;
        Ok(match roster.api.schools.parse_create(response) {
            Ok(school) => {
                let result = FfiRosterResult::ok_json(&school);
                roster.store.insert_school(school);
                result
            }
            Err(e) => FfiRosterResult::from_error(e),
        })
    })
}

/// Validate `input_json` (a `CreateClass`) and build `POST /classes`.
#[unsafe(no_mangle)]
pub extern "C" fn roster_build_add_class(
    roster: *const FfiRoster,
    input_json: *const c_char,
) -> *mut FfiRosterResult {
    guarded("roster_build_add_class", || {
        let roster = roster_ref(roster)?;
        let input: CreateClass = json_arg(input_json, "input_json")?;
        Ok(match usecase::prepare_create_class(&roster.api.classes, &input) {
            Ok(req) => FfiRosterResult::ok_request(req),
            Err(e) => FfiRosterResult::from_error(e),
        })
    })
}

/// Parse a `POST /classes` response, prepend the created class and link it
/// into its school when that school is loaded.
#[unsafe(no_mangle)]
pub extern "C" fn roster_apply_add_class(
    roster: *mut FfiRoster,
    response: *const FfiHttpResponse,
) -> *mut FfiRosterResult {
    guarded("roster_apply_add_class", || {
        let roster = roster_mut(roster)?;
        let response = response_arg(response)?;
        Ok(match roster.api.classes.parse_create(response) {
            Ok(class) => {
                let result = FfiRosterResult::ok_json(&class);
                roster.store.insert_class(class);
                result
            }
            Err(e) => FfiRosterResult::from_error(e),
        })
    })
}

// ---------------------------------------------------------------------------
// Local mutations
// ---------------------------------------------------------------------------

/// Merge `updates_json` (a `SchoolUpdate`) into school `id`.
#[unsafe(no_mangle)]
pub extern "C" fn roster_update_school(
    roster: *mut FfiRoster,
    id: *const c_char,
    updates_json: *const c_char,
) -> *mut FfiRosterResult {
    guarded("roster_update_school", || {
        let roster = roster_mut(roster)?;
        let id = EntityId::new(str_arg(id, "id")?);
        let updates: SchoolUpdate = json_arg(updates_json, "updates_json")?;
        Ok(if roster.store.update_school(&id, &updates) {
            FfiRosterResult::ok_empty()
        } else {
            FfiRosterResult::not_found("school", id.as_str())
        })
    })
}

/// Merge `updates_json` (a `ClassUpdate`) into class `id`. A present
/// `schoolId` moves the class between school link lists.
#[unsafe(no_mangle)]
pub extern "C" fn roster_update_class(
    roster: *mut FfiRoster,
    id: *const c_char,
    updates_json: *const c_char,
) -> *mut FfiRosterResult {
    guarded("roster_update_class", || {
        let roster = roster_mut(roster)?;
        let id = EntityId::new(str_arg(id, "id")?);
        let updates: ClassUpdate = json_arg(updates_json, "updates_json")?;
        Ok(if roster.store.update_class(&id, &updates) {
            FfiRosterResult::ok_empty()
        } else {
            FfiRosterResult::not_found("class", id.as_str())
        })
    })
}

/// Remove school `id` and every class that belongs to it.
#[unsafe(no_mangle)]
pub extern "C" fn roster_delete_school(roster: *mut FfiRoster, id: *const c_char) -> *mut FfiRosterResult {
    guarded("roster_delete_school", || {
        let roster = roster_mut(roster)?;
        let id = EntityId::new(str_arg(id, "id")?);
        Ok(if roster.store.delete_school(&id) {
            FfiRosterResult::ok_empty()
        } else {
            FfiRosterResult::not_found("school", id.as_str())
        })
    })
}

/// Remove class `id` and strip it from every school's `classIds`.
#[unsafe(no_mangle)]
pub extern "C" fn roster_delete_class(roster: *mut FfiRoster, id: *const c_char) -> *mut FfiRosterResult {
    guarded("roster_delete_class", || {
        let roster = roster_mut(roster)?;
        let id = EntityId::new(str_arg(id, "id")?);
        Ok(if roster.store.delete_class(&id) {
            FfiRosterResult::ok_empty()
        } else {
            FfiRosterResult::not_found("class", id.as_str())
        })
    })
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Current school list as a JSON array, most recent first.
#[unsafe(no_mangle)]
pub extern "C" fn roster_schools_json(roster: *const FfiRoster) -> *mut FfiRosterResult {
    guarded("roster_schools_json", || {
        let roster = roster_ref(roster)?;
        Ok(FfiRosterResult::ok_json::<[School]>(roster.store.schools()))
    })
}

/// Current class list as a JSON array, most recent first.
#[unsafe(no_mangle)]
pub extern "C" fn roster_classes_json(roster: *const FfiRoster) -> *mut FfiRosterResult {
    guarded("roster_classes_json", || {
        let roster = roster_ref(roster)?;
        Ok(FfiRosterResult::ok_json::<[ClassEntity]>(roster.store.classes()))
    })
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiRosterResult` returned by any `roster_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn roster_free_result(result: *mut FfiRosterResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        unsafe { free_c_string(result.message) };
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Request => unsafe { FfiHttpRequest::free(result.data as *mut FfiHttpRequest) },
            FfiDataTag::Json => unsafe { free_c_string(result.data as *mut c_char) },
            FfiDataTag::None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
