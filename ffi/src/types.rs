//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Requests and responses mirror the core types with C-compatible
//! representations: `*mut c_char` instead of `String`, raw pointers instead of
//! `Vec`, and tagged enums with explicit discriminants. Entities cross the
//! boundary as JSON text in the same camelCase shape the REST API uses, so the
//! host decodes them with whatever JSON library it already has.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use roster_core::{HttpMethod, HttpRequest, RosterApi, RosterError, RosterStore};
use serde::Serialize;

/// Opaque handle to the API description and the local store. C callers
/// receive a pointer to this and pass it back into every FFI function.
pub struct FfiRoster {
    pub(crate) api: RosterApi,
    pub(crate) store: RosterStore,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Returned inside an `FfiRosterResult` by the `roster_build_*` functions.
/// The host executes it and hands the response to the matching
/// `roster_apply_*` function.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let url = into_c_string(req.url);
        let body = match req.body {
            Some(b) => into_c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: into_c_string(k),
                    value: into_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
            body,
        }))
    }

    /// Release a request produced by `from_core`.
    ///
    /// # Safety
    /// `req` must come from `from_core` and not have been freed already.
    pub(crate) unsafe fn free(req: *mut Self) {
        if req.is_null() {
            return;
        }
        let req = unsafe { Box::from_raw(req) };
        unsafe {
            free_c_string(req.url);
            free_c_string(req.body);
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                unsafe {
                    free_c_string(h.key);
                    free_c_string(h.value);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The host constructs this on its own stack after executing a request and
/// passes a pointer to a `roster_apply_*` function. The FFI layer reads but
/// does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiRosterResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Validation = 1,
    Http = 2,
    Transport = 3,
    InvalidUrl = 4,
    Serialization = 5,
    Deserialization = 6,
    Config = 7,
    InvalidInput = 8,
    NotFoundLocal = 9,
    Panic = 10,
    NullArg = 11,
}

/// Tag that tells `roster_free_result` what `FfiRosterResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Request = 1,
    Json = 2,
}

/// Envelope returned by every fallible entry point.
///
/// `message` is set whenever `code != Ok`. `http_status` is non-zero only for
/// `Http` errors. `data` is an `FfiHttpRequest*` for `Request` and a
/// NUL-terminated UTF-8 string for `Json`.
#[repr(C)]
pub struct FfiRosterResult {
    pub code: FfiErrorCode,
    pub http_status: u16,
    pub message: *mut c_char,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiRosterResult {
    fn boxed(code: FfiErrorCode, http_status: u16, message: Option<String>, data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiRosterResult {
            code,
            http_status,
            message: message.map_or(std::ptr::null_mut(), into_c_string),
            data_tag,
            data,
        }))
    }

    pub(crate) fn ok_empty() -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, 0, None, FfiDataTag::None, std::ptr::null_mut())
    }

    pub(crate) fn ok_request(req: HttpRequest) -> *mut Self {
        let data = FfiHttpRequest::from_core(req) as *mut c_void;
        Self::boxed(FfiErrorCode::Ok, 0, None, FfiDataTag::Request, data)
    }

    pub(crate) fn ok_json<T: Serialize + ?Sized>(value: &T) -> *mut Self {
        match serde_json::to_string(value) {
            Ok(json) => {
                let data = into_c_string(json) as *mut c_void;
                Self::boxed(FfiErrorCode::Ok, 0, None, FfiDataTag::Json, data)
            }
            Err(e) => Self::from_error(RosterError::Serialization(e.to_string())),
        }
    }

    pub(crate) fn from_error(e: RosterError) -> *mut Self {
        let code = match &e {
            RosterError::Validation { .. } => FfiErrorCode::Validation,
            RosterError::Http { .. } => FfiErrorCode::Http,
            RosterError::Transport(_) => FfiErrorCode::Transport,
            RosterError::InvalidUrl(_) => FfiErrorCode::InvalidUrl,
            RosterError::Serialization(_) => FfiErrorCode::Serialization,
            RosterError::Deserialization(_) => FfiErrorCode::Deserialization,
            RosterError::Config(_) => FfiErrorCode::Config,
            RosterError::InvalidAcademicYear(_) => FfiErrorCode::InvalidInput,
        };
        let status = e.status().unwrap_or(0);
        Self::boxed(code, status, Some(e.to_string()), FfiDataTag::None, std::ptr::null_mut())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, format!("null argument: {name}"))
    }

    pub(crate) fn invalid_input(message: String) -> *mut Self {
        Self::failure(FfiErrorCode::InvalidInput, message)
    }

    pub(crate) fn not_found(kind: &str, id: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NotFoundLocal, format!("{kind} {id} is not loaded"))
    }

    pub(crate) fn panic(message: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, message.to_string())
    }

    fn failure(code: FfiErrorCode, message: String) -> *mut Self {
        Self::boxed(code, 0, Some(message), FfiDataTag::None, std::ptr::null_mut())
    }
}

/// Interior NUL bytes are dropped rather than failing the whole call.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    let c = CString::new(s).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|b| *b != 0);
        CString::new(bytes).unwrap_or_default()
    });
    c.into_raw()
}

/// # Safety
/// `ptr` must be null or come from `into_c_string` and not be freed yet.
pub(crate) unsafe fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}
