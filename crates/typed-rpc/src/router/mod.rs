//! Request routing
//!
//! A [`Router`] maps procedure names to procedures. Requests carry the
//! name as the path remainder below the mount prefix; queries are served on
//! GET with the input in the `input` query parameter, mutations on POST with
//! the input as the body.
//!
//! | Outcome                | Status | Code                   |
//! |------------------------|--------|------------------------|
//! | success                | 200    |                        |
//! | unknown procedure      | 404    | `NOT_FOUND`            |
//! | verb mismatch          | 405    | `METHOD_NOT_SUPPORTED` |
//! | oversized input        | 413    | `PAYLOAD_TOO_LARGE`    |
//! | input/output rejected  | 400    | `PARSE_ERROR`          |
//! | handler failure        | mapped | raised code            |

mod core;
mod request;

pub use self::core::{Router, RouterErrorTap};
