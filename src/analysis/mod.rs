//! AST-backed call-site analysis.
//!
//! Detectors consume this module rather than raw tree-sitter output:
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ ParsedFile  │────▶│ walk         │────▶│ Detector     │
//! └─────────────┘     │ (pre-order)  │     │ ::visit(node)│
//!                     └──────────────┘     └──────┬───────┘
//!                                                 │
//!                                                 ▼
//!                                          ┌──────────────┐
//!                                          │ CallSite     │
//!                                          │ (classifier) │
//!                                          └──────────────┘
//! ```

pub mod call;
pub mod walk;

pub use call::{is_http_verb, Argument, ArgumentValue, CallKind, CallSite, Receiver};
pub use walk::preorder;
