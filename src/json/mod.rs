//! Purpose: Internal JSON/YAML parsing boundary shared by the facade and copies.
//! Exports: `parse` module with decode/encode helpers.
//! Role: Single seam for backend usage so callsites avoid ad hoc decode logic.
//! Invariants: Text decoding and encoding in the facade goes through this module.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;
