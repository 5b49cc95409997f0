// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// pipeline works with:
//
//   record.rs — one AIS position report and its columns
//   layout.rs — the P{N}/p{n} naming and directory conventions
//   traits.rs — the seams other layers implement
//
// Rules for this layer:
//   - NO CSV / Arrow types
//   - NO knowledge of the CLI
//   - Filesystem access only for creating layout directories

pub mod record;

pub mod layout;

pub mod traits;
