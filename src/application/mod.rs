// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One use case per script of the P1 pipeline, plus the project
// housekeeping commands:
//
//   inspect_use_case   → p1 raw / p3 cleaned summaries
//   clean_use_case     → p2 trajectory cleaning
//   grid_use_case      → p4 before/after grid density
//   run_all_use_case   → p1..p4 in order
//   batch_use_case     → parallel inspection of a directory
//   scaffold_use_case  → create a new pipeline's folders
//   lint_use_case      → check a project's naming
//
// Rules for this layer:
//   - No statistics or geometry here (Layers 4 and 5)
//   - No printing to the console (that's Layer 1)
//   - Only workflow coordination and step logs
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// The P1 pipeline's scripts and their layouts
pub mod scripts;

pub mod inspect_use_case;

pub mod clean_use_case;

pub mod grid_use_case;

pub mod run_all_use_case;

pub mod batch_use_case;

pub mod scaffold_use_case;

pub mod lint_use_case;
