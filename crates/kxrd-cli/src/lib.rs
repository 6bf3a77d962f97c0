//! # kxrd-cli: the `kcl2xrd` Command
//!
//! Thin plumbing around `kxrd-parser` and `kxrd-schema`: argument parsing,
//! config loading, file I/O and exit codes.
//!
//! ```bash
//! kcl2xrd -i schemas/bucket.k
//! kcl2xrd -i schemas/bucket.k -o xrd.yaml --group storage.example.org --with-claims
//! kcl2xrd -i schemas/bucket.k --config kcl2xrd.yaml -vv
//! ```
//!
//! The rendered document goes to stdout unless `--output` is given. Logs
//! always go to stderr.

pub mod config;
pub mod convert;
pub mod evaluator;
