//! # cli-transform
//!
//! Transform selected text by piping it through an external command and
//! replacing the selection with the command's output. Two built-in transforms
//! encrypt and decrypt `ansible-vault` blocks.
//!
//! ## Usage
//!
//! ```bash
//! cli-transform run --command "sort -u" notes.txt
//! cli-transform decrypt --vault-password-file ~/.vault_pass --lines 4..9 group_vars/all.yml
//! ```
//!
//! ## Modules
//!
//! - `subprocess` - Runs one shell command per invocation and captures its result
//! - `transform` - Applies transforms to the selections of an editor host
//! - `config` - Layered settings (defaults, files, environment, flags)
//! - `error` - Transform failures and process exit codes
//! - `cli` / `app` - The command-line front end
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod subprocess;
pub mod transform;
