//! Common test utilities and helpers

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Password accepted by the fake vault program
pub const VAULT_PASSWORD: &str = "letmein";

/// Stand-in for `ansible-vault`: same argument shape, base64 instead of AES,
/// and a password check so wrong or missing password files fail like the real one.
const FAKE_VAULT_SCRIPT: &str = r#"#!/bin/sh
action="$1"
file="$2"
shift 2
password=""
while [ $# -gt 0 ]; do
    case "$1" in
        --vault-password-file) password="$(cat "$2")" || exit 1; shift 2 ;;
        --output) shift 2 ;;
        *) echo "ERROR! unexpected argument: $1" >&2; exit 2 ;;
    esac
done
if [ "$password" != "letmein" ]; then
    echo "ERROR! Decryption failed (no vault secrets were found that could decrypt)" >&2
    exit 1
fi
case "$action" in
    encrypt)
        printf '%s\n' '$ANSIBLE_VAULT;1.1;AES256'
        base64 < "$file"
        ;;
    decrypt)
        if [ "$(head -n 1 "$file")" != '$ANSIBLE_VAULT;1.1;AES256' ]; then
            echo "ERROR! input is not vault encrypted data" >&2
            exit 1
        fi
        tail -n +2 "$file" | base64 -d
        ;;
    *)
        echo "ERROR! unknown action: $action" >&2
        exit 2
        ;;
esac
"#;

/// Path of the fake vault program, written once per test binary.
///
/// Writing it once keeps tests from exec'ing a file another thread still has
/// open for writing.
pub fn fake_vault_program() -> &'static Path {
    static PROGRAM: OnceLock<PathBuf> = OnceLock::new();
    PROGRAM.get_or_init(|| {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!(
            "cli-transform-fake-vault-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ansible-vault");
        std::fs::write(&path, FAKE_VAULT_SCRIPT).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    })
}

/// Write a password file into `dir`
pub fn password_file(dir: &Path, password: &str) -> PathBuf {
    let path = dir.join("vault pass.txt");
    std::fs::write(&path, format!("{}\n", password)).unwrap();
    path
}

/// `vault-*` files left in `dir`
pub fn leftover_vault_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("vault-"))
        })
        .collect()
}

/// Whether `program` can be found on PATH
pub fn has_program(program: &str) -> bool {
    std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {}", program))
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
